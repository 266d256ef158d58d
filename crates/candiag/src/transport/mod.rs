//! Transport layer for CAN diagnostics
//!
//! The codec itself never touches the bus. This module defines the seam a
//! real transceiver plugs into, plus a simulated ECU for tests and demos.
//!
//! # Example
//!
//! ```ignore
//! use candiag::config::TransportConfig;
//! use candiag::transport::create_transport;
//!
//! let transport = create_transport(&TransportConfig::default())?;
//! transport.send(&build_obdii_request(0x0C), OBD_BROADCAST_ID).await?;
//! let reply = transport.receive(Duration::from_millis(1000)).await?;
//! ```

mod adapter;
pub mod error;
pub mod mock;

pub use adapter::{CanTransport, IncomingFrame};
pub use error::TransportError;
pub use mock::MockEcu;

use std::sync::Arc;

use crate::config::TransportConfig;

/// Create a transport based on configuration
pub fn create_transport(config: &TransportConfig) -> Result<Arc<dyn CanTransport>, TransportError> {
    match config {
        TransportConfig::Mock(cfg) => {
            let ecu = MockEcu::new(cfg)?;
            Ok(Arc::new(ecu))
        }
    }
}
