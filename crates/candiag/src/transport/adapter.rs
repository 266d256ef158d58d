//! Transport trait and types

use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::TransportError;
use crate::frame::{ArbitrationId, Frame};

/// A frame received from the bus
#[derive(Debug, Clone)]
pub struct IncomingFrame {
    /// Timestamp when the frame was received
    pub timestamp: Instant,
    /// Arbitration ID the frame was sent with
    pub id: ArbitrationId,
    /// Payload, at most 8 bytes
    pub data: Vec<u8>,
}

impl IncomingFrame {
    pub fn new(id: ArbitrationId, data: Vec<u8>) -> Self {
        Self {
            timestamp: Instant::now(),
            id,
            data,
        }
    }
}

/// CAN transceiver seen by the session driver
///
/// Implementations own bus setup, timing and any hardware fault handling.
/// The codec never calls them directly.
#[async_trait]
pub trait CanTransport: Send + Sync {
    /// Put one 8-byte frame on the bus under `id`
    async fn send(&self, frame: &Frame, id: ArbitrationId) -> Result<(), TransportError>;

    /// Wait up to `timeout` for the next frame
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    async fn receive(&self, timeout: Duration) -> Result<Option<IncomingFrame>, TransportError>;
}
