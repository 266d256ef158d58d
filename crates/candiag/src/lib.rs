//! candiag - OBD-II / UDS single-frame diagnostics over CAN
//!
//! This crate encodes diagnostic requests into 8-byte CAN frames, classifies
//! the replies and interprets positive payloads into vehicle values.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DiagnosticSession                         │
//! │   build → send → receive (timeout) → classify → interpret   │
//! │                                                             │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐ │
//! │  │ frame       │  │ response    │  │ obd / uds           │ │
//! │  │ (builder)   │  │ (classify)  │  │ (interpreters)      │ │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘ │
//! │                          │                                  │
//! │                 ┌────────┴────────┐                         │
//! │                 │  CanTransport   │                         │
//! │                 │  (MockEcu/...)  │                         │
//! │                 └─────────────────┘                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything below the session is synchronous and free of I/O.

pub mod config;
pub mod error;
pub mod frame;
pub mod obd;
pub mod response;
pub mod session;
pub mod transport;
pub mod uds;

pub use config::{ConfigError, DiagConfig};
pub use error::{DiagError, MalformedReason, SessionError};
pub use frame::{build_obdii_request, build_uds_request, ArbitrationId, Frame, Request};
pub use obd::{interpret_pid, ObdValue};
pub use response::{classify, Response};
pub use session::{DiagnosticSession, UnlockStatus};
pub use transport::{create_transport, CanTransport, MockEcu, TransportError};
pub use uds::{
    decode_dtc_list, decode_vin, extract_seed, format_dtc, lookup_nrc, Dtc,
    NegativeResponseCode, SecurityKeyAlgorithm, SecuritySeed,
};
