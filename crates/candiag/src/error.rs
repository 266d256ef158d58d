//! Codec and session errors

use thiserror::Error;

use crate::uds::NegativeResponseCode;

/// Why a received frame could not be classified as a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Fewer bytes than the envelope needs
    TooShort { len: usize },
    /// 0x7F marker without an NRC byte
    MissingNrc,
    /// Echo byte is neither the positive echo nor 0x7F
    UnexpectedEcho { expected: u8, actual: u8 },
    /// OBD-II echo carries a different PID than requested
    PidMismatch { expected: u8, actual: u8 },
    /// Response belongs to another service than the interpreter expects
    WrongService { expected: u8, actual: u8 },
    /// ReadDataByIdentifier echoed another DID
    DidMismatch { expected: u16, actual: u16 },
    /// Positive response lacks the sub-function its service carries
    MissingSubFunction { service_id: u8 },
    /// Echoed sub-function differs from the one requested
    SubFunctionMismatch { expected: u8, actual: u8 },
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { len } => write!(f, "frame too short ({} bytes)", len),
            Self::MissingNrc => f.write_str("negative response without NRC"),
            Self::UnexpectedEcho { expected, actual } => write!(
                f,
                "unexpected echo 0x{:02X} (expected 0x{:02X})",
                actual, expected
            ),
            Self::PidMismatch { expected, actual } => write!(
                f,
                "PID echo 0x{:02X} does not match request 0x{:02X}",
                actual, expected
            ),
            Self::WrongService { expected, actual } => write!(
                f,
                "response for service 0x{:02X}, expected 0x{:02X}",
                actual, expected
            ),
            Self::DidMismatch { expected, actual } => write!(
                f,
                "DID 0x{:04X} does not match request 0x{:04X}",
                actual, expected
            ),
            Self::MissingSubFunction { service_id } => write!(
                f,
                "response for service 0x{:02X} without sub-function",
                service_id
            ),
            Self::SubFunctionMismatch { expected, actual } => write!(
                f,
                "sub-function echo 0x{:02X} does not match request 0x{:02X}",
                actual, expected
            ),
        }
    }
}

/// Local, non-fatal outcomes of building, classifying and interpreting frames
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiagError {
    /// Caller misuse, rejected before any byte is built
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Structurally invalid or unexpected frame shape
    #[error("Malformed response: {0}")]
    Malformed(MalformedReason),

    /// Valid envelope, too short for the requested formula
    #[error("Insufficient data: need {needed} bytes, got {actual}")]
    InsufficientData { needed: usize, actual: usize },

    /// Protocol-level rejection from the ECU
    #[error("Negative response for service 0x{service_id:02X}: {nrc}")]
    NegativeResponse {
        service_id: u8,
        nrc: NegativeResponseCode,
    },
}

impl From<MalformedReason> for DiagError {
    fn from(reason: MalformedReason) -> Self {
        DiagError::Malformed(reason)
    }
}

/// Errors from a full request/response exchange over a transport
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    /// Nothing usable arrived this cycle (timeout or transport fault)
    #[error("No response for service 0x{service_id:02X}")]
    NoResponse { service_id: u8 },

    #[error(transparent)]
    Protocol(#[from] DiagError),
}

impl SessionError {
    /// NRC carried by a negative response, if this is one
    pub fn nrc(&self) -> Option<NegativeResponseCode> {
        match self {
            SessionError::Protocol(DiagError::NegativeResponse { nrc, .. }) => Some(*nrc),
            _ => None,
        }
    }
}
