//! SecurityAccess (0x27) seed handling
//!
//! Key derivation is vendor-specific and lives outside this crate: callers
//! plug in a [`SecurityKeyAlgorithm`].

use serde::Serialize;

use super::service_id;
use crate::error::{DiagError, MalformedReason};
use crate::response::Response;

/// Seed returned by a requestSeed positive response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecuritySeed {
    /// requestSeed sub-function echoed by the ECU
    pub level: u8,
    /// Opaque seed bytes
    pub bytes: Vec<u8>,
}

impl SecuritySeed {
    /// An all-zero seed means the level is already unlocked
    pub fn is_unlocked(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Display for SecuritySeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "level 0x{:02X} seed {}", self.level, hex::encode_upper(&self.bytes))
    }
}

/// Vendor key computation for a security level
pub trait SecurityKeyAlgorithm: Send + Sync {
    /// Compute the key answering `seed` at requestSeed sub-function `level`
    fn compute_key(&self, level: u8, seed: &[u8]) -> Result<Vec<u8>, DiagError>;
}

/// Pull the seed out of a classified SecurityAccess response
pub fn extract_seed(response: &Response) -> Result<SecuritySeed, DiagError> {
    let data = response.uds_payload(service_id::SECURITY_ACCESS)?;

    let level = match response {
        Response::PositiveUds {
            sub_function: Some(level),
            ..
        } => *level,
        _ => {
            return Err(DiagError::Malformed(MalformedReason::MissingSubFunction {
                service_id: service_id::SECURITY_ACCESS,
            }))
        }
    };

    if data.is_empty() {
        return Err(DiagError::InsufficientData {
            needed: 1,
            actual: 0,
        });
    }

    Ok(SecuritySeed {
        level,
        bytes: data.to_vec(),
    })
}
