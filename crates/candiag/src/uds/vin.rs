//! VIN read via ReadDataByIdentifier (0x22, DID 0xF190)

use std::fmt::Write;

use super::standard_did;
use crate::error::{DiagError, MalformedReason};

/// Render a 0x62 payload `[0xF1, 0x90, vin bytes..]` as text
///
/// Zero bytes are padding and are dropped. Printable ASCII passes through;
/// any other byte becomes a `\xNN` escape.
pub fn decode_vin(data: &[u8]) -> Result<String, DiagError> {
    if data.len() < 3 {
        return Err(DiagError::InsufficientData {
            needed: 3,
            actual: data.len(),
        });
    }

    let did = u16::from_be_bytes([data[0], data[1]]);
    if did != standard_did::VIN {
        return Err(DiagError::Malformed(MalformedReason::DidMismatch {
            expected: standard_did::VIN,
            actual: did,
        }));
    }

    let mut vin = String::with_capacity(data.len() - 2);
    for &byte in data[2..].iter().filter(|&&b| b != 0) {
        if (0x20..=0x7E).contains(&byte) {
            vin.push(byte as char);
        } else {
            let _ = write!(vin, "\\x{:02x}", byte);
        }
    }

    Ok(vin)
}
