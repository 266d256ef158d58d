//! UDS (ISO 14229) single-frame services
//!
//! Covers the services a diagnostic tester drives over a functional CAN ID:
//! DTC read/clear, identifier reads and the security-access handshake.

pub mod dtc;
mod nrc;
pub mod security;
pub mod vin;

pub use dtc::{decode_dtc_list, format_dtc, Dtc, DtcCategory, DtcStatus};
pub use nrc::{lookup_nrc, NegativeResponseCode};
pub use security::{extract_seed, SecurityKeyAlgorithm, SecuritySeed};
pub use vin::decode_vin;

/// Standard UDS service ID constants
pub mod service_id {
    pub const DIAGNOSTIC_SESSION_CONTROL: u8 = 0x10;
    pub const ECU_RESET: u8 = 0x11;
    pub const CLEAR_DIAGNOSTIC_INFO: u8 = 0x14;
    pub const READ_DTC_INFO: u8 = 0x19;
    pub const READ_DATA_BY_ID: u8 = 0x22;
    pub const SECURITY_ACCESS: u8 = 0x27;
    pub const COMMUNICATION_CONTROL: u8 = 0x28;
    pub const ROUTINE_CONTROL: u8 = 0x31;
    pub const TESTER_PRESENT: u8 = 0x3E;
    pub const CONTROL_DTC_SETTING: u8 = 0x85;
    pub const RESPONSE_ON_EVENT: u8 = 0x86;
    pub const LINK_CONTROL: u8 = 0x87;
    pub const NEGATIVE_RESPONSE: u8 = 0x7F;
}

/// Standard UDS Data Identifiers (ISO 14229-1 Annex C)
pub mod standard_did {
    pub const VIN: u16 = 0xF190;
}

/// Services whose positive response echoes a sub-function byte
pub fn has_sub_function(service: u8) -> bool {
    matches!(
        service,
        service_id::DIAGNOSTIC_SESSION_CONTROL
            | service_id::ECU_RESET
            | service_id::READ_DTC_INFO
            | service_id::SECURITY_ACCESS
            | service_id::COMMUNICATION_CONTROL
            | service_id::ROUTINE_CONTROL
            | service_id::TESTER_PRESENT
            | service_id::CONTROL_DTC_SETTING
            | service_id::RESPONSE_ON_EVENT
            | service_id::LINK_CONTROL
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_function_services() {
        assert!(has_sub_function(service_id::READ_DTC_INFO));
        assert!(has_sub_function(service_id::SECURITY_ACCESS));
        assert!(!has_sub_function(service_id::READ_DATA_BY_ID));
        assert!(!has_sub_function(service_id::CLEAR_DIAGNOSTIC_INFO));
    }
}
