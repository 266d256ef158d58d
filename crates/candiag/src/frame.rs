//! Single-frame request encoding
//!
//! Every request fits one classic CAN frame: `[length, mode/service, payload..]`
//! zero-padded to 8 bytes. No ISO-TP segmentation is performed.

use serde::{Deserialize, Serialize};

use crate::error::DiagError;
use crate::obd::mode;
use crate::uds::{dtc, service_id, standard_did};

/// Classic CAN payload size
pub const FRAME_LEN: usize = 8;

/// Largest UDS parameter list that still fits after the length and service bytes
pub const MAX_UDS_PARAMETERS: usize = FRAME_LEN - 2;

/// Functional (broadcast) request ID for OBD-II over 11-bit CAN
pub const OBD_BROADCAST_ID: ArbitrationId = ArbitrationId::Standard(0x7DF);

/// Offset added to a request mode/service ID in its positive response
pub const POSITIVE_RESPONSE_OFFSET: u8 = 0x40;

/// CAN arbitration ID, 11-bit standard or 29-bit extended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArbitrationId {
    Standard(u16),
    Extended(u32),
}

impl ArbitrationId {
    pub const MAX_STANDARD: u16 = 0x7FF;
    pub const MAX_EXTENDED: u32 = 0x1FFF_FFFF;

    /// 11-bit identifier
    pub fn standard(id: u16) -> Result<Self, DiagError> {
        if id > Self::MAX_STANDARD {
            return Err(DiagError::InvalidArgument(format!(
                "standard CAN ID 0x{:X} exceeds 11 bits",
                id
            )));
        }
        Ok(Self::Standard(id))
    }

    /// 29-bit identifier
    pub fn extended(id: u32) -> Result<Self, DiagError> {
        if id > Self::MAX_EXTENDED {
            return Err(DiagError::InvalidArgument(format!(
                "extended CAN ID 0x{:X} exceeds 29 bits",
                id
            )));
        }
        Ok(Self::Extended(id))
    }

    /// Raw numeric identifier
    pub fn raw(&self) -> u32 {
        match self {
            ArbitrationId::Standard(id) => *id as u32,
            ArbitrationId::Extended(id) => *id,
        }
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, ArbitrationId::Extended(_))
    }
}

impl std::fmt::Display for ArbitrationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArbitrationId::Standard(id) => write!(f, "0x{:03X}", id),
            ArbitrationId::Extended(id) => write!(f, "0x{:08X}", id),
        }
    }
}

/// An immutable 8-byte request payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Length byte: number of meaningful bytes after it
    pub fn length(&self) -> u8 {
        self.0[0]
    }

    /// Mode (OBD-II) or service ID (UDS)
    pub fn service(&self) -> u8 {
        self.0[1]
    }

    /// Bytes after the mode/service byte, without padding
    pub fn parameters(&self) -> &[u8] {
        let end = (self.length() as usize + 1).clamp(2, FRAME_LEN);
        &self.0[2..end]
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

/// Build an OBD-II Mode 01 request for `pid`
pub fn build_obdii_request(pid: u8) -> Frame {
    Frame([0x02, mode::CURRENT_DATA, pid, 0x00, 0x00, 0x00, 0x00, 0x00])
}

/// Build a UDS request; at most six parameter bytes fit a single frame
pub fn build_uds_request(service_id: u8, parameters: &[u8]) -> Result<Frame, DiagError> {
    if parameters.len() > MAX_UDS_PARAMETERS {
        return Err(DiagError::InvalidArgument(format!(
            "service 0x{:02X}: {} parameter bytes exceed the single-frame limit of {}",
            service_id,
            parameters.len(),
            MAX_UDS_PARAMETERS
        )));
    }

    let mut bytes = [0u8; FRAME_LEN];
    bytes[0] = parameters.len() as u8 + 1;
    bytes[1] = service_id;
    bytes[2..2 + parameters.len()].copy_from_slice(parameters);
    Ok(Frame(bytes))
}

/// requestSeed sub-functions are odd and below the suppress-response bit
fn check_seed_level(level: u8) -> Result<(), DiagError> {
    if level % 2 == 0 || level > 0x7D {
        return Err(DiagError::InvalidArgument(format!(
            "security level 0x{:02X} is not a requestSeed sub-function",
            level
        )));
    }
    Ok(())
}

/// A diagnostic request, before encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Mode 01 "show current data"
    Obdii { pid: u8 },
    /// UDS service with up to six parameter bytes
    Uds { service_id: u8, parameters: Vec<u8> },
}

impl Request {
    pub fn obdii(pid: u8) -> Self {
        Request::Obdii { pid }
    }

    /// UDS request, checked against the single-frame limit
    pub fn uds(service_id: u8, parameters: &[u8]) -> Result<Self, DiagError> {
        build_uds_request(service_id, parameters)?;
        Ok(Request::Uds {
            service_id,
            parameters: parameters.to_vec(),
        })
    }

    /// ReadDTCInformation / reportDTCByStatusMask
    pub fn read_dtc_by_status_mask(status_mask: u8) -> Self {
        Request::Uds {
            service_id: service_id::READ_DTC_INFO,
            parameters: vec![dtc::sub_function::REPORT_DTC_BY_STATUS_MASK, status_mask],
        }
    }

    /// ClearDiagnosticInformation for all DTC groups
    pub fn clear_all_dtcs() -> Self {
        Request::Uds {
            service_id: service_id::CLEAR_DIAGNOSTIC_INFO,
            parameters: dtc::dtc_group::ALL.to_vec(),
        }
    }

    /// ReadDataByIdentifier for a single DID
    pub fn read_data_by_identifier(did: u16) -> Self {
        Request::Uds {
            service_id: service_id::READ_DATA_BY_ID,
            parameters: did.to_be_bytes().to_vec(),
        }
    }

    pub fn read_vin() -> Self {
        Self::read_data_by_identifier(standard_did::VIN)
    }

    /// SecurityAccess requestSeed; `level` is the odd sub-function
    pub fn security_seed(level: u8) -> Result<Self, DiagError> {
        check_seed_level(level)?;
        Ok(Request::Uds {
            service_id: service_id::SECURITY_ACCESS,
            parameters: vec![level],
        })
    }

    /// SecurityAccess sendKey answering the seed requested at `level`
    pub fn security_key(level: u8, key: &[u8]) -> Result<Self, DiagError> {
        check_seed_level(level)?;
        let mut parameters = Vec::with_capacity(key.len() + 1);
        parameters.push(level + 1);
        parameters.extend_from_slice(key);
        Self::uds(service_id::SECURITY_ACCESS, &parameters)
    }

    /// Mode (0x01) for OBD-II, service ID for UDS
    pub fn mode_or_service_id(&self) -> u8 {
        match self {
            Request::Obdii { .. } => mode::CURRENT_DATA,
            Request::Uds { service_id, .. } => *service_id,
        }
    }

    /// Echo byte a positive response to this request carries
    pub fn expected_positive_echo(&self) -> u8 {
        POSITIVE_RESPONSE_OFFSET | self.mode_or_service_id()
    }

    pub fn to_frame(&self) -> Result<Frame, DiagError> {
        match self {
            Request::Obdii { pid } => Ok(build_obdii_request(*pid)),
            Request::Uds {
                service_id,
                parameters,
            } => build_uds_request(*service_id, parameters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_obdii_request_layout() {
        let frame = build_obdii_request(0x0C);
        assert_eq!(
            frame.as_bytes(),
            &[0x02, 0x01, 0x0C, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(frame.length(), 2);
        assert_eq!(frame.parameters(), &[0x0C]);
    }

    #[test]
    fn test_clear_all_request_layout() {
        let frame = build_uds_request(0x14, &[0xFF, 0xFF, 0xFF]).unwrap();
        assert_eq!(
            frame.as_bytes(),
            &[0x04, 0x14, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00]
        );
        assert_eq!(Request::clear_all_dtcs().to_frame().unwrap(), frame);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(2, 3)]
    #[case(6, 7)]
    fn test_uds_length_byte(#[case] params: usize, #[case] length: u8) {
        let frame = build_uds_request(0x22, &vec![0xAA; params]).unwrap();
        assert_eq!(frame.length(), length);
        assert_eq!(frame.parameters().len(), params);
    }

    #[test]
    fn test_uds_request_rejects_seven_parameters() {
        let err = build_uds_request(0x2E, &[0; 7]).unwrap_err();
        assert!(matches!(err, DiagError::InvalidArgument(_)));
        assert!(Request::uds(0x2E, &[0; 7]).is_err());
    }

    #[test]
    fn test_named_requests() {
        assert_eq!(
            Request::read_dtc_by_status_mask(0xFF)
                .to_frame()
                .unwrap()
                .as_bytes(),
            &[0x03, 0x19, 0x02, 0xFF, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            Request::read_vin().to_frame().unwrap().as_bytes(),
            &[0x03, 0x22, 0xF1, 0x90, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            Request::security_seed(0x01)
                .unwrap()
                .to_frame()
                .unwrap()
                .as_bytes(),
            &[0x02, 0x27, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_security_key_request() {
        let frame = Request::security_key(0x01, &[0xDE, 0xAD])
            .unwrap()
            .to_frame()
            .unwrap();
        assert_eq!(
            frame.as_bytes(),
            &[0x04, 0x27, 0x02, 0xDE, 0xAD, 0x00, 0x00, 0x00]
        );

        assert!(Request::security_seed(0x02).is_err());
        assert!(Request::security_seed(0x81).is_err());
        assert!(Request::security_key(0x01, &[0; 6]).is_err());
    }

    #[test]
    fn test_expected_echo() {
        assert_eq!(Request::obdii(0x0D).expected_positive_echo(), 0x41);
        assert_eq!(Request::clear_all_dtcs().expected_positive_echo(), 0x54);
        assert_eq!(Request::read_vin().expected_positive_echo(), 0x62);
    }

    #[test]
    fn test_arbitration_id_ranges() {
        assert_eq!(ArbitrationId::standard(0x7DF).unwrap(), OBD_BROADCAST_ID);
        assert!(ArbitrationId::standard(0x800).is_err());
        assert!(ArbitrationId::extended(0x18DB_33F1).unwrap().is_extended());
        assert!(ArbitrationId::extended(0x2000_0000).is_err());
        assert_eq!(OBD_BROADCAST_ID.to_string(), "0x7DF");
    }
}
