//! DTC (Diagnostic Trouble Code) handling for UDS service 0x19 (ReadDTCInformation)
//!
//! A single CAN frame carries two-byte DTCs: the top two bits of the high
//! byte select the category, the remaining fourteen bits are the number.

use serde::Serialize;

use crate::error::DiagError;

/// Sub-function codes for ReadDTCInformation (0x19)
pub mod sub_function {
    /// Report DTCs matching a status mask
    pub const REPORT_DTC_BY_STATUS_MASK: u8 = 0x02;
}

/// Status mask selecting every DTC
pub const ALL_STATUS_MASK: u8 = 0xFF;

/// DTC group addresses for ClearDiagnosticInformation (0x14)
pub mod dtc_group {
    /// All DTC groups (clear all)
    pub const ALL: [u8; 3] = [0xFF, 0xFF, 0xFF];
}

/// DTC status byte bit definitions per ISO 14229-1
pub mod status_bit {
    /// Bit 0: Test Failed - DTC test failed this operation cycle
    pub const TEST_FAILED: u8 = 0x01;
    /// Bit 2: Pending DTC - Test failed but not yet confirmed
    pub const PENDING_DTC: u8 = 0x04;
    /// Bit 3: Confirmed DTC - Malfunction confirmed and stored
    pub const CONFIRMED_DTC: u8 = 0x08;
    /// Bit 7: Warning Indicator Requested
    pub const WARNING_INDICATOR_REQUESTED: u8 = 0x80;
}

/// DTC category based on the first character of the DTC code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DtcCategory {
    /// P codes - Powertrain (engine, transmission)
    Powertrain,
    /// C codes - Chassis (ABS, suspension)
    Chassis,
    /// B codes - Body (airbags, climate control)
    Body,
    /// U codes - Network (communication)
    Network,
}

impl DtcCategory {
    /// Get category from DTC high byte
    pub fn from_high_byte(high_byte: u8) -> Self {
        match (high_byte >> 6) & 0x03 {
            0 => DtcCategory::Powertrain,
            1 => DtcCategory::Chassis,
            2 => DtcCategory::Body,
            _ => DtcCategory::Network,
        }
    }

    /// Get category prefix character
    pub fn prefix(&self) -> char {
        match self {
            DtcCategory::Powertrain => 'P',
            DtcCategory::Chassis => 'C',
            DtcCategory::Body => 'B',
            DtcCategory::Network => 'U',
        }
    }
}

/// Raw DTC status byte with ISO 14229 bit accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DtcStatus(pub u8);

impl DtcStatus {
    pub fn test_failed(&self) -> bool {
        self.0 & status_bit::TEST_FAILED != 0
    }

    pub fn pending(&self) -> bool {
        self.0 & status_bit::PENDING_DTC != 0
    }

    pub fn confirmed(&self) -> bool {
        self.0 & status_bit::CONFIRMED_DTC != 0
    }

    /// MIL requested
    pub fn warning_indicator(&self) -> bool {
        self.0 & status_bit::WARNING_INDICATOR_REQUESTED != 0
    }

    /// Test failed and confirmed
    pub fn is_active(&self) -> bool {
        self.test_failed() && self.confirmed()
    }
}

/// A decoded DTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dtc {
    pub category: DtcCategory,
    /// 14-bit number following the category
    pub number: u16,
    pub status: DtcStatus,
}

impl Dtc {
    /// Bytes making up one DTC record in a 0x59 response
    pub const RECORD_LEN: usize = 3;

    pub fn from_bytes(high: u8, low: u8, status: u8) -> Self {
        Self {
            category: DtcCategory::from_high_byte(high),
            number: (((high & 0x3F) as u16) << 8) | low as u16,
            status: DtcStatus(status),
        }
    }

    /// Standard code string, e.g. P0123 or U0310
    pub fn code(&self) -> String {
        format!("{}{:04X}", self.category.prefix(), self.number)
    }

    /// Parse a code string such as `P0123` back into a DTC
    pub fn from_code(code: &str, status: u8) -> Result<Self, DiagError> {
        let invalid = || DiagError::InvalidArgument(format!("invalid DTC code: {:?}", code));

        let mut chars = code.chars();
        let category = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('P') => DtcCategory::Powertrain,
            Some('C') => DtcCategory::Chassis,
            Some('B') => DtcCategory::Body,
            Some('U') => DtcCategory::Network,
            _ => return Err(invalid()),
        };

        let digits = chars.as_str();
        if digits.len() != 4 {
            return Err(invalid());
        }
        let number = u16::from_str_radix(digits, 16).map_err(|_| invalid())?;
        if number > 0x3FFF {
            return Err(invalid());
        }

        Ok(Self {
            category,
            number,
            status: DtcStatus(status),
        })
    }

    /// High and low bytes as sent on the wire
    pub fn to_bytes(&self) -> [u8; 2] {
        let category_bits: u8 = match self.category {
            DtcCategory::Powertrain => 0,
            DtcCategory::Chassis => 1,
            DtcCategory::Body => 2,
            DtcCategory::Network => 3,
        };
        let [high, low] = self.number.to_be_bytes();
        [(category_bits << 6) | (high & 0x3F), low]
    }
}

impl std::fmt::Display for Dtc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (Status: 0x{:02X})", self.code(), self.status.0)
    }
}

/// Format a DTC from its two wire bytes
pub fn format_dtc(high: u8, low: u8) -> String {
    Dtc::from_bytes(high, low, 0).code()
}

/// Decode `[count, (high, low, status) × count, ...]`
///
/// A zero count yields an empty list. When the buffer holds fewer records
/// than `count` announces, decoding stops at the last complete record.
pub fn decode_dtc_list(data: &[u8]) -> Result<Vec<Dtc>, DiagError> {
    let Some((&count, records)) = data.split_first() else {
        return Err(DiagError::InsufficientData {
            needed: 1,
            actual: 0,
        });
    };

    let dtcs: Vec<Dtc> = records
        .chunks_exact(Dtc::RECORD_LEN)
        .take(count as usize)
        .map(|record| Dtc::from_bytes(record[0], record[1], record[2]))
        .collect();

    if dtcs.len() < count as usize {
        tracing::debug!(
            announced = count,
            decoded = dtcs.len(),
            "DTC list truncated by frame length"
        );
    }

    Ok(dtcs)
}
