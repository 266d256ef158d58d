//! UDS Negative Response Codes (NRC)

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

/// Cause strings keyed by NRC byte, sorted for binary search
static NRC_TABLE: &[(u8, &str)] = &[
    (0x10, "generalReject"),
    (0x11, "serviceNotSupported"),
    (0x12, "subFunctionNotSupported"),
    (0x13, "incorrectMessageLengthOrInvalidFormat"),
    (0x14, "responseTooLong"),
    (0x21, "busyRepeatRequest"),
    (0x22, "conditionsNotCorrect"),
    (0x24, "requestSequenceError"),
    (0x25, "noResponseFromSubnetComponent"),
    (0x26, "failurePreventsExecutionOfRequestedAction"),
    (0x31, "requestOutOfRange"),
    (0x33, "securityAccessDenied"),
    (0x35, "invalidKey"),
    (0x36, "exceedNumberOfAttempts"),
    (0x37, "requiredTimeDelayNotExpired"),
    (0x70, "uploadDownloadNotAccepted"),
    (0x71, "transferDataSuspended"),
    (0x72, "generalProgrammingFailure"),
    (0x73, "wrongBlockSequenceCounter"),
    (0x78, "requestCorrectlyReceived-ResponsePending"),
    (0x7E, "subFunctionNotSupportedInActiveSession"),
    (0x7F, "serviceNotSupportedInActiveSession"),
    (0x81, "rpmTooHigh"),
    (0x82, "rpmTooLow"),
    (0x83, "engineIsRunning"),
    (0x84, "engineIsNotRunning"),
    (0x85, "engineRunTimeTooLow"),
    (0x86, "temperatureTooHigh"),
    (0x87, "temperatureTooLow"),
    (0x88, "vehicleSpeedTooHigh"),
    (0x89, "vehicleSpeedTooLow"),
    (0x8A, "throttlePedalTooHigh"),
    (0x8B, "throttlePedalTooLow"),
    (0x8C, "transmissionRangeNotInNeutral"),
    (0x8D, "transmissionRangeNotInGear"),
    (0x8F, "brakeSwitchNotClosed"),
    (0x90, "shifterLeverNotInPark"),
    (0x91, "torqueConverterClutchLocked"),
    (0x92, "voltageTooHigh"),
    (0x93, "voltageTooLow"),
];

/// A UDS Negative Response Code
///
/// Any byte is representable; codes outside the ISO table render as
/// `Unknown NRC: 0xNN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NegativeResponseCode(u8);

impl NegativeResponseCode {
    pub const GENERAL_REJECT: Self = Self(0x10);
    pub const SERVICE_NOT_SUPPORTED: Self = Self(0x11);
    pub const SUB_FUNCTION_NOT_SUPPORTED: Self = Self(0x12);
    pub const INCORRECT_MESSAGE_LENGTH_OR_FORMAT: Self = Self(0x13);
    pub const BUSY_REPEAT_REQUEST: Self = Self(0x21);
    pub const CONDITIONS_NOT_CORRECT: Self = Self(0x22);
    pub const REQUEST_SEQUENCE_ERROR: Self = Self(0x24);
    pub const REQUEST_OUT_OF_RANGE: Self = Self(0x31);
    pub const SECURITY_ACCESS_DENIED: Self = Self(0x33);
    pub const INVALID_KEY: Self = Self(0x35);
    pub const EXCEEDED_NUMBER_OF_ATTEMPTS: Self = Self(0x36);
    pub const REQUIRED_TIME_DELAY_NOT_EXPIRED: Self = Self(0x37);
    pub const RESPONSE_PENDING: Self = Self(0x78);
    pub const SERVICE_NOT_SUPPORTED_IN_ACTIVE_SESSION: Self = Self(0x7F);

    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> u8 {
        self.0
    }

    /// ISO 14229 cause name, if the code is in the table
    pub fn description(&self) -> Option<&'static str> {
        NRC_TABLE
            .binary_search_by_key(&self.0, |(code, _)| *code)
            .ok()
            .map(|idx| NRC_TABLE[idx].1)
    }

    /// ECU accepted the request but needs more time
    pub fn is_response_pending(&self) -> bool {
        *self == Self::RESPONSE_PENDING
    }
}

impl From<u8> for NegativeResponseCode {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<NegativeResponseCode> for u8 {
    fn from(nrc: NegativeResponseCode) -> Self {
        nrc.0
    }
}

impl fmt::UpperHex for NegativeResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl fmt::Display for NegativeResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(text) => f.write_str(text),
            None => write!(f, "Unknown NRC: 0x{:02X}", self.0),
        }
    }
}

/// Resolve an NRC byte to its cause text
pub fn lookup_nrc(code: u8) -> Cow<'static, str> {
    match NegativeResponseCode(code).description() {
        Some(text) => Cow::Borrowed(text),
        None => Cow::Owned(format!("Unknown NRC: 0x{:02X}", code)),
    }
}
