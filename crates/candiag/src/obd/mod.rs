//! OBD-II (SAE J1979) Mode 01 support

mod pid;

pub use pid::{
    encode_rpm, encode_temperature, encode_throttle, interpret_pid, interpret_pid_or_raw,
    ObdValue, Pid,
};

/// OBD-II mode constants
pub mod mode {
    /// Show current data
    pub const CURRENT_DATA: u8 = 0x01;
    /// Positive response echo for current data
    pub const CURRENT_DATA_RESPONSE: u8 = 0x41;
}
