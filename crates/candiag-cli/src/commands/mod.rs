//! Command implementations for candiag

pub mod decode;
pub mod dtc;
pub mod pid;
pub mod poll;
pub mod unlock;
pub mod vin;

pub use decode::decode;
pub use dtc::dtc;
pub use pid::pid;
pub use poll::{poll, DemoMode};
pub use unlock::unlock;
pub use vin::vin;

use anyhow::{Context, Result};

/// Parse one hex byte, with or without a `0x` prefix
pub fn parse_hex_byte(value: &str) -> Result<u8> {
    let digits = value
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u8::from_str_radix(digits, 16).with_context(|| format!("Invalid hex byte: {}", value))
}

pub fn parse_hex_bytes(values: &[String]) -> Result<Vec<u8>> {
    values.iter().map(|v| parse_hex_byte(v)).collect()
}

/// Parse a hex string such as "04410C1A2C" or "04 41 0C 1A 2C"
pub fn parse_hex_frame(value: &str) -> Result<Vec<u8>> {
    let compact: String = value
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&compact).with_context(|| format!("Invalid hex data: {}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("0C", 0x0C)]
    #[case("0x0d", 0x0D)]
    #[case(" 11 ", 0x11)]
    #[case("0XFF", 0xFF)]
    fn test_parse_hex_byte(#[case] input: &str, #[case] expected: u8) {
        assert_eq!(parse_hex_byte(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("100")]
    #[case("zz")]
    fn test_parse_hex_byte_invalid(#[case] input: &str) {
        assert!(parse_hex_byte(input).is_err());
    }

    #[test]
    fn test_parse_hex_frame() {
        assert_eq!(
            parse_hex_frame("04 41 0C 1A:2C").unwrap(),
            vec![0x04, 0x41, 0x0C, 0x1A, 0x2C]
        );
        assert_eq!(parse_hex_frame("0x0262").unwrap(), vec![0x02, 0x62]);
        assert!(parse_hex_frame("0").is_err());
    }
}
