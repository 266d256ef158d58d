//! Mode 01 PID definitions and decoding formulas

use serde::Serialize;

use crate::error::DiagError;

/// Offset applied by J1979 to temperature PIDs
const TEMPERATURE_OFFSET: i16 = 40;

/// Mode 01 PIDs with a dedicated interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Pid {
    /// Engine coolant temperature (0x05)
    CoolantTemp = 0x05,
    /// Engine RPM (0x0C)
    Rpm = 0x0C,
    /// Vehicle speed (0x0D)
    Speed = 0x0D,
    /// Intake air temperature (0x0F)
    IntakeAirTemp = 0x0F,
    /// Throttle position (0x11)
    ThrottlePosition = 0x11,
}

impl Pid {
    pub const ALL: [Pid; 5] = [
        Pid::CoolantTemp,
        Pid::Rpm,
        Pid::Speed,
        Pid::IntakeAirTemp,
        Pid::ThrottlePosition,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|pid| pid.as_u8() == value)
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Data bytes the formula consumes
    pub fn min_data_len(&self) -> usize {
        match self {
            Pid::Rpm => 2,
            _ => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Pid::CoolantTemp => "Coolant Temp",
            Pid::Rpm => "RPM",
            Pid::Speed => "Speed",
            Pid::IntakeAirTemp => "Intake Air Temp",
            Pid::ThrottlePosition => "Throttle",
        }
    }
}

/// Decoded Mode 01 value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ObdValue {
    /// Engine speed, rounded to whole revolutions per minute
    Rpm(u16),
    /// Vehicle speed in km/h
    Speed(u8),
    /// Coolant temperature in °C
    CoolantTemp(i16),
    /// Intake air temperature in °C
    IntakeAirTemp(i16),
    /// Throttle opening in percent, one decimal
    Throttle(f64),
    /// Payload of a PID without an interpreter
    Raw(Vec<u8>),
}

impl std::fmt::Display for ObdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObdValue::Rpm(rpm) => write!(f, "RPM: {}", rpm),
            ObdValue::Speed(speed) => write!(f, "Speed: {} km/h", speed),
            ObdValue::CoolantTemp(temp) => write!(f, "Coolant Temp: {}°C", temp),
            ObdValue::IntakeAirTemp(temp) => write!(f, "Intake Air Temp: {}°C", temp),
            ObdValue::Throttle(throttle) => write!(f, "Throttle: {:.1}%", throttle),
            ObdValue::Raw(bytes) => write!(f, "Raw data: {}", hex::encode_upper(bytes)),
        }
    }
}

/// Decode the payload of a Mode 01 positive response
///
/// PIDs without an interpreter never fail; they come back as
/// [`ObdValue::Raw`]. A known PID with fewer bytes than its formula needs
/// yields [`DiagError::InsufficientData`].
pub fn interpret_pid(pid: u8, data: &[u8]) -> Result<ObdValue, DiagError> {
    let Some(known) = Pid::from_u8(pid) else {
        return Ok(ObdValue::Raw(data.to_vec()));
    };

    let needed = known.min_data_len();
    if data.len() < needed {
        return Err(DiagError::InsufficientData {
            needed,
            actual: data.len(),
        });
    }

    let value = match known {
        // RPM: ((A*256)+B)/4, halves round to even
        Pid::Rpm => {
            let quarter_rpm = u16::from_be_bytes([data[0], data[1]]);
            ObdValue::Rpm((quarter_rpm as f64 / 4.0).round_ties_even() as u16)
        }
        Pid::Speed => ObdValue::Speed(data[0]),
        // Temperatures: A - 40
        Pid::CoolantTemp => ObdValue::CoolantTemp(data[0] as i16 - TEMPERATURE_OFFSET),
        Pid::IntakeAirTemp => ObdValue::IntakeAirTemp(data[0] as i16 - TEMPERATURE_OFFSET),
        // Throttle: A*100/255
        Pid::ThrottlePosition => {
            let percent = data[0] as f64 * 100.0 / 255.0;
            ObdValue::Throttle((percent * 10.0).round() / 10.0)
        }
    };

    Ok(value)
}

/// Like [`interpret_pid`], falling back to a raw dump when the payload is short
pub fn interpret_pid_or_raw(pid: u8, data: &[u8]) -> ObdValue {
    match interpret_pid(pid, data) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(pid, %err, "Falling back to raw PID data");
            ObdValue::Raw(data.to_vec())
        }
    }
}

/// Encode whole RPM into the two PID 0x0C bytes
pub fn encode_rpm(rpm: u16) -> Option<[u8; 2]> {
    rpm.checked_mul(4).map(u16::to_be_bytes)
}

/// Encode a temperature in °C into a PID 0x05/0x0F byte
pub fn encode_temperature(celsius: i16) -> Option<u8> {
    celsius
        .checked_add(TEMPERATURE_OFFSET)
        .and_then(|raw| u8::try_from(raw).ok())
}

/// Encode a throttle percentage into a PID 0x11 byte
pub fn encode_throttle(percent: f64) -> Option<u8> {
    if !(0.0..=100.0).contains(&percent) {
        return None;
    }
    Some((percent * 255.0 / 100.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    // 1A F8 => (0x1AF8) / 4 = 6904 / 4 = 1726
    #[case(0x0C, &[0x1A, 0xF8], ObdValue::Rpm(1726))]
    // 1A 2B => 6699 / 4 = 1674.75, rounds up
    #[case(0x0C, &[0x1A, 0x2B], ObdValue::Rpm(1675))]
    // 1A 2A => 1674.5 and 1A 2E => 1675.5, both land on the even neighbour
    #[case(0x0C, &[0x1A, 0x2A], ObdValue::Rpm(1674))]
    #[case(0x0C, &[0x1A, 0x2E], ObdValue::Rpm(1676))]
    #[case(0x0C, &[0xFF, 0xFF], ObdValue::Rpm(16384))]
    #[case(0x0D, &[0x55], ObdValue::Speed(85))]
    #[case(0x05, &[0x73], ObdValue::CoolantTemp(75))]
    #[case(0x05, &[0x00], ObdValue::CoolantTemp(-40))]
    #[case(0x0F, &[0x3C], ObdValue::IntakeAirTemp(20))]
    #[case(0x11, &[0xFF], ObdValue::Throttle(100.0))]
    #[case(0x11, &[0x80], ObdValue::Throttle(50.2))]
    #[case(0x11, &[0x00], ObdValue::Throttle(0.0))]
    fn test_known_pids(#[case] pid: u8, #[case] data: &[u8], #[case] expected: ObdValue) {
        assert_eq!(interpret_pid(pid, data).unwrap(), expected);
    }

    #[test]
    fn test_unknown_pid_is_raw() {
        assert_eq!(
            interpret_pid(0x2F, &[0x7A, 0x00]).unwrap(),
            ObdValue::Raw(vec![0x7A, 0x00])
        );
        assert_eq!(interpret_pid(0x2F, &[]).unwrap(), ObdValue::Raw(vec![]));
    }

    #[test]
    fn test_short_payload() {
        assert_eq!(
            interpret_pid(0x0C, &[0x1A]),
            Err(DiagError::InsufficientData {
                needed: 2,
                actual: 1
            })
        );
        assert_eq!(
            interpret_pid(0x0D, &[]),
            Err(DiagError::InsufficientData {
                needed: 1,
                actual: 0
            })
        );
        assert_eq!(
            interpret_pid_or_raw(0x0C, &[0x1A]),
            ObdValue::Raw(vec![0x1A])
        );
    }

    #[test]
    fn test_rpm_round_trip() {
        for rpm in 0..=16383u16 {
            let bytes = encode_rpm(rpm).unwrap();
            assert_eq!(interpret_pid(0x0C, &bytes).unwrap(), ObdValue::Rpm(rpm));
        }
        assert_eq!(encode_rpm(16384), None);
    }

    #[test]
    fn test_encoders() {
        assert_eq!(encode_temperature(90), Some(130));
        assert_eq!(encode_temperature(-41), None);
        assert_eq!(encode_temperature(216), None);
        assert_eq!(encode_throttle(100.0), Some(0xFF));
        assert_eq!(encode_throttle(101.0), None);
    }

    #[rstest]
    #[case(ObdValue::Rpm(1726), "RPM: 1726")]
    #[case(ObdValue::Speed(85), "Speed: 85 km/h")]
    #[case(ObdValue::CoolantTemp(75), "Coolant Temp: 75°C")]
    #[case(ObdValue::IntakeAirTemp(-5), "Intake Air Temp: -5°C")]
    #[case(ObdValue::Throttle(50.2), "Throttle: 50.2%")]
    #[case(ObdValue::Raw(vec![0x0A, 0x1B]), "Raw data: 0A1B")]
    fn test_display(#[case] value: ObdValue, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ObdValue::Speed(42)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "speed", "value": 42 }));
    }

    #[test]
    fn test_pid_lookup() {
        assert_eq!(Pid::from_u8(0x0C), Some(Pid::Rpm));
        assert_eq!(Pid::from_u8(0x00), None);
        assert_eq!(Pid::ThrottlePosition.as_u8(), 0x11);
    }
}
