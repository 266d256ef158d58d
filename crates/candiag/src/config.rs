//! Diagnostic session configuration
//!
//! Settings are read from TOML. Every field has a default, so an empty file
//! is a valid configuration that talks to the simulated ECU.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::DiagError;
use crate::frame::{ArbitrationId, OBD_BROADCAST_ID};
use crate::uds::Dtc;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagConfig {
    /// Request addressing and timeouts
    #[serde(default)]
    pub session: SessionConfig,
    /// Mode 01 PIDs polled when none are given explicitly
    #[serde(default = "default_pids")]
    pub pids: Vec<u8>,
    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            pids: default_pids(),
            transport: TransportConfig::default(),
        }
    }
}

fn default_pids() -> Vec<u8> {
    vec![0x0C, 0x0D]
}

impl DiagConfig {
    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session
            .arbitration_id()
            .map_err(|e| ConfigError::Invalid(format!("session.request_id: {}", e)))?;

        if self.session.response_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "session.response_timeout_ms must be greater than zero".to_string(),
            ));
        }

        match &self.transport {
            TransportConfig::Mock(mock) => mock.validate(),
        }
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

/// Request addressing and timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Arbitration ID requests are sent with (default: OBD-II broadcast 0x7DF)
    #[serde(default = "default_request_id")]
    pub request_id: u32,
    /// Send requests with a 29-bit identifier
    #[serde(default)]
    pub extended_id: bool,
    /// How long to wait for a reply
    #[serde(default = "default_response_timeout")]
    pub response_timeout_ms: u64,
    /// Upper bound on waiting while the ECU answers "response pending" (NRC 0x78)
    #[serde(default = "default_response_pending_timeout")]
    pub response_pending_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_id: default_request_id(),
            extended_id: false,
            response_timeout_ms: default_response_timeout(),
            response_pending_timeout_ms: default_response_pending_timeout(),
        }
    }
}

fn default_request_id() -> u32 {
    OBD_BROADCAST_ID.raw()
}

fn default_response_timeout() -> u64 {
    1000
}

fn default_response_pending_timeout() -> u64 {
    5000
}

impl SessionConfig {
    /// Checked request arbitration ID
    pub fn arbitration_id(&self) -> Result<ArbitrationId, DiagError> {
        if self.extended_id {
            ArbitrationId::extended(self.request_id)
        } else {
            let id = u16::try_from(self.request_id).map_err(|_| {
                DiagError::InvalidArgument(format!(
                    "standard CAN ID 0x{:X} exceeds 11 bits",
                    self.request_id
                ))
            })?;
            ArbitrationId::standard(id)
        }
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn response_pending_timeout(&self) -> Duration {
        Duration::from_millis(self.response_pending_timeout_ms)
    }
}

// =============================================================================
// Transport Configuration
// =============================================================================

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Simulated ECU
    Mock(MockConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Mock(MockConfig::default())
    }
}

/// Simulated ECU configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated latency in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
    /// Arbitration ID the ECU answers with
    #[serde(default = "default_reply_id")]
    pub reply_id: u16,
    /// Number of "response pending" (NRC 0x78) frames sent ahead of each answer
    #[serde(default)]
    pub pending_responses: u8,
    /// Mode 01 sensor readings
    #[serde(default)]
    pub sensors: MockSensors,
    /// Vehicle identification number
    #[serde(default = "default_vin")]
    pub vin: String,
    /// Stored trouble codes
    #[serde(default = "default_dtcs")]
    pub dtcs: Vec<MockDtc>,
    /// Seed returned for requestSeed (at most 5 bytes)
    #[serde(default = "default_seed")]
    pub seed: Vec<u8>,
    /// Key accepted by sendKey; any key unlocks when unset
    #[serde(default)]
    pub expected_key: Option<Vec<u8>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            reply_id: default_reply_id(),
            pending_responses: 0,
            sensors: MockSensors::default(),
            vin: default_vin(),
            dtcs: default_dtcs(),
            seed: default_seed(),
            expected_key: None,
        }
    }
}

fn default_reply_id() -> u16 {
    0x7E8
}

fn default_vin() -> String {
    "1G1JC5444R7252367".to_string()
}

fn default_dtcs() -> Vec<MockDtc> {
    vec![MockDtc {
        code: "P0123".to_string(),
        status: 0x09,
    }]
}

fn default_seed() -> Vec<u8> {
    vec![0x12, 0x34, 0x56, 0x78]
}

impl MockConfig {
    /// Parsed trouble codes
    pub fn parsed_dtcs(&self) -> Result<Vec<Dtc>, DiagError> {
        self.dtcs
            .iter()
            .map(|dtc| Dtc::from_code(&dtc.code, dtc.status))
            .collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.reply_id > ArbitrationId::MAX_STANDARD {
            return Err(ConfigError::Invalid(format!(
                "transport.reply_id 0x{:X} exceeds 11 bits",
                self.reply_id
            )));
        }
        if self.seed.is_empty() || self.seed.len() > 5 {
            return Err(ConfigError::Invalid(format!(
                "transport.seed must hold 1 to 5 bytes, got {}",
                self.seed.len()
            )));
        }
        if let Some(key) = &self.expected_key {
            if key.len() > 5 {
                return Err(ConfigError::Invalid(format!(
                    "transport.expected_key must hold at most 5 bytes, got {}",
                    key.len()
                )));
            }
        }
        self.parsed_dtcs()
            .map_err(|e| ConfigError::Invalid(format!("transport.dtcs: {}", e)))?;
        Ok(())
    }
}

/// Sensor readings served for Mode 01 PIDs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockSensors {
    #[serde(default = "default_rpm")]
    pub rpm: u16,
    #[serde(default = "default_speed")]
    pub speed_kmh: u8,
    #[serde(default = "default_coolant_temp")]
    pub coolant_temp_c: i16,
    #[serde(default = "default_intake_air_temp")]
    pub intake_air_temp_c: i16,
    #[serde(default = "default_throttle")]
    pub throttle_percent: f64,
}

impl Default for MockSensors {
    fn default() -> Self {
        Self {
            rpm: default_rpm(),
            speed_kmh: default_speed(),
            coolant_temp_c: default_coolant_temp(),
            intake_air_temp_c: default_intake_air_temp(),
            throttle_percent: default_throttle(),
        }
    }
}

fn default_rpm() -> u16 {
    1675
}

fn default_speed() -> u8 {
    85
}

fn default_coolant_temp() -> i16 {
    75
}

fn default_intake_air_temp() -> i16 {
    20
}

fn default_throttle() -> f64 {
    50.2
}

/// A stored trouble code, e.g. `{ code = "P0123", status = 0x09 }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockDtc {
    pub code: String,
    #[serde(default)]
    pub status: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DiagConfig::from_toml_str("").unwrap();
        assert_eq!(config.pids, vec![0x0C, 0x0D]);
        assert_eq!(config.session.arbitration_id().unwrap(), OBD_BROADCAST_ID);
        assert_eq!(config.session.response_timeout(), Duration::from_millis(1000));
        let TransportConfig::Mock(mock) = &config.transport;
        assert_eq!(mock.reply_id, 0x7E8);
        assert_eq!(mock.parsed_dtcs().unwrap()[0].code(), "P0123");
    }

    #[test]
    fn test_default_matches_empty_file() {
        let config = DiagConfig::default();
        assert_eq!(config.pids, vec![0x0C, 0x0D]);
        assert_eq!(config.session.response_pending_timeout_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            pids = [0x05, 0x0C, 0x11]

            [session]
            request_id = 0x18DB33F1
            extended_id = true
            response_timeout_ms = 250

            [transport]
            type = "mock"
            latency_ms = 10
            vin = "WVWZZZ1JZXW000001"
            seed = [0xAA, 0xBB]
            expected_key = [0x55, 0x44]
            dtcs = [
                { code = "U0100", status = 0x08 },
                { code = "C0420" },
            ]

            [transport.sensors]
            rpm = 3000
        "#;

        let config = DiagConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.pids, vec![0x05, 0x0C, 0x11]);
        assert_eq!(
            config.session.arbitration_id().unwrap(),
            ArbitrationId::Extended(0x18DB33F1)
        );
        assert_eq!(config.session.response_pending_timeout_ms, 5000);

        let TransportConfig::Mock(mock) = &config.transport;
        assert_eq!(mock.latency_ms, 10);
        assert_eq!(mock.sensors.rpm, 3000);
        assert_eq!(mock.sensors.speed_kmh, 85);
        assert_eq!(mock.expected_key, Some(vec![0x55, 0x44]));
        let codes: Vec<String> = mock.parsed_dtcs().unwrap().iter().map(Dtc::code).collect();
        assert_eq!(codes, vec!["U0100", "C0420"]);
    }

    #[test]
    fn test_standard_id_out_of_range() {
        let err = DiagConfig::from_toml_str("[session]\nrequest_id = 0x800\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{}", err);
    }

    #[test]
    fn test_bad_dtc_code_rejected() {
        let toml = "[transport]\ntype = \"mock\"\ndtcs = [{ code = \"X9999\" }]\n";
        assert!(matches!(
            DiagConfig::from_toml_str(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_oversized_seed_rejected() {
        let toml = "[transport]\ntype = \"mock\"\nseed = [1, 2, 3, 4, 5, 6]\n";
        assert!(matches!(
            DiagConfig::from_toml_str(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_transport_type() {
        let toml = "[transport]\ntype = \"socketcan\"\n";
        assert!(matches!(
            DiagConfig::from_toml_str(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pids = [0x0D]").unwrap();

        let config = DiagConfig::load(file.path()).unwrap();
        assert_eq!(config.pids, vec![0x0D]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DiagConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
