//! Integration tests for DiagnosticSession
//!
//! Each test drives a session against the simulated ECU, so the whole
//! build → send → receive → classify → interpret path runs as it would on a bus.

use std::sync::Arc;

use candiag::config::{MockConfig, SessionConfig};
use candiag::{
    create_transport, DiagConfig, DiagError, DiagnosticSession, MalformedReason, MockEcu,
    NegativeResponseCode, ObdValue, Request, Response, SecurityKeyAlgorithm, SessionError,
    UnlockStatus,
};
use pretty_assertions::assert_eq;

// =============================================================================
// Helpers
// =============================================================================

/// Key algorithm that ignores the seed
struct FixedKey(Vec<u8>);

impl SecurityKeyAlgorithm for FixedKey {
    fn compute_key(&self, _level: u8, _seed: &[u8]) -> Result<Vec<u8>, DiagError> {
        Ok(self.0.clone())
    }
}

/// Key algorithm that inverts every seed byte
struct InvertSeed;

impl SecurityKeyAlgorithm for InvertSeed {
    fn compute_key(&self, _level: u8, seed: &[u8]) -> Result<Vec<u8>, DiagError> {
        Ok(seed.iter().map(|b| !b).collect())
    }
}

fn setup(mock: MockConfig) -> (Arc<MockEcu>, DiagnosticSession) {
    setup_with(mock, SessionConfig::default())
}

fn setup_with(mock: MockConfig, session: SessionConfig) -> (Arc<MockEcu>, DiagnosticSession) {
    let ecu = Arc::new(MockEcu::new(&mock).unwrap());
    let session = DiagnosticSession::new(ecu.clone(), session).unwrap();
    (ecu, session)
}

// =============================================================================
// OBD-II
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_read_sensor_pids() {
    let (_ecu, session) = setup(MockConfig::default());

    assert_eq!(session.read_pid(0x0C).await.unwrap(), ObdValue::Rpm(1675));
    assert_eq!(session.read_pid(0x0D).await.unwrap(), ObdValue::Speed(85));
    assert_eq!(
        session.read_pid(0x05).await.unwrap(),
        ObdValue::CoolantTemp(75)
    );
    assert_eq!(
        session.read_pid(0x0F).await.unwrap(),
        ObdValue::IntakeAirTemp(20)
    );
    assert_eq!(
        session.read_pid(0x11).await.unwrap().to_string(),
        "Throttle: 50.2%"
    );
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_pid_times_out() {
    let (_ecu, session) = setup(MockConfig::default());

    assert_eq!(
        session.read_pid(0x42).await,
        Err(SessionError::NoResponse { service_id: 0x01 })
    );
}

#[tokio::test(start_paused = true)]
async fn test_short_pid_data_falls_back_to_raw() {
    let (ecu, session) = setup(MockConfig::default());
    ecu.push_reply(vec![0x03, 0x41, 0x0C, 0x1A]);

    assert_eq!(
        session.read_pid(0x0C).await.unwrap(),
        ObdValue::Raw(vec![0x1A])
    );
}

#[tokio::test(start_paused = true)]
async fn test_pid_echo_mismatch_is_malformed() {
    let (ecu, session) = setup(MockConfig::default());
    ecu.push_reply(vec![0x03, 0x41, 0x0D, 0x55, 0x00, 0x00, 0x00, 0x00]);

    assert_eq!(
        session.read_pid(0x0C).await,
        Err(SessionError::Protocol(DiagError::Malformed(
            MalformedReason::PidMismatch {
                expected: 0x0C,
                actual: 0x0D,
            }
        )))
    );
}

#[tokio::test(start_paused = true)]
async fn test_truncated_frame_is_malformed() {
    let (ecu, session) = setup(MockConfig::default());
    ecu.push_reply(vec![0x02, 0x41]);

    let response = session.exchange(&Request::obdii(0x0C)).await.unwrap();
    assert_eq!(response, Response::Malformed(MalformedReason::TooShort { len: 2 }));
}

// =============================================================================
// UDS
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_read_and_clear_dtcs() {
    let (ecu, session) = setup(MockConfig::default());

    let dtcs = session.read_dtcs().await.unwrap();
    assert_eq!(dtcs.len(), 1);
    assert_eq!(dtcs[0].to_string(), "P0123 (Status: 0x09)");

    session.clear_dtcs().await.unwrap();
    assert!(ecu.dtcs().is_empty());
    assert!(session.read_dtcs().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_read_vin() {
    let (_ecu, session) = setup(MockConfig::default());
    assert_eq!(session.read_vin().await.unwrap(), "1G1J");
}

#[tokio::test(start_paused = true)]
async fn test_negative_response_carries_nrc() {
    let (ecu, session) = setup(MockConfig::default());
    ecu.push_reply(vec![0x03, 0x7F, 0x22, 0x31, 0x00, 0x00, 0x00, 0x00]);

    let err = session.read_vin().await.unwrap_err();
    assert_eq!(err.nrc(), Some(NegativeResponseCode::REQUEST_OUT_OF_RANGE));
    assert_eq!(
        err.to_string(),
        "Negative response for service 0x22: requestOutOfRange"
    );
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_service_classified_negative() {
    let (_ecu, session) = setup(MockConfig::default());

    let response = session
        .exchange(&Request::uds(0x3E, &[0x00]).unwrap())
        .await
        .unwrap();
    assert_eq!(
        response,
        Response::Negative {
            rejected_service_id: 0x3E,
            nrc: NegativeResponseCode::SERVICE_NOT_SUPPORTED,
        }
    );
}

// =============================================================================
// Security access
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_unlock_then_already_unlocked() {
    let (ecu, session) = setup(MockConfig {
        expected_key: Some(vec![0xED, 0xCB, 0xA9, 0x87]),
        ..Default::default()
    });

    let seed = session.request_seed(0x01).await.unwrap();
    assert_eq!(seed.bytes, vec![0x12, 0x34, 0x56, 0x78]);

    assert_eq!(
        session.unlock(0x01, &InvertSeed).await.unwrap(),
        UnlockStatus::Unlocked
    );
    assert_eq!(ecu.unlocked_level(), Some(0x01));

    assert_eq!(
        session.unlock(0x01, &InvertSeed).await.unwrap(),
        UnlockStatus::AlreadyUnlocked
    );
}

#[tokio::test(start_paused = true)]
async fn test_unlock_with_wrong_key() {
    let (ecu, session) = setup(MockConfig {
        expected_key: Some(vec![0xAA]),
        ..Default::default()
    });

    let err = session
        .unlock(0x01, &FixedKey(vec![0xBB]))
        .await
        .unwrap_err();
    assert_eq!(err.nrc(), Some(NegativeResponseCode::INVALID_KEY));
    assert_eq!(ecu.unlocked_level(), None);
}

#[tokio::test(start_paused = true)]
async fn test_even_seed_level_rejected_before_send() {
    let (ecu, session) = setup(MockConfig::default());
    ecu.set_connected(false);

    // A send would fail with NoResponse; the level check comes first
    assert!(matches!(
        session.request_seed(0x02).await,
        Err(SessionError::Protocol(DiagError::InvalidArgument(_)))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_oversized_key_rejected() {
    let (_ecu, session) = setup(MockConfig::default());

    assert!(matches!(
        session.unlock(0x01, &FixedKey(vec![0; 6])).await,
        Err(SessionError::Protocol(DiagError::InvalidArgument(_)))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_padded_reply_without_seed() {
    let (ecu, session) = setup(MockConfig::default());
    ecu.push_reply(vec![0x02, 0x67, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);

    assert_eq!(
        session.unlock(0x01, &InvertSeed).await,
        Err(SessionError::Protocol(DiagError::InsufficientData {
            needed: 1,
            actual: 0,
        }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_send_key_echo_must_match_level() {
    let (ecu, session) = setup(MockConfig::default());
    ecu.push_reply(vec![0x06, 0x67, 0x01, 0x12, 0x34, 0x56, 0x78, 0x00]);
    // Positive sendKey answer echoing level 3's key sub-function
    ecu.push_reply(vec![0x02, 0x67, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00]);

    assert_eq!(
        session.unlock(0x01, &InvertSeed).await,
        Err(SessionError::Protocol(DiagError::Malformed(
            MalformedReason::SubFunctionMismatch {
                expected: 0x02,
                actual: 0x04,
            }
        )))
    );
}

// =============================================================================
// Transport faults and timing
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_silent_ecu_is_no_response() {
    let (ecu, session) = setup(MockConfig::default());
    ecu.set_silent(true);

    assert_eq!(
        session.read_dtcs().await,
        Err(SessionError::NoResponse { service_id: 0x19 })
    );
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_bus_is_no_response() {
    let (ecu, session) = setup(MockConfig::default());
    ecu.set_connected(false);

    let err = session.read_vin().await.unwrap_err();
    assert_eq!(err, SessionError::NoResponse { service_id: 0x22 });
    assert_eq!(err.nrc(), None);
}

#[tokio::test(start_paused = true)]
async fn test_response_pending_is_waited_out() {
    let (_ecu, session) = setup(MockConfig {
        pending_responses: 3,
        latency_ms: 20,
        ..Default::default()
    });

    assert_eq!(session.read_pid(0x0D).await.unwrap(), ObdValue::Speed(85));
    assert_eq!(session.read_vin().await.unwrap(), "1G1J");
}

#[tokio::test(start_paused = true)]
async fn test_response_pending_budget_exhausted() {
    let session_config = SessionConfig {
        response_pending_timeout_ms: 0,
        ..Default::default()
    };
    let (_ecu, session) = setup_with(
        MockConfig {
            pending_responses: 1,
            ..Default::default()
        },
        session_config,
    );

    assert_eq!(
        session.read_pid(0x0C).await,
        Err(SessionError::NoResponse { service_id: 0x01 })
    );
}

#[tokio::test(start_paused = true)]
async fn test_session_from_config() {
    let config = DiagConfig::from_toml_str(
        r#"
        [session]
        request_id = 0x18DB33F1
        extended_id = true

        [transport]
        type = "mock"
        vin = "WVWZ"
        "#,
    )
    .unwrap();

    let transport = create_transport(&config.transport).unwrap();
    let session = DiagnosticSession::new(transport, config.session.clone()).unwrap();

    assert!(session.request_id().is_extended());
    assert_eq!(session.read_vin().await.unwrap(), "WVWZ");
}
