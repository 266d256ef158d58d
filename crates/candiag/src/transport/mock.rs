//! Simulated ECU for tests and demos
//!
//! Answers the services this crate speaks with canned data from
//! [`MockConfig`]. Replies are queued and handed out by `receive`, so a
//! caller sees the same send/receive split it would on a real bus.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{CanTransport, IncomingFrame, TransportError};
use crate::config::MockConfig;
use crate::frame::{ArbitrationId, Frame, FRAME_LEN, POSITIVE_RESPONSE_OFFSET};
use crate::obd::{encode_rpm, encode_temperature, encode_throttle, mode, Pid};
use crate::uds::{dtc, service_id, standard_did, Dtc, NegativeResponseCode};

/// VIN bytes that fit after `[len, 0x62, 0xF1, 0x90]`
const VIN_BYTES_PER_FRAME: usize = FRAME_LEN - 4;

#[derive(Debug, Default)]
struct EcuState {
    dtcs: Vec<Dtc>,
    /// Level of the last seed handed out, awaiting sendKey
    seed_level: Option<u8>,
    unlocked_level: Option<u8>,
    /// Raw replies that take precedence over simulated ones
    scripted: VecDeque<Vec<u8>>,
}

/// Simulated ECU implementing [`CanTransport`]
pub struct MockEcu {
    config: MockConfig,
    reply_id: ArbitrationId,
    /// Encoded Mode 01 data bytes per PID
    sensors: Vec<(u8, Vec<u8>)>,
    connected: AtomicBool,
    silent: AtomicBool,
    state: Mutex<EcuState>,
    reply_tx: mpsc::UnboundedSender<IncomingFrame>,
    reply_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<IncomingFrame>>,
}

impl MockEcu {
    pub fn new(config: &MockConfig) -> Result<Self, TransportError> {
        let reply_id = ArbitrationId::standard(config.reply_id)
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;
        let dtcs = config
            .parsed_dtcs()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;
        let sensors = Self::encode_sensors(config)?;

        let (reply_tx, reply_rx) = mpsc::unbounded_channel();

        tracing::debug!(reply_id = %reply_id, dtcs = dtcs.len(), "Mock ECU created");

        Ok(Self {
            config: config.clone(),
            reply_id,
            sensors,
            connected: AtomicBool::new(true),
            silent: AtomicBool::new(false),
            state: Mutex::new(EcuState {
                dtcs,
                ..Default::default()
            }),
            reply_tx,
            reply_rx: tokio::sync::Mutex::new(reply_rx),
        })
    }

    fn encode_sensors(config: &MockConfig) -> Result<Vec<(u8, Vec<u8>)>, TransportError> {
        let sensors = &config.sensors;
        let out_of_range =
            |name: &str| TransportError::InvalidConfig(format!("sensor {} out of range", name));

        let rpm = encode_rpm(sensors.rpm).ok_or_else(|| out_of_range("rpm"))?;
        let coolant = encode_temperature(sensors.coolant_temp_c)
            .ok_or_else(|| out_of_range("coolant_temp_c"))?;
        let intake = encode_temperature(sensors.intake_air_temp_c)
            .ok_or_else(|| out_of_range("intake_air_temp_c"))?;
        let throttle = encode_throttle(sensors.throttle_percent)
            .ok_or_else(|| out_of_range("throttle_percent"))?;

        Ok(vec![
            (Pid::Rpm.as_u8(), rpm.to_vec()),
            (Pid::Speed.as_u8(), vec![sensors.speed_kmh]),
            (Pid::CoolantTemp.as_u8(), vec![coolant]),
            (Pid::IntakeAirTemp.as_u8(), vec![intake]),
            (Pid::ThrottlePosition.as_u8(), vec![throttle]),
        ])
    }

    /// Queue a raw reply returned verbatim for the next request
    pub fn push_reply(&self, raw: Vec<u8>) {
        self.state.lock().scripted.push_back(raw);
    }

    /// Stop answering requests (they are still accepted)
    pub fn set_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::SeqCst);
    }

    /// Simulate the bus going down; sends fail while disconnected
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// DTCs currently stored
    pub fn dtcs(&self) -> Vec<Dtc> {
        self.state.lock().dtcs.clone()
    }

    /// Security level unlocked by a correct key, if any
    pub fn unlocked_level(&self) -> Option<u8> {
        self.state.lock().unlocked_level
    }

    fn reply(&self, payload: Vec<u8>) {
        let frame = IncomingFrame::new(self.reply_id, pad(payload));
        // Receiver lives as long as self
        let _ = self.reply_tx.send(frame);
    }

    /// Simulated answer to one request, `None` for silence
    fn respond(&self, frame: &Frame) -> Option<Vec<u8>> {
        let service = frame.service();
        let params = frame.parameters();

        if service == mode::CURRENT_DATA {
            return self.respond_current_data(params);
        }

        let payload = match service {
            service_id::READ_DTC_INFO => self.respond_read_dtcs(params),
            service_id::CLEAR_DIAGNOSTIC_INFO => self.respond_clear_dtcs(params),
            service_id::READ_DATA_BY_ID => self.respond_read_did(params),
            service_id::SECURITY_ACCESS => self.respond_security_access(params),
            _ => negative(service, NegativeResponseCode::SERVICE_NOT_SUPPORTED),
        };
        Some(payload)
    }

    fn respond_current_data(&self, params: &[u8]) -> Option<Vec<u8>> {
        let pid = *params.first()?;
        // Unsupported PIDs are ignored, as a real ECU does for functional requests
        let (_, data) = self.sensors.iter().find(|(p, _)| *p == pid)?;

        let mut payload = vec![mode::CURRENT_DATA_RESPONSE, pid];
        payload.extend_from_slice(data);
        Some(payload)
    }

    fn respond_read_dtcs(&self, params: &[u8]) -> Vec<u8> {
        let sid = service_id::READ_DTC_INFO;
        let (sub_function, mask) = match params {
            [sub, mask] => (*sub, *mask),
            _ => return negative(sid, NegativeResponseCode::INCORRECT_MESSAGE_LENGTH_OR_FORMAT),
        };
        if sub_function != dtc::sub_function::REPORT_DTC_BY_STATUS_MASK {
            return negative(sid, NegativeResponseCode::SUB_FUNCTION_NOT_SUPPORTED);
        }

        let state = self.state.lock();
        let matching: Vec<&Dtc> = state
            .dtcs
            .iter()
            .filter(|dtc| dtc.status.0 & mask != 0)
            .collect();

        let count = u8::try_from(matching.len()).unwrap_or(u8::MAX);
        let mut payload = vec![sid + POSITIVE_RESPONSE_OFFSET, sub_function, count];
        // Only the first record fits a single frame
        if let Some(first) = matching.first() {
            payload.extend_from_slice(&first.to_bytes());
            payload.push(first.status.0);
        }
        payload
    }

    fn respond_clear_dtcs(&self, params: &[u8]) -> Vec<u8> {
        let sid = service_id::CLEAR_DIAGNOSTIC_INFO;
        if params != dtc::dtc_group::ALL {
            return negative(sid, NegativeResponseCode::REQUEST_OUT_OF_RANGE);
        }
        self.state.lock().dtcs.clear();
        tracing::debug!("Mock ECU cleared DTCs");
        vec![sid + POSITIVE_RESPONSE_OFFSET]
    }

    fn respond_read_did(&self, params: &[u8]) -> Vec<u8> {
        let sid = service_id::READ_DATA_BY_ID;
        let did = match params {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            _ => return negative(sid, NegativeResponseCode::INCORRECT_MESSAGE_LENGTH_OR_FORMAT),
        };
        if did != standard_did::VIN {
            return negative(sid, NegativeResponseCode::REQUEST_OUT_OF_RANGE);
        }

        let mut payload = vec![sid + POSITIVE_RESPONSE_OFFSET];
        payload.extend_from_slice(&did.to_be_bytes());
        payload.extend(self.config.vin.bytes().take(VIN_BYTES_PER_FRAME));
        payload
    }

    fn respond_security_access(&self, params: &[u8]) -> Vec<u8> {
        let sid = service_id::SECURITY_ACCESS;
        let Some((&sub_function, key)) = params.split_first() else {
            return negative(sid, NegativeResponseCode::INCORRECT_MESSAGE_LENGTH_OR_FORMAT);
        };
        if sub_function == 0 || sub_function > 0x7E {
            return negative(sid, NegativeResponseCode::SUB_FUNCTION_NOT_SUPPORTED);
        }

        let mut state = self.state.lock();

        if sub_function % 2 == 1 {
            // requestSeed
            let mut payload = vec![sid + POSITIVE_RESPONSE_OFFSET, sub_function];
            if state.unlocked_level == Some(sub_function) {
                payload.extend(std::iter::repeat(0).take(self.config.seed.len()));
            } else {
                payload.extend_from_slice(&self.config.seed);
                state.seed_level = Some(sub_function);
            }
            return payload;
        }

        // sendKey
        let level = sub_function - 1;
        if state.seed_level.take() != Some(level) {
            return negative(sid, NegativeResponseCode::REQUEST_SEQUENCE_ERROR);
        }
        let accepted = match &self.config.expected_key {
            Some(expected) => expected.as_slice() == key,
            None => true,
        };
        if !accepted {
            tracing::debug!(level, "Mock ECU rejected key");
            return negative(sid, NegativeResponseCode::INVALID_KEY);
        }

        state.unlocked_level = Some(level);
        vec![sid + POSITIVE_RESPONSE_OFFSET, sub_function]
    }
}

fn negative(service: u8, nrc: NegativeResponseCode) -> Vec<u8> {
    vec![service_id::NEGATIVE_RESPONSE, service, nrc.code()]
}

/// Prefix the length byte and zero-pad to a full frame
fn pad(payload: Vec<u8>) -> Vec<u8> {
    let mut data = Vec::with_capacity(FRAME_LEN);
    data.push(payload.len() as u8);
    data.extend(payload);
    data.resize(FRAME_LEN, 0);
    data
}

#[async_trait]
impl CanTransport for MockEcu {
    async fn send(&self, frame: &Frame, id: ArbitrationId) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotInitialized);
        }

        // Simulate latency
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        tracing::debug!(%id, %frame, "Mock ECU: received request");

        if self.silent.load(Ordering::SeqCst) {
            return Ok(());
        }

        let scripted = self.state.lock().scripted.pop_front();
        if let Some(raw) = scripted {
            let _ = self.reply_tx.send(IncomingFrame::new(self.reply_id, raw));
            return Ok(());
        }

        let Some(payload) = self.respond(frame) else {
            return Ok(());
        };
        for _ in 0..self.config.pending_responses {
            self.reply(negative(
                frame.service(),
                NegativeResponseCode::RESPONSE_PENDING,
            ));
        }
        self.reply(payload);
        Ok(())
    }

    async fn receive(&self, timeout: Duration) -> Result<Option<IncomingFrame>, TransportError> {
        let mut rx = self.reply_rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(frame)) => Ok(Some(frame)),
            Ok(None) => Err(TransportError::ReceiveFailed(
                "reply channel closed".to_string(),
            )),
            Err(_) => Ok(None),
        }
    }
}
