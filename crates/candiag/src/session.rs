//! Request/response exchange over a [`CanTransport`]
//!
//! One call builds a frame, puts it on the bus, waits for the reply and
//! classifies it. Requests are never re-sent: a missing reply is reported as
//! [`SessionError::NoResponse`] and the caller decides whether to try again.

use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::SessionConfig;
use crate::error::{DiagError, MalformedReason, SessionError};
use crate::frame::{ArbitrationId, Request};
use crate::obd::{interpret_pid_or_raw, ObdValue};
use crate::response::{classify, Response};
use crate::transport::CanTransport;
use crate::uds::{
    decode_dtc_list, decode_vin, dtc, extract_seed, service_id, Dtc, SecurityKeyAlgorithm,
    SecuritySeed,
};

/// Result of a security-access handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockStatus {
    /// The ECU returned a zero seed; no key was sent
    AlreadyUnlocked,
    /// The key was accepted
    Unlocked,
}

/// Diagnostic session bound to one transport
pub struct DiagnosticSession {
    transport: Arc<dyn CanTransport>,
    request_id: ArbitrationId,
    config: SessionConfig,
}

impl DiagnosticSession {
    pub fn new(transport: Arc<dyn CanTransport>, config: SessionConfig) -> Result<Self, DiagError> {
        let request_id = config.arbitration_id()?;
        tracing::info!(
            %request_id,
            timeout_ms = config.response_timeout_ms,
            "Diagnostic session created"
        );
        Ok(Self {
            transport,
            request_id,
            config,
        })
    }

    /// Arbitration ID requests are sent with
    pub fn request_id(&self) -> ArbitrationId {
        self.request_id
    }

    /// Send `request` and classify the first reply
    ///
    /// A "response pending" negative response (NRC 0x78) is not returned;
    /// the session keeps listening until the pending timeout runs out.
    pub async fn exchange(&self, request: &Request) -> Result<Response, SessionError> {
        let frame = request.to_frame()?;
        let service_id = request.mode_or_service_id();

        if let Err(e) = self.transport.send(&frame, self.request_id).await {
            tracing::warn!(service_id, error = %e, "Failed to send request");
            return Err(SessionError::NoResponse { service_id });
        }
        tracing::debug!(id = %self.request_id, %frame, "Request sent");

        let pending_deadline = Instant::now() + self.config.response_pending_timeout();
        let mut timeout = self.config.response_timeout();

        loop {
            let incoming = match self.transport.receive(timeout).await {
                Ok(Some(incoming)) => incoming,
                Ok(None) => {
                    tracing::warn!(service_id, "No response within {:?}", timeout);
                    return Err(SessionError::NoResponse { service_id });
                }
                Err(e) => {
                    tracing::warn!(service_id, error = %e, "Failed to receive response");
                    return Err(SessionError::NoResponse { service_id });
                }
            };

            tracing::debug!(
                id = %incoming.id,
                data = %hex::encode_upper(&incoming.data),
                "Response received"
            );

            let response = classify(request, &incoming.data);
            match &response {
                Response::Negative { nrc, .. } if nrc.is_response_pending() => {
                    let remaining = pending_deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        tracing::warn!(service_id, "Response pending timeout exceeded");
                        return Err(SessionError::NoResponse { service_id });
                    }
                    tracing::debug!(service_id, "ECU reported response pending");
                    timeout = remaining;
                }
                Response::Malformed(reason) => {
                    tracing::debug!(service_id, %reason, "Malformed response");
                    return Ok(response);
                }
                _ => return Ok(response),
            }
        }
    }

    /// Read one Mode 01 PID
    ///
    /// Data too short for the PID's formula is returned as [`ObdValue::Raw`].
    pub async fn read_pid(&self, pid: u8) -> Result<ObdValue, SessionError> {
        let response = self.exchange(&Request::obdii(pid)).await?.into_positive()?;
        Ok(interpret_pid_or_raw(pid, response.data().unwrap_or(&[])))
    }

    /// Read stored DTCs (ReadDTCInformation, all status bits)
    pub async fn read_dtcs(&self) -> Result<Vec<Dtc>, SessionError> {
        let request = Request::read_dtc_by_status_mask(dtc::ALL_STATUS_MASK);
        let response = self.exchange(&request).await?;
        let dtcs = decode_dtc_list(response.uds_payload(service_id::READ_DTC_INFO)?)?;
        Ok(dtcs)
    }

    /// Clear all DTC groups
    pub async fn clear_dtcs(&self) -> Result<(), SessionError> {
        let response = self.exchange(&Request::clear_all_dtcs()).await?;
        response.uds_payload(service_id::CLEAR_DIAGNOSTIC_INFO)?;
        tracing::info!("DTCs cleared");
        Ok(())
    }

    /// Read the VIN (DID 0xF190)
    pub async fn read_vin(&self) -> Result<String, SessionError> {
        let response = self.exchange(&Request::read_vin()).await?;
        let vin = decode_vin(response.uds_payload(service_id::READ_DATA_BY_ID)?)?;
        Ok(vin)
    }

    /// SecurityAccess requestSeed at an odd `level`
    pub async fn request_seed(&self, level: u8) -> Result<SecuritySeed, SessionError> {
        let response = self.exchange(&Request::security_seed(level)?).await?;
        Ok(extract_seed(&response)?)
    }

    /// Full seed/key handshake using `algorithm` for the key
    pub async fn unlock(
        &self,
        level: u8,
        algorithm: &dyn SecurityKeyAlgorithm,
    ) -> Result<UnlockStatus, SessionError> {
        let seed = self.request_seed(level).await?;
        if seed.is_unlocked() {
            tracing::info!(level, "Security level already unlocked");
            return Ok(UnlockStatus::AlreadyUnlocked);
        }

        let key = algorithm.compute_key(level, &seed.bytes)?;
        let response = self
            .exchange(&Request::security_key(level, &key)?)
            .await?;
        response.uds_payload(service_id::SECURITY_ACCESS)?;

        let send_key = level + 1;
        match response {
            Response::PositiveUds {
                sub_function: Some(echo),
                ..
            } if echo == send_key => {}
            Response::PositiveUds {
                sub_function: Some(echo),
                ..
            } => {
                return Err(DiagError::Malformed(MalformedReason::SubFunctionMismatch {
                    expected: send_key,
                    actual: echo,
                })
                .into())
            }
            _ => {
                return Err(DiagError::Malformed(MalformedReason::MissingSubFunction {
                    service_id: service_id::SECURITY_ACCESS,
                })
                .into())
            }
        }

        tracing::info!(level, "Security access granted");
        Ok(UnlockStatus::Unlocked)
    }
}
