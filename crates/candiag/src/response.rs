//! Response classification
//!
//! Maps a received payload plus the originating [`Request`] to exactly one
//! [`Response`] variant. Classification is total: short, garbled or
//! unexpected input becomes [`Response::Malformed`], never a panic.
//!
//! Only the bytes covered by the single-frame length byte `raw[0]` are
//! classified; padding after them never reaches a payload.

use crate::error::{DiagError, MalformedReason};
use crate::frame::Request;
use crate::uds::{self, service_id, NegativeResponseCode};

/// A classified response frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Mode 01 positive response; `data` follows the PID echo
    PositiveObdii { pid: u8, data: Vec<u8> },
    /// UDS positive response; the sub-function echo is split off for
    /// services that carry one
    PositiveUds {
        service_id: u8,
        sub_function: Option<u8>,
        data: Vec<u8>,
    },
    /// 0x7F negative response
    Negative {
        rejected_service_id: u8,
        nrc: NegativeResponseCode,
    },
    Malformed(MalformedReason),
}

impl Response {
    pub fn is_positive(&self) -> bool {
        matches!(
            self,
            Response::PositiveObdii { .. } | Response::PositiveUds { .. }
        )
    }

    /// Payload of a positive response
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Response::PositiveObdii { data, .. } | Response::PositiveUds { data, .. } => {
                Some(data)
            }
            _ => None,
        }
    }

    /// Turn non-positive variants into the matching [`DiagError`]
    pub fn into_positive(self) -> Result<Self, DiagError> {
        match self {
            Response::Negative {
                rejected_service_id,
                nrc,
            } => Err(DiagError::NegativeResponse {
                service_id: rejected_service_id,
                nrc,
            }),
            Response::Malformed(reason) => Err(DiagError::Malformed(reason)),
            positive => Ok(positive),
        }
    }

    /// Payload of a positive UDS response for `expected_service`
    pub fn uds_payload(&self, expected_service: u8) -> Result<&[u8], DiagError> {
        match self {
            Response::PositiveUds {
                service_id, data, ..
            } if *service_id == expected_service => Ok(data),
            Response::PositiveUds { service_id, .. } => {
                Err(DiagError::Malformed(MalformedReason::WrongService {
                    expected: expected_service,
                    actual: *service_id,
                }))
            }
            Response::PositiveObdii { .. } => {
                Err(DiagError::Malformed(MalformedReason::WrongService {
                    expected: expected_service,
                    actual: crate::obd::mode::CURRENT_DATA,
                }))
            }
            Response::Negative {
                rejected_service_id,
                nrc,
            } => Err(DiagError::NegativeResponse {
                service_id: *rejected_service_id,
                nrc: *nrc,
            }),
            Response::Malformed(reason) => Err(DiagError::Malformed(*reason)),
        }
    }
}

/// Classify `raw` as the answer to `request`
pub fn classify(request: &Request, raw: &[u8]) -> Response {
    if raw.len() < 3 {
        return Response::Malformed(MalformedReason::TooShort { len: raw.len() });
    }

    let declared = usize::from(raw[0]) + 1;
    let raw = &raw[..declared.min(raw.len())];
    if raw.len() < 3 {
        return Response::Malformed(MalformedReason::TooShort { len: raw.len() });
    }

    let echo = raw[1];

    if echo == service_id::NEGATIVE_RESPONSE {
        return match raw.get(3) {
            Some(&nrc) => Response::Negative {
                rejected_service_id: raw[2],
                nrc: NegativeResponseCode::from(nrc),
            },
            None => Response::Malformed(MalformedReason::MissingNrc),
        };
    }

    let expected = request.expected_positive_echo();
    if echo != expected {
        return Response::Malformed(MalformedReason::UnexpectedEcho {
            expected,
            actual: echo,
        });
    }

    match request {
        Request::Obdii { pid } => {
            if raw[2] != *pid {
                return Response::Malformed(MalformedReason::PidMismatch {
                    expected: *pid,
                    actual: raw[2],
                });
            }
            Response::PositiveObdii {
                pid: *pid,
                data: raw[3..].to_vec(),
            }
        }
        Request::Uds { service_id, .. } => {
            if uds::has_sub_function(*service_id) {
                Response::PositiveUds {
                    service_id: *service_id,
                    sub_function: Some(raw[2]),
                    data: raw[3..].to_vec(),
                }
            } else {
                Response::PositiveUds {
                    service_id: *service_id,
                    sub_function: None,
                    data: raw[2..].to_vec(),
                }
            }
        }
    }
}
