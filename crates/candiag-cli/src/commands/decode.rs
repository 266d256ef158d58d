//! Decode command - offline frame interpretation

use anyhow::{bail, Result};
use candiag::uds::service_id;
use candiag::{
    classify, decode_dtc_list, decode_vin, extract_seed, interpret_pid, Request, Response,
};

use super::{parse_hex_byte, parse_hex_frame};
use crate::output::OutputContext;

/// Classify `raw` as the answer to a PID or service request and interpret it
pub fn decode(
    pid: Option<&str>,
    service: Option<&str>,
    raw: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let request = match (pid, service) {
        (Some(pid), _) => Request::obdii(parse_hex_byte(pid)?),
        (None, Some(service)) => Request::uds(parse_hex_byte(service)?, &[])?,
        (None, None) => bail!("Either --pid or --service is required"),
    };
    let raw = parse_hex_frame(raw)?;

    ctx.print_kv(&describe(&request, &raw));
    Ok(())
}

/// Key/value description of a classified frame
fn describe(request: &Request, raw: &[u8]) -> Vec<(&'static str, String)> {
    let response = classify(request, raw);
    let mut pairs = vec![("Frame", hex::encode_upper(raw))];

    match &response {
        Response::PositiveObdii { pid, data } => {
            pairs.push(("Kind", "positive (OBD-II)".to_string()));
            pairs.push(("PID", format!("0x{:02X}", pid)));
            pairs.push(("Data", hex::encode_upper(data)));
            let decoded = match interpret_pid(*pid, data) {
                Ok(value) => value.to_string(),
                Err(e) => e.to_string(),
            };
            pairs.push(("Decoded", decoded));
        }
        Response::PositiveUds {
            service_id,
            sub_function,
            data,
        } => {
            pairs.push(("Kind", "positive (UDS)".to_string()));
            pairs.push(("Service", format!("0x{:02X}", service_id)));
            if let Some(sub_function) = sub_function {
                pairs.push(("Sub-function", format!("0x{:02X}", sub_function)));
            }
            pairs.push(("Data", hex::encode_upper(data)));
            if let Some(decoded) = interpret_uds(*service_id, &response, data) {
                pairs.push(("Decoded", decoded));
            }
        }
        Response::Negative {
            rejected_service_id,
            nrc,
        } => {
            pairs.push(("Kind", "negative".to_string()));
            pairs.push(("Service", format!("0x{:02X}", rejected_service_id)));
            pairs.push(("NRC", format!("0x{:02X} {}", nrc.code(), nrc)));
        }
        Response::Malformed(reason) => {
            pairs.push(("Kind", "malformed".to_string()));
            pairs.push(("Reason", reason.to_string()));
        }
    }

    pairs
}

fn interpret_uds(service: u8, response: &Response, data: &[u8]) -> Option<String> {
    let decoded = match service {
        service_id::READ_DTC_INFO => decode_dtc_list(data).map(|dtcs| {
            if dtcs.is_empty() {
                "No DTCs stored".to_string()
            } else {
                dtcs.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }),
        service_id::READ_DATA_BY_ID => decode_vin(data).map(|vin| format!("VIN: {}", vin)),
        service_id::SECURITY_ACCESS => extract_seed(response).map(|seed| seed.to_string()),
        _ => return None,
    };
    Some(decoded.unwrap_or_else(|e| e.to_string()))
}
