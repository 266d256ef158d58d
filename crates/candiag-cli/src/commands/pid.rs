//! Pid command - read Mode 01 PIDs

use anyhow::Result;
use candiag::obd::Pid;
use candiag::{DiagnosticSession, SessionError};

use crate::output::{OutputContext, PidRow};

/// Read each PID once; a PID that fails does not stop the others
pub async fn pid(session: &DiagnosticSession, pids: &[u8], ctx: &OutputContext) -> Result<()> {
    let rows = read_rows(session, pids).await;
    ctx.print(&rows);
    Ok(())
}

pub(crate) async fn read_rows(session: &DiagnosticSession, pids: &[u8]) -> Vec<PidRow> {
    let mut rows = Vec::with_capacity(pids.len());
    for &pid in pids {
        let (value, status) = match session.read_pid(pid).await {
            Ok(value) => (value.to_string(), "ok".to_string()),
            Err(SessionError::NoResponse { .. }) => ("-".to_string(), "no response".to_string()),
            Err(e) => ("-".to_string(), e.to_string()),
        };
        rows.push(PidRow {
            pid: format!("0x{:02X}", pid),
            name: Pid::from_u8(pid)
                .map(|p| p.name().to_string())
                .unwrap_or_else(|| "-".to_string()),
            value,
            status,
        });
    }
    rows
}
