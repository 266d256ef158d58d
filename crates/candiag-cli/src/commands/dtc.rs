//! Dtc command - trouble code management

use anyhow::{Context, Result};
use candiag::{DiagnosticSession, Dtc};

use crate::output::{yes_no, DtcRow, OutputContext, OutputFormat};

/// Read or clear trouble codes
pub async fn dtc(session: &DiagnosticSession, clear: bool, ctx: &OutputContext) -> Result<()> {
    if clear {
        session.clear_dtcs().await.context("Failed to clear DTCs")?;
        ctx.success("DTCs cleared successfully");
        return Ok(());
    }

    let dtcs = session.read_dtcs().await.context("Failed to read DTCs")?;

    if dtcs.is_empty() {
        ctx.info("No DTCs stored");
        if ctx.format == OutputFormat::Table {
            return Ok(());
        }
    }

    let rows: Vec<DtcRow> = dtcs.iter().map(to_row).collect();
    ctx.print(&rows);
    Ok(())
}

fn to_row(dtc: &Dtc) -> DtcRow {
    DtcRow {
        code: dtc.code(),
        category: format!("{:?}", dtc.category),
        status: format!("0x{:02X}", dtc.status.0),
        confirmed: yes_no(dtc.status.confirmed()),
        pending: yes_no(dtc.status.pending()),
        warning_indicator: yes_no(dtc.status.warning_indicator()),
    }
}
