//! Vin command

use anyhow::{Context, Result};
use candiag::DiagnosticSession;

use crate::output::OutputContext;

pub async fn vin(session: &DiagnosticSession, ctx: &OutputContext) -> Result<()> {
    let vin = session.read_vin().await.context("Failed to read VIN")?;
    ctx.print_kv(&[("VIN", vin)]);
    Ok(())
}
