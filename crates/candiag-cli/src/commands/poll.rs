//! Poll command - periodic PID polling with interleaved UDS services

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use candiag::{DiagConfig, DiagnosticSession};
use clap::ValueEnum;

use super::pid::read_rows;
use crate::output::OutputContext;

/// RPM, speed, coolant, intake air, throttle
const EXTENDED_PIDS: [u8; 5] = [0x0C, 0x0D, 0x05, 0x0F, 0x11];

/// UDS services run every this many cycles in full mode
const FULL_DEMO_EVERY: u32 = 10;

/// Which UDS services accompany PID polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoMode {
    /// PID polling only, configured PIDs
    Basic,
    /// PIDs plus a DTC read
    Dtc,
    /// PIDs plus a security seed request
    Security,
    /// PIDs plus DTC, VIN and seed, repeated periodically
    Full,
}

impl DemoMode {
    fn pids(self, config: &DiagConfig) -> Vec<u8> {
        match self {
            DemoMode::Basic => config.pids.clone(),
            _ => EXTENDED_PIDS.to_vec(),
        }
    }
}

/// Poll PIDs until Ctrl+C or `cycles` is reached
pub async fn poll(
    session: &DiagnosticSession,
    config: &DiagConfig,
    mode: DemoMode,
    interval_ms: u64,
    cycles: Option<u32>,
    ctx: &OutputContext,
) -> Result<()> {
    let pids = mode.pids(config);
    let pid_list: Vec<String> = pids.iter().map(|p| format!("0x{:02X}", p)).collect();
    ctx.info(&format!("Polling PIDs {} ({:?} mode)", pid_list.join(", "), mode));
    ctx.info("Press Ctrl+C to stop");

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    if mode != DemoMode::Basic {
        run_uds_services(session, mode, ctx).await;
    }

    let mut completed = 0u32;
    while running.load(Ordering::SeqCst) {
        let rows = read_rows(session, &pids).await;
        ctx.print(&rows);

        completed += 1;
        if cycles.is_some_and(|limit| completed >= limit) {
            break;
        }
        if mode == DemoMode::Full && completed % FULL_DEMO_EVERY == 0 {
            run_uds_services(session, mode, ctx).await;
        }

        // Sleep in short slices so Ctrl+C is noticed promptly
        let deadline = tokio::time::Instant::now() + Duration::from_millis(interval_ms);
        while running.load(Ordering::SeqCst) && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(100).min(
                deadline.saturating_duration_since(tokio::time::Instant::now()),
            ))
            .await;
        }
    }

    ctx.success(&format!("Polling stopped after {} cycle(s)", completed));
    Ok(())
}

/// Run the UDS services belonging to `mode`; failures are reported, not fatal
async fn run_uds_services(session: &DiagnosticSession, mode: DemoMode, ctx: &OutputContext) {
    if matches!(mode, DemoMode::Dtc | DemoMode::Full) {
        match session.read_dtcs().await {
            Ok(dtcs) if dtcs.is_empty() => ctx.info("No DTCs stored"),
            Ok(dtcs) => {
                let codes: Vec<String> = dtcs.iter().map(ToString::to_string).collect();
                ctx.info(&format!("DTCs found: {}", codes.join(", ")));
            }
            Err(e) => ctx.warn(&format!("DTC read failed: {}", e)),
        }
    }

    if mode == DemoMode::Full {
        match session.read_vin().await {
            Ok(vin) => ctx.info(&format!("VIN: {}", vin)),
            Err(e) => ctx.warn(&format!("VIN read failed: {}", e)),
        }
    }

    if matches!(mode, DemoMode::Security | DemoMode::Full) {
        match session.request_seed(0x01).await {
            Ok(seed) => ctx.info(&format!("Received seed: {}", seed)),
            Err(e) => ctx.warn(&format!("Security access failed: {}", e)),
        }
    }
}
