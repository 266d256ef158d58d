//! candiag - OBD-II / UDS diagnostics over CAN
//!
//! Reads live PIDs, trouble codes and the VIN, runs the security-access
//! handshake and decodes captured frames offline.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use candiag::{create_transport, DiagConfig, DiagnosticSession};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::DemoMode;
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "candiag")]
#[command(author, version, about = "OBD-II / UDS diagnostics over CAN")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CANDIAG_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read Mode 01 PIDs (hex, e.g. "0C 0D"); defaults to the configured list
    Pid {
        /// PID(s) to read
        pids: Vec<String>,
    },

    /// Read or clear trouble codes
    Dtc {
        /// Clear all DTCs instead of reading them
        #[arg(long)]
        clear: bool,
    },

    /// Read the vehicle identification number
    Vin,

    /// Security access (unlock ECU)
    Unlock {
        /// requestSeed sub-function (odd)
        #[arg(long, default_value = "1")]
        level: u8,

        /// Security key (hex string, e.g., "0102030405")
        #[arg(long)]
        key: Option<String>,
    },

    /// Classify and interpret a captured frame without touching the bus
    Decode {
        /// Mode 01 PID the frame answers (hex)
        #[arg(long, conflicts_with = "service", required_unless_present = "service")]
        pid: Option<String>,

        /// UDS service ID the frame answers (hex)
        #[arg(long)]
        service: Option<String>,

        /// Raw frame bytes (hex, e.g. "04410C1A2C000000")
        raw: String,
    },

    /// Poll PIDs in a loop, interleaving UDS services by mode
    Poll {
        /// Which services run alongside PID polling
        #[arg(long, value_enum, default_value = "basic")]
        mode: DemoMode,

        /// Delay between polling cycles in milliseconds
        #[arg(long, default_value = "2000")]
        interval_ms: u64,

        /// Stop after this many cycles (runs until Ctrl+C otherwise)
        #[arg(long)]
        cycles: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = config::load(cli.config.as_deref())?;

    // Create output context
    let ctx = OutputContext::new(cli.output, cli.no_color, cli.quiet);

    // Execute command
    match &cli.command {
        Commands::Pid { pids } => {
            let session = create_session(&config)?;
            let pids = if pids.is_empty() {
                config.pids.clone()
            } else {
                commands::parse_hex_bytes(pids)?
            };
            commands::pid(&session, &pids, &ctx).await?;
        }

        Commands::Dtc { clear } => {
            let session = create_session(&config)?;
            commands::dtc(&session, *clear, &ctx).await?;
        }

        Commands::Vin => {
            let session = create_session(&config)?;
            commands::vin(&session, &ctx).await?;
        }

        Commands::Unlock { level, key } => {
            let session = create_session(&config)?;
            commands::unlock(&session, *level, key.as_deref(), &ctx).await?;
        }

        Commands::Decode { pid, service, raw } => {
            commands::decode(pid.as_deref(), service.as_deref(), raw, &ctx)?;
        }

        Commands::Poll {
            mode,
            interval_ms,
            cycles,
        } => {
            let session = create_session(&config)?;
            commands::poll(&session, &config, *mode, *interval_ms, *cycles, &ctx).await?;
        }
    }

    Ok(())
}

/// Create a diagnostic session over the configured transport
fn create_session(config: &DiagConfig) -> Result<DiagnosticSession> {
    let transport =
        create_transport(&config.transport).context("Failed to create CAN transport")?;
    DiagnosticSession::new(transport, config.session.clone())
        .context("Failed to create diagnostic session")
}
