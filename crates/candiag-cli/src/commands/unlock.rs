//! Unlock command - security access

use anyhow::{Context, Result};
use candiag::{DiagError, DiagnosticSession, SecurityKeyAlgorithm, UnlockStatus};

use crate::output::{OutputContext, OutputFormat};

/// Key supplied on the command line, sent regardless of the seed
struct FixedKey(Vec<u8>);

impl SecurityKeyAlgorithm for FixedKey {
    fn compute_key(&self, _level: u8, _seed: &[u8]) -> Result<Vec<u8>, DiagError> {
        Ok(self.0.clone())
    }
}

/// Simple XOR-based key (for testing only)
struct XorKey;

impl SecurityKeyAlgorithm for XorKey {
    fn compute_key(&self, _level: u8, seed: &[u8]) -> Result<Vec<u8>, DiagError> {
        Ok(seed.iter().map(|b| b ^ 0xFF).collect())
    }
}

/// Perform security access (unlock ECU)
pub async fn unlock(
    session: &DiagnosticSession,
    level: u8,
    key: Option<&str>,
    ctx: &OutputContext,
) -> Result<()> {
    let algorithm: Box<dyn SecurityKeyAlgorithm> = match key {
        Some(key_hex) => Box::new(FixedKey(super::parse_hex_frame(key_hex)?)),
        None => {
            ctx.info("No key provided. Using simple XOR algorithm (for testing only)");
            Box::new(XorKey)
        }
    };

    ctx.info(&format!("Requesting seed for security level {}...", level));

    let status = session
        .unlock(level, algorithm.as_ref())
        .await
        .context("Security access failed")?;

    match status {
        UnlockStatus::AlreadyUnlocked => ctx.success("Security level already unlocked"),
        UnlockStatus::Unlocked => ctx.success("Security access granted"),
    }
    if ctx.format == OutputFormat::Json {
        ctx.print_kv(&[
            ("level", level.to_string()),
            ("status", format!("{:?}", status)),
        ]);
    }
    Ok(())
}
