//! Configuration file handling for candiag

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use candiag::DiagConfig;

/// Load configuration from `path`, or from the default config file
///
/// A missing default file yields the built-in defaults; a missing explicit
/// path is an error.
pub fn load(path: Option<&Path>) -> Result<DiagConfig> {
    if let Some(path) = path {
        return DiagConfig::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()));
    }

    match config_path() {
        Some(default_path) if default_path.exists() => DiagConfig::load(&default_path)
            .with_context(|| format!("Failed to load config file: {}", default_path.display())),
        _ => {
            tracing::debug!("No config file found, using defaults");
            Ok(DiagConfig::default())
        }
    }
}

/// Get the default config file path
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("candiag").join("config.toml"))
}
