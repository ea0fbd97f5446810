//! Command implementations for the stylebridge CLI
//!
//! Each command module handles the CLI interface and delegates to
//! stylebridge-core for actual implementation.

pub mod build;
pub mod compile;

use std::path::Path;

use anyhow::{Context, Result};
use stylebridge_core::BridgeConfig;
use stylebridge_runtime::MountedStore;

/// Load the configuration file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(BridgeConfig::default()),
    }
}

/// Mount the source and target directories at the configured roots.
pub fn mount(config: &BridgeConfig, source_dir: &Path, target_dir: &Path) -> Result<MountedStore> {
    if !source_dir.is_dir() {
        anyhow::bail!("Source directory does not exist: {}", source_dir.display());
    }
    Ok(MountedStore::new()
        .mount(&config.source_root, source_dir)
        .mount(&config.target_root, target_dir))
}
