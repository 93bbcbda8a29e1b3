// src/pipeline/validate.rs

//! Configuration validation pipeline.

use crate::error::Result;
use crate::models::Config;

/// Validate configuration values and compile every ignore pattern.
pub fn run_validate(config: &Config) -> Result<()> {
    log::info!("Validating configuration...");

    config.validate()?;
    let ignore_sets = config.build_ignore_sets()?;

    log::info!(
        "✓ Config OK ({} levels, {} ignore sets, probe width {})",
        config.levels.len(),
        ignore_sets.len(),
        config.scanner.max_concurrent
    );
    Ok(())
}
