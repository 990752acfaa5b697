//! Configuration commands.

use anyhow::{Context, Result};
use ioshim_config::ShimConfig;

/// Print the effective configuration.
pub fn show(config: &ShimConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    print!("{toml_str}");
    Ok(())
}
