//! Configuration management for ioshim
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (IOSHIM_* prefix, `__` between sections)
//! 2. ioshim.local.toml (gitignored, local overrides)
//! 3. ioshim.toml (project config)
//! 4. ~/.config/ioshim/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use anyhow::Result;
use ioshim::PollMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main ioshim configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShimConfig {
    pub queues: QueueConfig,
    pub poll: PollConfig,
    pub logging: LoggingConfig,
}

/// Completion queues the session creates for the read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queues in the per-thread pool; 0 disables the queue path.
    pub max_eq: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_eq: 64 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub mode: PollStrategy,
    /// Only read when `mode` is `spin`.
    pub spins_per_yield: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            mode: PollStrategy::Yield,
            spins_per_yield: 64,
        }
    }
}

impl PollConfig {
    /// The read path's poll mode for this configuration.
    pub fn poll_mode(&self) -> PollMode {
        match self.mode {
            PollStrategy::Yield => PollMode::Yield,
            PollStrategy::Spin => PollMode::Spin {
                spins_per_yield: self.spins_per_yield,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PollStrategy {
    Yield,
    Spin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl ShimConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Load exactly one TOML file, without layering
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration that never uses completion queues
    pub fn blocking() -> Self {
        Self {
            queues: QueueConfig { max_eq: 0 },
            ..Default::default()
        }
    }

    /// Reject settings the read path cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.mode == PollStrategy::Spin && self.poll.spins_per_yield == 0 {
            return Err(ConfigError::ValidationError(
                "poll.spins_per_yield must be positive when poll.mode = \"spin\"".to_string(),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether reads should go through completion queues at all
    pub fn queues_enabled(&self) -> bool {
        self.queues.max_eq > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ShimConfig::default();
        assert_eq!(config.queues.max_eq, 64);
        assert_eq!(config.poll.mode, PollStrategy::Yield);
        assert_eq!(config.logging.filter, "info");
        assert!(config.queues_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blocking_config() {
        let config = ShimConfig::blocking();
        assert!(!config.queues_enabled());
    }

    #[test]
    fn test_poll_mode_mapping() {
        let mut poll = PollConfig::default();
        assert_eq!(poll.poll_mode(), PollMode::Yield);

        poll.mode = PollStrategy::Spin;
        poll.spins_per_yield = 8;
        assert_eq!(poll.poll_mode(), PollMode::Spin { spins_per_yield: 8 });
    }

    #[test]
    fn test_poll_section_roundtrips_through_toml() {
        let mut config = ShimConfig::default();
        config.poll.mode = PollStrategy::Spin;
        config.poll.spins_per_yield = 8;

        let text = toml::to_string(&config).expect("Failed to serialize config");
        assert!(text.contains("mode = \"spin\""));

        let back: ShimConfig = toml::from_str(&text).expect("Failed to parse config");
        assert_eq!(back, config);
        assert_eq!(back.poll.poll_mode(), PollMode::Spin { spins_per_yield: 8 });
    }

    #[test]
    fn test_spin_without_budget_rejected() {
        let mut config = ShimConfig::default();
        config.poll.mode = PollStrategy::Spin;
        config.poll.spins_per_yield = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_from_toml_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("shim.toml");
        std::fs::write(&path, "[queues]\nmax_eq = 2\n\n[poll]\nmode = \"spin\"\n")
            .expect("Failed to write config");

        let config = ShimConfig::from_toml_file(&path).expect("Failed to load config");
        assert_eq!(config.queues.max_eq, 2);
        assert_eq!(config.poll.poll_mode(), PollMode::Spin { spins_per_yield: 64 });
    }

    #[test]
    fn test_from_toml_file_errors() {
        let temp_dir = tempdir().expect("Failed to create temp dir");

        let missing = ShimConfig::from_toml_file(temp_dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::ReadError { .. })));

        let bad = temp_dir.path().join("bad.toml");
        std::fs::write(&bad, "[queues\nmax_eq = ").expect("Failed to write config");
        assert!(matches!(
            ShimConfig::from_toml_file(&bad),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
