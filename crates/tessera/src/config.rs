//! TOML configuration for the `tessera` CLI.
//!
//! Every section is optional; command-line flags override file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tessera_types::{
    DEFAULT_CHUNK_SIZE_MB, DEFAULT_COPIES, DEFAULT_PARTITIONS, LayoutConfig,
};

/// Config file name looked up in the user config directory.
const CONFIG_FILE_NAME: &str = "tessera.toml";

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Layout generation parameters.
    pub layout: LayoutSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[layout]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LayoutSection {
    /// Number of partition directories.
    pub partitions: u32,
    /// Number of partitions holding each chunk.
    pub copies: u32,
    /// Target chunk size in MiB.
    pub chunk_size_mb: u64,
    /// Files chunked and placed at once.
    pub concurrency: usize,
    /// Placement RNG seed. Random placement when unset.
    pub seed: Option<u64>,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            partitions: DEFAULT_PARTITIONS,
            copies: DEFAULT_COPIES,
            chunk_size_mb: DEFAULT_CHUNK_SIZE_MB,
            concurrency: 1,
            seed: None,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file.
    ///
    /// Without an explicit path, reads `tessera/tessera.toml` from the user
    /// config directory if it exists, and uses defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_path().filter(|p| p.is_file()) {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// The layout parameters described by this config.
    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            partitions: self.layout.partitions,
            copies: self.layout.copies,
            chunk_size: LayoutConfig::chunk_size_from_mb(self.layout.chunk_size_mb),
            concurrency: self.layout.concurrency,
            seed: self.layout.seed,
        }
    }
}

/// `<config dir>/tessera/tessera.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tessera").join(CONFIG_FILE_NAME))
}
