//! Configuration Module - Settings from ~/.cfbf-sniff/config.toml
//!
//! Supports:
//! - Log level
//! - Detector lookahead limit
//! - Directory scan behavior for the CLI

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::detect::DetectOptions;

/// cfbf-sniff configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Detector settings
    pub detector: DetectorConfig,
    /// Scan settings
    pub scan: ScanConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Detector settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Skip files whose root CLSID lies further than this many bytes in
    pub max_lookahead: Option<u64>,
}

impl DetectorConfig {
    pub fn options(&self) -> DetectOptions {
        DetectOptions {
            max_lookahead: self.max_lookahead,
        }
    }
}

/// Scan settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Descend into directories
    pub recursive: bool,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Skip hidden files and directories
    pub skip_hidden: bool,
    /// Files sniffed at once (0 = auto)
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            follow_symlinks: false,
            skip_hidden: true,
            concurrency: 0, // auto-detect
        }
    }
}

impl ScanConfig {
    /// Effective concurrency, resolving 0 to the CPU count
    pub fn concurrency(&self) -> usize {
        if self.concurrency == 0 {
            num_cpus::get()
        } else {
            self.concurrency
        }
    }
}

impl Config {
    /// Load config from default path or return defaults
    pub fn load() -> Self {
        Self::load_from(&Self::default_path()).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Ok(config)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tunclon", "cfbf-sniff")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".cfbf-sniff")
                    .join("config.toml")
            })
    }
}

/// Generate a sample config file with comments
pub fn generate_sample_config() -> String {
    r#"# cfbf-sniff Configuration
# Location: ~/.config/cfbf-sniff/config.toml (or %APPDATA%\cfbf-sniff\config.toml on Windows)

[general]
# Log level: trace, debug, info, warn, error
log_level = "info"

[detector]
# Give up on files whose root CLSID lies past this many bytes (optional)
# max_lookahead = 1073741824

[scan]
# Descend into directories given on the command line
recursive = false

# Follow symbolic links while walking directories
follow_symlinks = false

# Skip hidden files and directories
skip_hidden = true

# Files sniffed concurrently (0 = auto-detect CPU count)
concurrency = 0
"#
    .to_string()
}
