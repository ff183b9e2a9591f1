//! Configuration loading for the CachIPFS node.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cachiconf::NodeConfig;
//!
//! let config = NodeConfig::load().expect("Failed to load config");
//!
//! println!("IPFS repo: {}", config.ipfs.repo.display());
//! println!("Listening on: {}", config.bind.addr());
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/cachipfs/config.toml` (system)
//! 2. `~/.config/cachipfs/config.toml` (user)
//! 3. `./cachipfs.toml` (local override), or the `--config` path
//! 4. Environment variables (`CACHIPFS_*`, `IPFS_PATH`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [ipfs]
//! binary = "ipfs"
//! repo = "~/.ipfs"
//! probe_timeout = "5s"
//! fetch_timeout = "60s"
//!
//! [paths]
//! ephemeral_dir = "/tmp"
//!
//! [bind]
//! host = "127.0.0.1"
//! http_port = 8090
//!
//! [telemetry]
//! log_level = "info"
//! otlp_endpoint = ""
//! ```

pub mod infra;
pub mod loader;

pub use infra::{BindConfig, IpfsConfig, PathsConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    #[serde(default)]
    pub ipfs: IpfsConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub bind: BindConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl NodeConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with an optional explicit file taking the place of
    /// `./cachipfs.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and variables were applied.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = NodeConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::apply_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Build TOML manually for stable section order and comments
        let mut output = String::new();

        output.push_str("# CachIPFS Configuration\n\n");

        output.push_str("[ipfs]\n");
        output.push_str(&format!("binary = {}\n", quote(&self.ipfs.binary)));
        output.push_str(&format!("repo = {}\n", quote(&self.ipfs.repo.to_string_lossy())));
        output.push_str(&format!("probe_timeout = {}\n", quote(&self.ipfs.probe_timeout)));
        output.push_str(&format!("fetch_timeout = {}\n", quote(&self.ipfs.fetch_timeout)));

        output.push_str("\n[paths]\n");
        output.push_str(&format!(
            "ephemeral_dir = {}\n",
            quote(&self.paths.ephemeral_dir.to_string_lossy())
        ));

        output.push_str("\n[bind]\n");
        output.push_str(&format!("host = {}\n", quote(&self.bind.host)));
        output.push_str(&format!("http_port = {}\n", self.bind.http_port));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = {}\n", quote(&self.telemetry.log_level)));
        output.push_str(&format!(
            "otlp_endpoint = {}\n",
            quote(&self.telemetry.otlp_endpoint)
        ));

        output
    }
}

fn quote(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}
