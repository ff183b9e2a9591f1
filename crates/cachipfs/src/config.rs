//! Store client configuration.
//!
//! Default repo: `~/.ipfs` (the daemon's own default).
//! Default ephemeral area: the system temp dir.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::timeout::{DaemonTimeout, DEFAULT_FETCH_TIMEOUT, DEFAULT_PROBE_TIMEOUT};

/// Configuration for talking to the IPFS daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Daemon binary, resolved through `PATH` unless absolute.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Repository directory, exported to the daemon as `IPFS_PATH`.
    #[serde(default = "default_repo")]
    pub repo: PathBuf,

    /// Where fetch output paths are allocated.
    #[serde(default = "std::env::temp_dir")]
    pub ephemeral_dir: PathBuf,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: DaemonTimeout,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: DaemonTimeout,
}

fn default_binary() -> String {
    "ipfs".to_string()
}

/// Get the default repo path (~/.ipfs).
pub fn default_repo() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".ipfs"))
        .unwrap_or_else(|| PathBuf::from(".ipfs"))
}

fn default_probe_timeout() -> DaemonTimeout {
    DEFAULT_PROBE_TIMEOUT
}

fn default_fetch_timeout() -> DaemonTimeout {
    DEFAULT_FETCH_TIMEOUT
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            repo: default_repo(),
            ephemeral_dir: std::env::temp_dir(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// Create a config for a specific repo, other fields default.
    pub fn with_repo(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            ..Self::default()
        }
    }

    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn ephemeral_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ephemeral_dir = dir.into();
        self
    }
}
