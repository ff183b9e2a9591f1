//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How to reach the IPFS daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpfsConfig {
    /// Daemon binary. Looked up on PATH unless absolute.
    /// Default: ipfs
    #[serde(default = "IpfsConfig::default_binary")]
    pub binary: String,

    /// Daemon repository, exported as IPFS_PATH.
    /// Default: ~/.ipfs
    #[serde(default = "IpfsConfig::default_repo")]
    pub repo: PathBuf,

    /// Timeout for availability probes, in the daemon's duration syntax.
    /// Default: 5s
    #[serde(default = "IpfsConfig::default_probe_timeout")]
    pub probe_timeout: String,

    /// Timeout for fetches.
    /// Default: 60s
    #[serde(default = "IpfsConfig::default_fetch_timeout")]
    pub fetch_timeout: String,
}

impl IpfsConfig {
    fn default_binary() -> String {
        "ipfs".to_string()
    }

    fn default_repo() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".ipfs"))
            .unwrap_or_else(|| PathBuf::from(".ipfs"))
    }

    fn default_probe_timeout() -> String {
        "5s".to_string()
    }

    fn default_fetch_timeout() -> String {
        "60s".to_string()
    }
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            binary: Self::default_binary(),
            repo: Self::default_repo(),
            probe_timeout: Self::default_probe_timeout(),
            fetch_timeout: Self::default_fetch_timeout(),
        }
    }
}

/// Local filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where fetched content is staged while a request is served.
    /// Default: the system temp dir
    #[serde(default = "std::env::temp_dir")]
    pub ephemeral_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            ephemeral_dir: std::env::temp_dir(),
        }
    }
}

/// HTTP listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindConfig {
    /// Default: 127.0.0.1
    #[serde(default = "BindConfig::default_host")]
    pub host: String,

    /// Default: 8090
    #[serde(default = "BindConfig::default_http_port")]
    pub http_port: u16,
}

impl BindConfig {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_http_port() -> u16 {
        8090
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            http_port: Self::default_http_port(),
        }
    }
}

/// Telemetry and observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directive (trace, debug, info, warn, error, or an EnvFilter string).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,

    /// OTLP gRPC endpoint. Empty disables export.
    /// Default: empty
    #[serde(default)]
    pub otlp_endpoint: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }

    /// The OTLP endpoint, if export is enabled.
    pub fn otlp(&self) -> Option<&str> {
        let endpoint = self.otlp_endpoint.trim();
        if endpoint.is_empty() {
            None
        } else {
            Some(endpoint)
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            otlp_endpoint: String::new(),
        }
    }
}
