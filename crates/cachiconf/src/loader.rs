//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, NodeConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local override and is returned
/// whether or not it exists, so loading a missing one fails.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/cachipfs/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("cachipfs/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("cachipfs.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Apply a TOML file on top of `config`.
pub fn apply_file(config: &mut NodeConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Apply TOML text on top of `config`. Only keys present in the text change.
pub(crate) fn apply_toml(config: &mut NodeConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_err(e.to_string()))?;

    if let Some(ipfs) = table.get("ipfs").and_then(|v| v.as_table()) {
        if let Some(v) = ipfs.get("binary").and_then(|v| v.as_str()) {
            config.ipfs.binary = v.to_string();
        }
        if let Some(v) = ipfs.get("repo").and_then(|v| v.as_str()) {
            config.ipfs.repo = expand_path(v);
        }
        if let Some(v) = ipfs.get("probe_timeout").and_then(|v| v.as_str()) {
            config.ipfs.probe_timeout = v.to_string();
        }
        if let Some(v) = ipfs.get("fetch_timeout").and_then(|v| v.as_str()) {
            config.ipfs.fetch_timeout = v.to_string();
        }
    }

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        if let Some(v) = paths.get("ephemeral_dir").and_then(|v| v.as_str()) {
            config.paths.ephemeral_dir = expand_path(v);
        }
    }

    if let Some(bind) = table.get("bind").and_then(|v| v.as_table()) {
        if let Some(v) = bind.get("host").and_then(|v| v.as_str()) {
            config.bind.host = v.to_string();
        }
        if let Some(v) = bind.get("http_port").and_then(|v| v.as_integer()) {
            config.bind.http_port = u16::try_from(v)
                .map_err(|_| parse_err(format!("bind.http_port out of range: {}", v)))?;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
        if let Some(v) = telemetry.get("otlp_endpoint").and_then(|v| v.as_str()) {
            config.telemetry.otlp_endpoint = v.to_string();
        }
    }

    Ok(())
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut NodeConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from any variable lookup. Later keys win over earlier ones.
pub(crate) fn apply_overrides_from(
    config: &mut NodeConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let take = |sources: &mut ConfigSources, key: &str| {
        let value = lookup(key)?;
        sources.env_overrides.push(key.to_string());
        Some(value)
    };

    if let Some(v) = take(&mut *sources, "CACHIPFS_IPFS_BINARY") {
        config.ipfs.binary = v;
    }
    // The daemon's own variable, then ours
    if let Some(v) = take(&mut *sources, "IPFS_PATH") {
        config.ipfs.repo = expand_path(&v);
    }
    if let Some(v) = take(&mut *sources, "CACHIPFS_IPFS_REPO") {
        config.ipfs.repo = expand_path(&v);
    }
    if let Some(v) = take(&mut *sources, "CACHIPFS_PROBE_TIMEOUT") {
        config.ipfs.probe_timeout = v;
    }
    if let Some(v) = take(&mut *sources, "CACHIPFS_FETCH_TIMEOUT") {
        config.ipfs.fetch_timeout = v;
    }
    if let Some(v) = take(&mut *sources, "CACHIPFS_EPHEMERAL_DIR") {
        config.paths.ephemeral_dir = expand_path(&v);
    }
    if let Some(v) = take(&mut *sources, "CACHIPFS_HOST") {
        config.bind.host = v;
    }
    if let Some(port) = lookup("CACHIPFS_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.bind.http_port = port;
        sources.env_overrides.push("CACHIPFS_HTTP_PORT".to_string());
    }
    if let Some(v) = take(&mut *sources, "CACHIPFS_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = v;
    }
    if let Some(v) = take(&mut *sources, "CACHIPFS_LOG_LEVEL") {
        config.telemetry.log_level = v;
    }
    // Also support RUST_LOG
    if let Some(v) = take(&mut *sources, "RUST_LOG") {
        config.telemetry.log_level = v;
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
        return PathBuf::from(path);
    }

    if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        let (var_name, rest) = match stripped.find('/') {
            Some(slash_pos) => (&stripped[..slash_pos], Some(&stripped[slash_pos + 1..])),
            None => (stripped, None),
        };
        return match (env::var(var_name), rest) {
            (Ok(value), Some(rest)) => PathBuf::from(value).join(rest),
            (Ok(value), None) => PathBuf::from(value),
            (Err(_), _) => PathBuf::from(path),
        };
    }

    PathBuf::from(path)
}
