//! Bridge from the file-level config to the store client's config.

use anyhow::{Context, Result};
use cachiconf::NodeConfig;
use cachipfs::{DaemonTimeout, StoreConfig};

/// Build a [`StoreConfig`], validating the timeout strings.
pub fn store_config(config: &NodeConfig) -> Result<StoreConfig> {
    let probe_timeout: DaemonTimeout = config
        .ipfs
        .probe_timeout
        .parse()
        .with_context(|| format!("Invalid ipfs.probe_timeout {:?}", config.ipfs.probe_timeout))?;
    let fetch_timeout: DaemonTimeout = config
        .ipfs
        .fetch_timeout
        .parse()
        .with_context(|| format!("Invalid ipfs.fetch_timeout {:?}", config.ipfs.fetch_timeout))?;

    Ok(StoreConfig {
        binary: config.ipfs.binary.clone(),
        repo: config.ipfs.repo.clone(),
        ephemeral_dir: config.paths.ephemeral_dir.clone(),
        probe_timeout,
        fetch_timeout,
    })
}
