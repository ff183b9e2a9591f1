//! One-shot CLI commands against the local daemon.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cachiconf::{ConfigSources, NodeConfig};
use cachipfs::{Cid, DaemonTimeout, StoreClient};

/// Add a file and print its CID.
pub async fn add(store: &StoreClient, file: &Path) -> Result<Cid> {
    let cid = store
        .add(file)
        .await
        .with_context(|| format!("Failed to add {}", file.display()))?;
    println!("{}", cid);
    Ok(cid)
}

/// Probe a CID and print the verdict. Returns whether it is available.
pub async fn probe(store: &StoreClient, cid: &str, timeout: Option<&str>) -> Result<bool> {
    let cid = parse_cid(cid)?;
    let timeout = parse_timeout(timeout, store.config().probe_timeout)?;

    let available = store
        .is_available(&cid, timeout)
        .await
        .context("Failed to probe")?;
    println!("{}", if available { "available" } else { "unavailable" });
    Ok(available)
}

/// Fetch a CID into `output`, or to stdout when no output is given.
pub async fn get(
    store: &StoreClient,
    cid: &str,
    timeout: Option<&str>,
    output: Option<PathBuf>,
) -> Result<u64> {
    let cid = parse_cid(cid)?;
    let timeout = parse_timeout(timeout, store.config().fetch_timeout)?;

    store
        .with_content(&cid, timeout, |path| async move {
            match output {
                Some(dest) => tokio::fs::copy(&path, &dest)
                    .await
                    .with_context(|| format!("Failed to write {}", dest.display())),
                None => {
                    let data = tokio::fs::read(&path)
                        .await
                        .context("Fetched content is not a single file")?;
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&data).context("Failed to write stdout")?;
                    stdout.flush().context("Failed to write stdout")?;
                    Ok(data.len() as u64)
                }
            }
        })
        .await
        .with_context(|| format!("Failed to get {}", cid))
}

/// Render the effective config and where it came from.
pub fn show_config(config: &NodeConfig, sources: &ConfigSources) -> String {
    let mut out = config.to_toml();
    out.push('\n');
    if sources.files.is_empty() {
        out.push_str("# Loaded from: defaults only\n");
    } else {
        for file in &sources.files {
            out.push_str(&format!("# Loaded from: {}\n", file.display()));
        }
    }
    for var in &sources.env_overrides {
        out.push_str(&format!("# Env override: {}\n", var));
    }
    out
}

fn parse_cid(raw: &str) -> Result<Cid> {
    Cid::from_str_checked(raw).with_context(|| format!("Invalid CID {:?}", raw))
}

fn parse_timeout(raw: Option<&str>, default: DaemonTimeout) -> Result<DaemonTimeout> {
    match raw {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid timeout {:?}", raw)),
        None => Ok(default),
    }
}
