//! StoreClient: add, probe and fetch against the IPFS daemon.
//!
//! Each operation builds one command, runs it once, and classifies the
//! result. Failures carry no detail back to the caller; the command, exit
//! code and both output streams go to the event sink at the point of
//! failure and nowhere else.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use crate::cid::Cid;
use crate::command::{self, Command, EnvOverlay};
use crate::config::StoreConfig;
use crate::ephemeral::{EphemeralArea, EphemeralPath};
use crate::events::{EventSink, StoreEvent, TracingSink};
use crate::runner::{Execution, LaunchError, ProcessRunner, Runner};
use crate::timeout::DaemonTimeout;

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The daemon ran and reported failure.
    #[error("store operation failed")]
    OperationFailed,

    /// The daemon could not be started.
    #[error(transparent)]
    Launch(#[from] LaunchError),

    /// No ephemeral path could be allocated for a fetch.
    #[error("ephemeral area unavailable: {0}")]
    Ephemeral(#[source] io::Error),
}

impl StoreError {
    /// True for failures of the local environment rather than the store.
    pub fn is_infrastructure(&self) -> bool {
        !matches!(self, StoreError::OperationFailed)
    }
}

/// Client for the content store daemon.
#[derive(Clone)]
pub struct StoreClient {
    config: Arc<StoreConfig>,
    env: EnvOverlay,
    area: EphemeralArea,
    runner: Arc<dyn Runner>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("config", &self.config)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    pub fn new(config: StoreConfig, runner: Arc<dyn Runner>, sink: Arc<dyn EventSink>) -> Self {
        let env = EnvOverlay::for_repo(&config.repo);
        let area = EphemeralArea::new(&config.ephemeral_dir);
        Self {
            config: Arc::new(config),
            env,
            area,
            runner,
            sink,
        }
    }

    /// Client that spawns real processes and logs through `tracing`.
    pub fn spawning(config: StoreConfig) -> Self {
        Self::new(config, Arc::new(ProcessRunner), Arc::new(TracingSink))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Ingest the file at `path`, pinned, and return its CID.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn add(&self, path: &Path) -> Result<Cid, StoreError> {
        let command = command::add(&self.config.binary, path);
        let execution = self.runner.run(&command, &self.env).await?;

        if !execution.success() {
            return Err(self.fail(command, execution));
        }

        match parse_cid(&execution.stdout) {
            Some(cid) => {
                self.sink.record(StoreEvent::Added { cid: cid.clone() });
                Ok(cid)
            }
            None => Err(self.fail(command, execution)),
        }
    }

    /// Whether the first byte of `cid` can be read within `timeout`.
    ///
    /// Every non-zero exit, daemon timeouts included, is `Ok(false)`.
    #[instrument(skip_all, fields(cid = %cid, timeout = %timeout))]
    pub async fn is_available(&self, cid: &Cid, timeout: DaemonTimeout) -> Result<bool, LaunchError> {
        let command = command::probe(&self.config.binary, cid, timeout);
        let execution = self.runner.run(&command, &self.env).await?;
        Ok(execution.success())
    }

    /// [`is_available`](Self::is_available) with the configured probe timeout.
    pub async fn is_available_default(&self, cid: &Cid) -> Result<bool, LaunchError> {
        self.is_available(cid, self.config.probe_timeout).await
    }

    /// Fetch `cid` into a fresh ephemeral path.
    ///
    /// The returned guard owns the path; dropping it removes the content.
    /// On failure the path is released before this returns.
    #[instrument(skip_all, fields(cid = %cid, timeout = %timeout))]
    pub async fn get(&self, cid: &Cid, timeout: DaemonTimeout) -> Result<EphemeralPath, StoreError> {
        let output = self.area.allocate().map_err(StoreError::Ephemeral)?;
        let command = command::fetch(&self.config.binary, cid, timeout, output.path());
        let execution = self.runner.run(&command, &self.env).await?;

        if !execution.success() {
            return Err(self.fail(command, execution));
        }

        self.sink.record(StoreEvent::Fetched { cid: cid.clone() });
        Ok(output)
    }

    /// [`get`](Self::get) with the configured fetch timeout.
    pub async fn get_default(&self, cid: &Cid) -> Result<EphemeralPath, StoreError> {
        self.get(cid, self.config.fetch_timeout).await
    }

    /// Fetch `cid` and run `consumer` against its path.
    ///
    /// The path is released once the consumer's future completes, whatever
    /// it returned.
    pub async fn with_content<F, Fut, T, E>(
        &self,
        cid: &Cid,
        timeout: DaemonTimeout,
        consumer: F,
    ) -> Result<T, E>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<StoreError>,
    {
        let fetched = self.get(cid, timeout).await?;
        let result = consumer(fetched.path().to_path_buf()).await;
        drop(fetched);
        result
    }

    fn fail(&self, command: Command, execution: Execution) -> StoreError {
        self.sink.record(StoreEvent::CommandFailed {
            command,
            code: execution.code,
            stdout: String::from_utf8_lossy(&execution.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&execution.stderr).into_owned(),
        });
        StoreError::OperationFailed
    }
}

fn parse_cid(stdout: &[u8]) -> Option<Cid> {
    std::str::from_utf8(stdout).ok()?.trim().parse().ok()
}
