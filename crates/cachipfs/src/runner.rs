//! Subprocess execution.
//!
//! A non-zero exit is an ordinary outcome and comes back as an
//! [`Execution`]. Only failing to start the program at all is an error.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::command::{Command, EnvOverlay};

/// Exit code reported when the child was terminated by a signal.
pub const SIGNALED_EXIT_CODE: i32 = -1;

/// Outcome of one finished subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Execution {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// The program could not be started.
#[derive(Debug, Error)]
#[error("failed to launch {program}: {source}")]
pub struct LaunchError {
    pub program: String,
    #[source]
    pub source: io::Error,
}

/// Runs commands to completion.
///
/// Implementations must reap the child before returning, and must not leave
/// it running if the returned future is dropped.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, command: &Command, env: &EnvOverlay) -> Result<Execution, LaunchError>;
}

/// Runs commands as real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(&self, command: &Command, env: &EnvOverlay) -> Result<Execution, LaunchError> {
        let output = tokio::process::Command::new(command.program())
            .args(command.args())
            .envs(env.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| LaunchError {
                program: command.program().to_string_lossy().into_owned(),
                source,
            })?;

        let code = output.status.code().unwrap_or(SIGNALED_EXIT_CODE);
        debug!(command = %command, code, "daemon command finished");

        Ok(Execution {
            code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
