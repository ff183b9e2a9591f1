//! Store events and the sinks that receive them.
//!
//! The client reports every success and failure through an injected
//! [`EventSink`] rather than a global logger. Production wires in
//! [`TracingSink`]; tests use [`MemorySink`] to count what was emitted.

use std::sync::Mutex;

use crate::cid::Cid;
use crate::command::Command;

/// Severity of a store event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// Something worth recording that happened inside the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// `add` produced a new CID.
    Added { cid: Cid },
    /// `get` wrote a CID's content to its ephemeral path.
    Fetched { cid: Cid },
    /// A daemon command exited non-zero or produced unusable output.
    CommandFailed {
        command: Command,
        code: i32,
        stdout: String,
        stderr: String,
    },
}

impl StoreEvent {
    pub fn level(&self) -> Level {
        match self {
            StoreEvent::Added { .. } | StoreEvent::Fetched { .. } => Level::Info,
            StoreEvent::CommandFailed { .. } => Level::Error,
        }
    }
}

/// Receives store events. Write-only: nothing is read back.
pub trait EventSink: Send + Sync {
    fn record(&self, event: StoreEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: StoreEvent) {
        match event {
            StoreEvent::Added { cid } => {
                tracing::info!(cid = %cid, "IPFS added cid: {}", cid);
            }
            StoreEvent::Fetched { cid } => {
                tracing::info!(cid = %cid, "IPFS got cid: {}", cid);
            }
            StoreEvent::CommandFailed {
                command,
                code,
                stdout,
                stderr,
            } => {
                tracing::error!(
                    command = %command,
                    code,
                    stdout = %stdout,
                    stderr = %stderr,
                    "IPFS command failed"
                );
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<StoreEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, level: Level) -> usize {
        self.events().iter().filter(|e| e.level() == level).count()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: StoreEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
