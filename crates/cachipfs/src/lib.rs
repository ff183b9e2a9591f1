//! IPFS daemon orchestration for the CachIPFS node.
//!
//! The node does not implement content addressing itself. It drives the
//! `ipfs` binary as a subprocess and turns exit codes and output into typed
//! results:
//! - **add**: ingest a file (1024-byte chunks, sha2-256, pinned) and return its CID
//! - **is_available**: probe whether the first byte of a CID can be read
//! - **get**: fetch a CID into an ephemeral path that is removed on drop
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cachipfs::{StoreClient, StoreConfig, DEFAULT_FETCH_TIMEOUT};
//! use std::path::Path;
//!
//! # async fn demo() -> Result<(), cachipfs::StoreError> {
//! let client = StoreClient::spawning(StoreConfig::with_repo("/srv/ipfs"));
//!
//! let cid = client.add(Path::new("/tmp/hello.txt")).await?;
//!
//! if client.is_available_default(&cid).await? {
//!     let fetched = client.get(&cid, DEFAULT_FETCH_TIMEOUT).await?;
//!     println!("content at {}", fetched.path().display());
//! } // fetched dropped here, path removed
//! # Ok(())
//! # }
//! ```
//!
//! # Failures
//!
//! A daemon that runs and exits non-zero yields
//! [`StoreError::OperationFailed`] with no further detail; the command,
//! exit code and output go to the [`EventSink`] instead. A daemon that
//! cannot be started yields [`StoreError::Launch`].

pub mod cid;
pub mod client;
pub mod command;
pub mod config;
pub mod ephemeral;
pub mod events;
pub mod runner;
pub mod timeout;

// Re-exports for convenience
pub use cid::{Cid, CidError};
pub use client::{StoreClient, StoreError};
pub use command::{Command, EnvOverlay};
pub use config::StoreConfig;
pub use ephemeral::{EphemeralArea, EphemeralPath};
pub use events::{EventSink, Level, MemorySink, StoreEvent, TracingSink};
pub use runner::{Execution, LaunchError, ProcessRunner, Runner};
pub use timeout::{DaemonTimeout, TimeoutError, DEFAULT_FETCH_TIMEOUT, DEFAULT_PROBE_TIMEOUT};
