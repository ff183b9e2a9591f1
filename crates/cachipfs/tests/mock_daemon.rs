//! End-to-end tests against a scripted stand-in for the `ipfs` binary.
//!
//! The mock keeps blocks as plain files under `$IPFS_PATH/blocks`, so a
//! CID returned by `add` can be probed and fetched by later commands.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use cachipfs::{
    Cid, Level, MemorySink, ProcessRunner, StoreClient, StoreConfig, StoreError, StoreEvent,
    DEFAULT_FETCH_TIMEOUT, DEFAULT_PROBE_TIMEOUT,
};
use tempfile::TempDir;

const MOCK_IPFS: &str = r#"#!/bin/sh
blocks="$IPFS_PATH/blocks"
mkdir -p "$blocks"

if [ "$1" = "--timeout" ]; then
    shift 2
fi

cmd="$1"
shift

case "$cmd" in
    add)
        if [ "$1 $2 $3 $4 $5 $6" != "--chunker size-1024 --hash sha2-256 --quieter --pin" ]; then
            echo "Error: unexpected flags: $*" >&2
            exit 2
        fi
        if [ ! -f "$7" ]; then
            echo "Error: no such file: $7" >&2
            exit 1
        fi
        cid="bafy$(cksum < "$7" | cut -d' ' -f1)"
        cp "$7" "$blocks/$cid"
        echo "$cid"
        ;;
    cat)
        if [ ! -f "$blocks/$3" ]; then
            echo "Error: block was not found locally" >&2
            exit 1
        fi
        head -c "$2" "$blocks/$3"
        ;;
    get)
        if [ "$3" = "bafyslow" ]; then
            echo $$ > "$IPFS_PATH/slow.pid"
            exec sleep 30
        fi
        if [ ! -f "$blocks/$3" ]; then
            echo "Error: block was not found locally" >&2
            exit 1
        fi
        cp "$blocks/$3" "$2"
        ;;
    *)
        echo "Error: unknown command $cmd" >&2
        exit 1
        ;;
esac
"#;

/// Write the mock once per test binary, so no test execs a file another
/// thread still has open for writing.
fn mock_binary() -> &'static Path {
    static MOCK: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_dir, path) = MOCK.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ipfs");
        fs::write(&path, MOCK_IPFS).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        (dir, path)
    });
    path
}

struct Fixture {
    client: StoreClient,
    sink: Arc<MemorySink>,
    temp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self::with_binary(mock_binary().to_string_lossy().into_owned())
    }

    fn with_binary(binary: String) -> Self {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::with_repo(temp.path().join("repo"))
            .binary(binary)
            .ephemeral_dir(temp.path().join("ephemeral"));
        let sink = Arc::new(MemorySink::new());
        let client = StoreClient::new(config, Arc::new(ProcessRunner), sink.clone());
        Self { client, sink, temp }
    }

    fn write_input(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.temp.path().join(name);
        fs::write(&path, data).unwrap();
        path
    }

    fn ephemeral_entries(&self) -> usize {
        fs::read_dir(self.temp.path().join("ephemeral"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

#[tokio::test]
async fn test_round_trip_add_probe_get() {
    let fx = Fixture::new();
    let content = b"The quick brown fox jumps over the lazy dog\n".repeat(64);
    let input = fx.write_input("input.txt", &content);

    let cid = fx.client.add(&input).await.unwrap();
    assert!(cid.as_str().starts_with("bafy"));

    assert!(fx.client.is_available(&cid, DEFAULT_PROBE_TIMEOUT).await.unwrap());

    let fetched = fx.client.get(&cid, DEFAULT_FETCH_TIMEOUT).await.unwrap();
    assert_eq!(fs::read(fetched.path()).unwrap(), content);
    drop(fetched);
    assert_eq!(fx.ephemeral_entries(), 0);

    assert_eq!(
        fx.sink.events(),
        vec![
            StoreEvent::Added { cid: cid.clone() },
            StoreEvent::Fetched { cid },
        ]
    );
}

#[tokio::test]
async fn test_add_non_utf8_file_name() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fx = Fixture::new();
    let input = fx.temp.path().join(OsStr::from_bytes(b"caf\xe9.bin"));
    fs::write(&input, b"latin-1 name").unwrap();

    let cid = fx.client.add(&input).await.unwrap();
    assert_eq!(fx.sink.count(Level::Error), 0);

    let fetched = fx.client.get(&cid, DEFAULT_FETCH_TIMEOUT).await.unwrap();
    assert_eq!(fs::read(fetched.path()).unwrap(), b"latin-1 name");
}

#[tokio::test]
async fn test_add_relative_path_with_leading_dash_is_an_operand() {
    let fx = Fixture::new();

    // No such file in the working directory, so the daemon reports the path
    // it was given rather than an unknown flag.
    let err = fx.client.add(Path::new("-x")).await.unwrap_err();
    assert!(matches!(err, StoreError::OperationFailed));
    match &fx.sink.events()[0] {
        StoreEvent::CommandFailed { stderr, .. } => {
            assert!(stderr.contains("no such file: ./-x"), "stderr: {}", stderr);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_cid_is_unavailable_and_get_fails() {
    let fx = Fixture::new();
    let cid: Cid = "bafy404".parse().unwrap();

    assert!(!fx.client.is_available(&cid, DEFAULT_PROBE_TIMEOUT).await.unwrap());

    let err = fx.client.get(&cid, DEFAULT_FETCH_TIMEOUT).await.unwrap_err();
    assert!(matches!(err, StoreError::OperationFailed));
    assert_eq!(fx.ephemeral_entries(), 0);

    assert_eq!(fx.sink.count(Level::Error), 1);
    match &fx.sink.events()[0] {
        StoreEvent::CommandFailed { code, stderr, .. } => {
            assert_eq!(*code, 1);
            assert!(stderr.contains("not found"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_add_missing_file_fails_with_one_error_event() {
    let fx = Fixture::new();
    let missing = fx.temp.path().join("missing.bin");

    let err = fx.client.add(&missing).await.unwrap_err();
    assert!(matches!(err, StoreError::OperationFailed));
    assert_eq!(fx.sink.count(Level::Error), 1);
    assert_eq!(fx.sink.count(Level::Info), 0);
}

#[tokio::test]
async fn test_missing_daemon_is_launch_error() {
    let fx = Fixture::with_binary("/nonexistent/bin/ipfs".to_string());
    let input = fx.write_input("input.txt", b"data");

    let err = fx.client.add(&input).await.unwrap_err();
    assert!(matches!(err, StoreError::Launch(_)));

    let cid: Cid = "bafy123".parse().unwrap();
    assert!(fx.client.is_available(&cid, DEFAULT_PROBE_TIMEOUT).await.is_err());

    let err = fx.client.get(&cid, DEFAULT_FETCH_TIMEOUT).await.unwrap_err();
    assert!(matches!(err, StoreError::Launch(_)));
    assert_eq!(fx.ephemeral_entries(), 0);
    assert!(fx.sink.events().is_empty());
}

#[cfg(target_os = "linux")]
fn is_gone_or_zombie(pid: &str) -> bool {
    match fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Err(_) => true,
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .map(|rest| rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_cancelled_get_kills_daemon_and_releases_path() {
    let fx = Fixture::new();
    let cid: Cid = "bafyslow".parse().unwrap();
    let pid_file = fx.temp.path().join("repo/slow.pid");

    let outcome = tokio::time::timeout(
        Duration::from_millis(500),
        fx.client.get(&cid, DEFAULT_FETCH_TIMEOUT),
    )
    .await;
    assert!(outcome.is_err(), "slow fetch should still be running");

    assert_eq!(fx.ephemeral_entries(), 0);

    let pid = fs::read_to_string(&pid_file).unwrap();
    let pid = pid.trim();
    let mut gone = false;
    for _ in 0..50 {
        if is_gone_or_zombie(pid) {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(gone, "daemon process {} survived cancellation", pid);
}
