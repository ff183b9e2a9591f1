//! Daemon command construction.
//!
//! Every store operation maps to exactly one argv. The builders here are pure
//! functions of their inputs, so the same arguments always produce the same
//! vector in the same order.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cid::Cid;
use crate::timeout::DaemonTimeout;

/// Environment variable that points the daemon at its repository.
pub const REPO_ENV: &str = "IPFS_PATH";

/// Chunking policy used on ingest.
pub const CHUNKER: &str = "size-1024";

/// Hash function used on ingest.
pub const HASH: &str = "sha2-256";

/// A program and its arguments. Immutable once built.
///
/// Arguments are kept as OS strings so paths reach the child byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Vec<OsString>,
}

impl Command {
    pub fn new<I, S>(program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut argv = vec![program.into()];
        argv.extend(args.into_iter().map(Into::into));
        Self { argv }
    }

    /// The program to execute.
    pub fn program(&self) -> &OsStr {
        &self.argv[0]
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[OsString] {
        &self.argv[1..]
    }

    /// The full vector, program first.
    pub fn argv(&self) -> &[OsString] {
        &self.argv
    }
}

/// Lossy, for logs only.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let argv: Vec<_> = self.argv.iter().map(|a| a.to_string_lossy()).collect();
        write!(f, "{:?}", argv)
    }
}

/// Variables merged into the child environment on top of the inherited one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: BTreeMap<String, OsString>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay pointing the daemon at `repo`.
    pub fn for_repo(repo: &Path) -> Self {
        Self::new().with(REPO_ENV, repo.as_os_str())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(key).map(OsString::as_os_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars
            .iter()
            .map(|(k, v)| (OsStr::new(k.as_str()), v.as_os_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// A relative path starting with `-` would be parsed as a flag.
fn operand(path: &Path) -> PathBuf {
    if path.is_relative() && path.to_string_lossy().starts_with('-') {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

/// `<bin> add --chunker size-1024 --hash sha2-256 --quieter --pin <path>`
pub fn add(program: &str, path: &Path) -> Command {
    let mut args: Vec<OsString> = [
        "add", "--chunker", CHUNKER, "--hash", HASH, "--quieter", "--pin",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(operand(path).into_os_string());
    Command::new(program, args)
}

/// `<bin> --timeout <T> cat --length 1 <cid>`
pub fn probe(program: &str, cid: &Cid, timeout: DaemonTimeout) -> Command {
    Command::new(
        program,
        [
            "--timeout".to_string(),
            timeout.to_string(),
            "cat".to_string(),
            "--length".to_string(),
            "1".to_string(),
            cid.to_string(),
        ],
    )
}

/// `<bin> --timeout <T> get --output <path> <cid>`
pub fn fetch(program: &str, cid: &Cid, timeout: DaemonTimeout, output: &Path) -> Command {
    let args: Vec<OsString> = vec![
        "--timeout".into(),
        timeout.to_string().into(),
        "get".into(),
        "--output".into(),
        operand(output).into_os_string(),
        cid.as_str().into(),
    ];
    Command::new(program, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeout::{DEFAULT_FETCH_TIMEOUT, DEFAULT_PROBE_TIMEOUT};
    use std::path::PathBuf;

    fn cid() -> Cid {
        "bafy123".parse().unwrap()
    }

    #[test]
    fn test_add_argv() {
        let cmd = add("ipfs", Path::new("/tmp/x"));
        assert_eq!(
            cmd.argv(),
            [
                "ipfs", "add", "--chunker", "size-1024", "--hash", "sha2-256", "--quieter",
                "--pin", "/tmp/x"
            ]
        );
        assert_eq!(cmd.program(), "ipfs");
        assert_eq!(cmd.args().last().map(OsString::as_os_str), Some(OsStr::new("/tmp/x")));
    }

    #[test]
    fn test_probe_argv() {
        let cmd = probe("ipfs", &cid(), DEFAULT_PROBE_TIMEOUT);
        assert_eq!(
            cmd.argv(),
            ["ipfs", "--timeout", "5s", "cat", "--length", "1", "bafy123"]
        );
    }

    #[test]
    fn test_fetch_argv_output_precedes_cid() {
        let out = PathBuf::from("/tmp/cachipfs-abc/content");
        let cmd = fetch("ipfs", &cid(), DEFAULT_FETCH_TIMEOUT, &out);
        assert_eq!(
            cmd.argv(),
            [
                "ipfs",
                "--timeout",
                "60s",
                "get",
                "--output",
                "/tmp/cachipfs-abc/content",
                "bafy123"
            ]
        );
        let output_pos = cmd.argv().iter().position(|a| a == "--output").unwrap();
        let cid_pos = cmd.argv().iter().position(|a| a == "bafy123").unwrap();
        assert!(output_pos < cid_pos);
    }

    #[test]
    fn test_builders_are_deterministic() {
        let a = add("/usr/bin/ipfs", Path::new("/data/file"));
        let b = add("/usr/bin/ipfs", Path::new("/data/file"));
        assert_eq!(a, b);

        let timeout: DaemonTimeout = "750ms".parse().unwrap();
        assert_eq!(probe("ipfs", &cid(), timeout), probe("ipfs", &cid(), timeout));
    }

    #[test]
    fn test_display_is_argv_vector() {
        let cmd = probe("ipfs", &cid(), DEFAULT_PROBE_TIMEOUT);
        assert_eq!(
            cmd.to_string(),
            r#"["ipfs", "--timeout", "5s", "cat", "--length", "1", "bafy123"]"#
        );
    }

    #[test]
    fn test_env_overlay_for_repo() {
        let env = EnvOverlay::for_repo(Path::new("/var/lib/ipfs"));
        assert_eq!(env.len(), 1);
        assert_eq!(env.get(REPO_ENV), Some(OsStr::new("/var/lib/ipfs")));
    }

    #[test]
    fn test_relative_path_with_leading_dash_is_not_a_flag() {
        let cmd = add("ipfs", Path::new("-x"));
        assert_eq!(cmd.args().last().map(OsString::as_os_str), Some(OsStr::new("./-x")));

        // Absolute and ordinary relative paths are untouched
        let cmd = add("ipfs", Path::new("data/-x"));
        assert_eq!(cmd.args().last().map(OsString::as_os_str), Some(OsStr::new("data/-x")));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_pass_through_verbatim() {
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"/tmp/caf\xe9.bin");
        let cmd = add("ipfs", Path::new(name));
        assert_eq!(cmd.args().last().map(OsString::as_os_str), Some(name));
        assert!(cmd.to_string().contains("caf\u{fffd}.bin"));

        let repo = OsStr::from_bytes(b"/srv/r\xff");
        let env = EnvOverlay::for_repo(Path::new(repo));
        assert_eq!(env.get(REPO_ENV), Some(repo));
        assert_eq!(env.iter().next(), Some((OsStr::new(REPO_ENV), repo)));

        let out = OsStr::from_bytes(b"/tmp/\xfe/content");
        let cmd = fetch("ipfs", &cid(), DEFAULT_FETCH_TIMEOUT, Path::new(out));
        assert_eq!(cmd.argv()[5].as_os_str(), out);
    }
}
