//! Daemon-side timeouts.
//!
//! The node never times anything out itself. A `DaemonTimeout` is rendered
//! into the daemon's global `--timeout` flag and the daemon enforces it.
//! Rendering uses whole seconds when possible (`5s`, `60s`) and falls back
//! to milliseconds (`1500ms`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default timeout for availability probes.
pub const DEFAULT_PROBE_TIMEOUT: DaemonTimeout = DaemonTimeout(Duration::from_secs(5));

/// Default timeout for fetches.
pub const DEFAULT_FETCH_TIMEOUT: DaemonTimeout = DaemonTimeout(Duration::from_secs(60));

/// A timeout passed through to the daemon's `--timeout` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DaemonTimeout(Duration);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeoutError {
    #[error("empty timeout")]
    Empty,

    #[error("invalid number in timeout {0:?}")]
    InvalidNumber(String),

    #[error("unknown unit {0:?} (expected ms, s, m or h)")]
    UnknownUnit(String),

    #[error("timeout must be greater than zero")]
    Zero,
}

impl DaemonTimeout {
    pub fn new(duration: Duration) -> Result<Self, TimeoutError> {
        if duration.as_millis() == 0 {
            return Err(TimeoutError::Zero);
        }
        Ok(Self(duration))
    }

    pub fn from_secs(secs: u64) -> Result<Self, TimeoutError> {
        Self::new(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl fmt::Display for DaemonTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.as_millis();
        if millis % 1000 == 0 {
            write!(f, "{}s", millis / 1000)
        } else {
            write!(f, "{}ms", millis)
        }
    }
}

impl FromStr for DaemonTimeout {
    type Err = TimeoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimeoutError::Empty);
        }

        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TimeoutError::UnknownUnit(String::new()))?;
        let (number, unit) = s.split_at(split);
        let value: u64 = number
            .parse()
            .map_err(|_| TimeoutError::InvalidNumber(s.to_string()))?;

        let duration = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            other => return Err(TimeoutError::UnknownUnit(other.to_string())),
        };

        Self::new(duration)
    }
}

impl TryFrom<String> for DaemonTimeout {
    type Error = TimeoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DaemonTimeout> for String {
    fn from(value: DaemonTimeout) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_render_like_the_daemon_expects() {
        assert_eq!(DEFAULT_PROBE_TIMEOUT.to_string(), "5s");
        assert_eq!(DEFAULT_FETCH_TIMEOUT.to_string(), "60s");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("5s".parse::<DaemonTimeout>().unwrap().as_duration(), Duration::from_secs(5));
        assert_eq!("1500ms".parse::<DaemonTimeout>().unwrap().as_duration(), Duration::from_millis(1500));
        assert_eq!("2m".parse::<DaemonTimeout>().unwrap().as_duration(), Duration::from_secs(120));
        assert_eq!("1h".parse::<DaemonTimeout>().unwrap().as_duration(), Duration::from_secs(3600));
    }

    #[test]
    fn test_render_prefers_seconds() {
        assert_eq!("2m".parse::<DaemonTimeout>().unwrap().to_string(), "120s");
        assert_eq!("2000ms".parse::<DaemonTimeout>().unwrap().to_string(), "2s");
        assert_eq!("250ms".parse::<DaemonTimeout>().unwrap().to_string(), "250ms");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<DaemonTimeout>(), Err(TimeoutError::Empty));
        assert_eq!("5".parse::<DaemonTimeout>(), Err(TimeoutError::UnknownUnit(String::new())));
        assert_eq!("5d".parse::<DaemonTimeout>(), Err(TimeoutError::UnknownUnit("d".into())));
        assert_eq!("s".parse::<DaemonTimeout>(), Err(TimeoutError::InvalidNumber("s".into())));
        assert_eq!("0s".parse::<DaemonTimeout>(), Err(TimeoutError::Zero));
    }

    #[test]
    fn test_serde_as_string() {
        let timeout: DaemonTimeout = serde_json::from_str("\"30s\"").unwrap();
        assert_eq!(timeout.as_duration(), Duration::from_secs(30));
        assert_eq!(serde_json::to_string(&timeout).unwrap(), "\"30s\"");
    }
}
