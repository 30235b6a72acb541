//! Errors for the fallible edges of the crate: configuration and replays.
//! The simulation itself never fails.

use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "config file {}: {source}", path.display())
            }
            Self::Parse(e) => write!(f, "config parse error: {e}"),
            Self::Invalid { field, reason } => write!(f, "invalid config field `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

#[derive(Debug)]
pub enum ReplayError {
    Io { path: PathBuf, source: io::Error },
    Parse(serde_json::Error),
    Config(ConfigError),
    Diverged { tick: u64, expected: u64, actual: u64 },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "replay file {}: {source}", path.display())
            }
            Self::Parse(e) => write!(f, "replay parse error: {e}"),
            Self::Config(e) => write!(f, "replay config: {e}"),
            Self::Diverged {
                tick,
                expected,
                actual,
            } => write!(
                f,
                "replay diverged at tick {tick}: expected checksum 0x{expected:016x}, got 0x{actual:016x}"
            ),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Diverged { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

impl From<ConfigError> for ReplayError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
