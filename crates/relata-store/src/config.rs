//! Store configuration
//!
//! Embedded in the CLI's TOML config under `[store]`; every field has a
//! default so an empty table is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Path SQLite treats as a private in-memory database
pub const MEMORY_PATH: &str = ":memory:";

/// SQLite store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file (`:memory:` for an in-memory database)
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// How long a writer waits on a locked database, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Use write-ahead logging for file databases
    #[serde(default = "default_wal")]
    pub wal: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from("relata.db")
}

/// Default busy timeout: 5 seconds
fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_wal() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            wal: default_wal(),
        }
    }
}

impl StoreConfig {
    /// Settings for a database file at `path`
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Settings for a throwaway in-memory database
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            wal: false,
            ..Self::default()
        }
    }

    /// Whether this points at an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.path, PathBuf::from("relata.db"));
        assert_eq!(config.busy_timeout_ms, 5000);
        assert!(config.wal);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_in_memory_preset() {
        let config = StoreConfig::in_memory();
        assert!(config.is_in_memory());
        assert!(!config.wal);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"path": "data/links.db"}"#).unwrap();
        assert_eq!(config.path, PathBuf::from("data/links.db"));
        assert_eq!(config.busy_timeout_ms, 5000);
        assert!(config.wal);
    }
}
