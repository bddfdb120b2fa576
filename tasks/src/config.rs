//! Configuration module for Yunie tasks.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `YUNIE_DATA_DIR` | No | `~/.yunie` | Directory holding `todos.json` and `finished.json` |
//!
//! # Example
//!
//! ```no_run
//! use yunie_tasks::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("Tasks stored in {}", config.data_dir.display());
//! ```

use std::env;
use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

use crate::persistence::FileStore;

/// Default data directory name relative to home.
const DEFAULT_DATA_DIR: &str = ".yunie";

/// Environment variable overriding the data directory.
pub const DATA_DIR_VAR: &str = "YUNIE_DATA_DIR";

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Configuration for the task store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the persisted task lists.
    pub data_dir: PathBuf,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - `YUNIE_DATA_DIR` is set but empty
    /// - `YUNIE_DATA_DIR` is unset and the home directory cannot be determined
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = match env::var(DATA_DIR_VAR) {
            Ok(val) if val.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    key: DATA_DIR_VAR.to_string(),
                    message: "data directory cannot be empty".to_string(),
                });
            }
            Ok(val) => PathBuf::from(val),
            Err(_) => {
                let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
                base_dirs.home_dir().join(DEFAULT_DATA_DIR)
            }
        };

        Ok(Self { data_dir })
    }

    /// Opens the file store in the configured data directory.
    #[must_use]
    pub fn file_store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing.
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            self.vars.push((key.to_string(), env::var(key).ok()));
            env::set_var(key, value);
        }

        fn remove(&mut self, key: &str) {
            self.vars.push((key.to_string(), env::var(key).ok()));
            env::remove_var(key);
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.iter().rev() {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    #[test]
    #[serial]
    fn data_dir_from_env() {
        let mut guard = EnvGuard::new();
        guard.set(DATA_DIR_VAR, "/tmp/yunie-test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/yunie-test"));
        assert_eq!(config.file_store().dir(), std::path::Path::new("/tmp/yunie-test"));
    }

    #[test]
    #[serial]
    fn data_dir_defaults_to_home() {
        let mut guard = EnvGuard::new();
        guard.remove(DATA_DIR_VAR);

        let config = Config::from_env().unwrap();
        assert!(config.data_dir.ends_with(DEFAULT_DATA_DIR));
    }

    #[test]
    #[serial]
    fn empty_data_dir_is_rejected() {
        let mut guard = EnvGuard::new();
        guard.set(DATA_DIR_VAR, "  ");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(
            err.to_string(),
            "invalid value for YUNIE_DATA_DIR: data directory cannot be empty"
        );
    }
}
