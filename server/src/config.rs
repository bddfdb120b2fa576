//! Server configuration module.
//!
//! Parses configuration from environment variables for the Yunie server.
//! The binary loads a `.env` file (if present) before parsing.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `PORT` | No | 3000 | HTTP server port |
//! | `OPENAI_API_KEY` | No* | - | Bearer token for the chat completions API |
//! | `YUNIE_OPENAI_URL` | No | `https://api.openai.com/v1` | Base URL of the chat completions API |
//! | `YUNIE_MODEL` | No | `gpt-4o-mini` | Model requested for companion replies |
//! | `YUNIE_TEMPERATURE` | No | 0.8 | Sampling temperature, 0.0 to 2.0 |
//! | `YUNIE_DATA_DIR` | No | `~/.yunie` | Directory holding the task lists |
//!
//! *Without `OPENAI_API_KEY` the server starts, but `POST /chat` answers 500.

use std::env;

use tracing::warn;

use crate::error::ConfigError;

/// Default HTTP server port.
const DEFAULT_PORT: u16 = 3000;

/// Default base URL of the chat completions API.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default model for companion replies.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Accepted sampling temperature range.
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

/// Server configuration parsed from environment variables.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,

    /// API key for the chat completions API.
    pub openai_api_key: Option<String>,

    /// Base URL of the chat completions API, without trailing slash.
    pub openai_url: String,

    /// Model requested for companion replies.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Task store location.
    pub tasks: yunie_tasks::Config,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_url", &self.openai_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("tasks", &self.tasks)
            .finish()
    }
}

impl Config {
    /// Parse configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `PORT` is not a valid u16
    /// - `YUNIE_TEMPERATURE` is not a number between 0.0 and 2.0
    /// - `YUNIE_MODEL` or `YUNIE_OPENAI_URL` is set but blank
    /// - the data directory cannot be determined
    ///
    /// # Example
    ///
    /// ```no_run
    /// use yunie_server::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// println!("Server will listen on port {}", config.port);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_port()?;
        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let openai_url = parse_non_empty("YUNIE_OPENAI_URL", DEFAULT_OPENAI_URL)?
            .trim_end_matches('/')
            .to_string();
        let model = parse_non_empty("YUNIE_MODEL", DEFAULT_MODEL)?;
        let temperature = parse_temperature()?;
        let tasks = yunie_tasks::Config::from_env()?;

        if openai_api_key.is_none() {
            warn!("OPENAI_API_KEY is not set - POST /chat will fail until it is configured");
        }

        Ok(Self {
            port,
            openai_api_key,
            openai_url,
            model,
            temperature,
            tasks,
        })
    }
}

/// Parse the PORT environment variable.
///
/// Returns the default port if not set.
fn parse_port() -> Result<u16, ConfigError> {
    match env::var("PORT") {
        Ok(port_str) => port_str
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid("PORT", format!("{e}"))),
        Err(env::VarError::NotPresent) => Ok(DEFAULT_PORT),
        Err(env::VarError::NotUnicode(_)) => {
            Err(ConfigError::invalid("PORT", "contains invalid unicode"))
        }
    }
}

/// Parse YUNIE_TEMPERATURE, checking it lies within the accepted range.
fn parse_temperature() -> Result<f32, ConfigError> {
    let raw = match env::var("YUNIE_TEMPERATURE") {
        Ok(raw) => raw,
        Err(env::VarError::NotPresent) => return Ok(DEFAULT_TEMPERATURE),
        Err(env::VarError::NotUnicode(_)) => {
            return Err(ConfigError::invalid(
                "YUNIE_TEMPERATURE",
                "contains invalid unicode",
            ))
        }
    };

    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid("YUNIE_TEMPERATURE", format!("'{raw}' is not a number")))?;

    if !TEMPERATURE_RANGE.contains(&value) {
        return Err(ConfigError::invalid(
            "YUNIE_TEMPERATURE",
            format!("{value} is outside 0.0..=2.0"),
        ));
    }
    Ok(value)
}

/// Read a string variable that may be unset (falls back to `default`) but
/// not blank.
fn parse_non_empty(name: &str, default: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::invalid(name, "cannot be empty")),
        Ok(value) => Ok(value.trim().to_string()),
        Err(env::VarError::NotPresent) => Ok(default.to_string()),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::invalid(name, "contains invalid unicode")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: &[&str] = &[
        "PORT",
        "OPENAI_API_KEY",
        "YUNIE_OPENAI_URL",
        "YUNIE_MODEL",
        "YUNIE_TEMPERATURE",
    ];

    /// Helper to temporarily set environment variables for testing.
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        /// Starts from a clean slate: every server variable unset and the
        /// data directory pointed somewhere harmless.
        fn clean() -> Self {
            let mut guard = Self::new();
            for var in ALL_VARS {
                guard.remove(var);
            }
            guard.set("YUNIE_DATA_DIR", "/tmp/yunie-server-test");
            guard
        }

        fn set(&mut self, key: &str, value: &str) {
            let old_value = env::var(key).ok();
            self.vars.push((key.to_string(), old_value));
            env::set_var(key, value);
        }

        fn remove(&mut self, key: &str) {
            let old_value = env::var(key).ok();
            self.vars.push((key.to_string(), old_value));
            env::remove_var(key);
        }

        #[cfg(unix)]
        fn set_bytes(&mut self, key: &str, value: &[u8]) {
            use std::ffi::OsStr;
            use std::os::unix::ffi::OsStrExt;

            let old_value = env::var(key).ok();
            self.vars.push((key.to_string(), old_value));
            env::set_var(key, OsStr::from_bytes(value));
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
    fn test_config_defaults() {
        let _guard = EnvGuard::clean();

        let config = Config::from_env().expect("should parse config");
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_url, DEFAULT_OPENAI_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!((config.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
        assert_eq!(
            config.tasks.data_dir,
            std::path::PathBuf::from("/tmp/yunie-server-test")
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        let mut guard = EnvGuard::clean();
        guard.set("PORT", "9090");
        guard.set("OPENAI_API_KEY", "sk-test");
        guard.set("YUNIE_OPENAI_URL", "http://localhost:8089/v1/");
        guard.set("YUNIE_MODEL", "gpt-4o");
        guard.set("YUNIE_TEMPERATURE", "1.25");

        let config = Config::from_env().expect("should parse config");
        assert_eq!(config.port, 9090);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai_url, "http://localhost:8089/v1");
        assert_eq!(config.model, "gpt-4o");
        assert!((config.temperature - 1.25).abs() < f32::EPSILON);
    }

    #[test]
    #[serial]
    fn test_blank_api_key_is_treated_as_unset() {
        let mut guard = EnvGuard::clean();
        guard.set("OPENAI_API_KEY", "   ");

        let config = Config::from_env().expect("should parse config");
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_invalid_port() {
        let mut guard = EnvGuard::clean();
        guard.set("PORT", "not-a-port");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "PORT"));
    }

    #[test]
    #[serial]
    fn test_temperature_out_of_range() {
        let mut guard = EnvGuard::clean();
        guard.set("YUNIE_TEMPERATURE", "2.5");

        let err = Config::from_env().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration value for 'YUNIE_TEMPERATURE': 2.5 is outside 0.0..=2.0"
        );
    }

    #[test]
    #[serial]
    fn test_temperature_not_a_number() {
        let mut guard = EnvGuard::clean();
        guard.set("YUNIE_TEMPERATURE", "warm");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "YUNIE_TEMPERATURE"));
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_temperature_invalid_unicode() {
        let mut guard = EnvGuard::clean();
        guard.set_bytes("YUNIE_TEMPERATURE", &[0x30, 0x2e, 0xff]);

        let err = Config::from_env().unwrap_err();
        assert_eq!(
            err,
            ConfigError::invalid("YUNIE_TEMPERATURE", "contains invalid unicode")
        );
    }

    #[test]
    #[serial]
    fn test_blank_model_is_rejected() {
        let mut guard = EnvGuard::clean();
        guard.set("YUNIE_MODEL", " ");

        let err = Config::from_env().unwrap_err();
        assert_eq!(
            err,
            ConfigError::invalid("YUNIE_MODEL", "cannot be empty")
        );
    }

    #[test]
    #[serial]
    fn test_blank_data_dir_is_rejected() {
        let mut guard = EnvGuard::clean();
        guard.set("YUNIE_DATA_DIR", "");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "YUNIE_DATA_DIR"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            port: 3000,
            openai_api_key: Some("sk-secret".to_string()),
            openai_url: DEFAULT_OPENAI_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            tasks: yunie_tasks::Config {
                data_dir: "/tmp".into(),
            },
        };

        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
