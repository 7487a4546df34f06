//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Target application settings.
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Script interpreter settings.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// stdio transport settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application.name.trim().is_empty() {
            return Err(invalid("application.name must not be empty"));
        }
        if self.executor.interpreter.trim().is_empty() {
            return Err(invalid("executor.interpreter must not be empty"));
        }
        if self.executor.timeout_ms == 0 {
            return Err(invalid("executor.timeout_ms must be greater than 0"));
        }
        if self.executor.max_output_bytes == 0 {
            return Err(invalid("executor.max_output_bytes must be greater than 0"));
        }
        if self.executor.max_retries > MAX_RETRIES {
            return Err(invalid(format!(
                "executor.max_retries must be at most {MAX_RETRIES}"
            )));
        }
        if self.transport.max_line_bytes == 0 {
            return Err(invalid("transport.max_line_bytes must be greater than 0"));
        }
        Ok(())
    }
}

/// Upper bound on retries; beyond this the backoff reaches hours.
const MAX_RETRIES: u32 = 10;

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        message: message.into(),
    }
}

/// Target application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationConfig {
    /// Application name as used in `tell application "<name>"`.
    /// Default: "Finder"
    #[serde(default = "default_application")]
    pub name: String,

    /// Check that the application is running before each tool call.
    #[serde(default = "default_true")]
    pub probe: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_application(),
            probe: default_true(),
        }
    }
}

fn default_application() -> String {
    "Finder".to_string()
}

const fn default_true() -> bool {
    true
}

/// Script interpreter configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Interpreter command.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Flag passed before the script source.
    #[serde(default = "default_script_flag")]
    pub script_flag: String,

    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum stdout size per attempt, in bytes.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Retries after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds; doubles per retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            script_flag: default_script_flag(),
            timeout_ms: default_timeout_ms(),
            max_output_bytes: default_max_output_bytes(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_interpreter() -> String {
    "osascript".to_string()
}

fn default_script_flag() -> String {
    "-e".to_string()
}

const fn default_timeout_ms() -> u64 {
    10_000
}

const fn default_max_output_bytes() -> usize {
    1024 * 1024
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_base_delay_ms() -> u64 {
    1_000
}

/// stdio transport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Longest accepted input line in bytes. Longer lines are discarded.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

const fn default_max_line_bytes() -> usize {
    4 * 1024 * 1024
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.application.name, "Finder");
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "application": {
                "name": "Music",
                "probe": false
            },
            "executor": {
                "interpreter": "/usr/bin/osascript",
                "script_flag": "-e",
                "timeout_ms": 5000,
                "max_output_bytes": 65536,
                "max_retries": 1,
                "base_delay_ms": 250
            },
            "transport": {
                "max_line_bytes": 1024
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.application.name, "Music");
        assert!(!config.application.probe);
        assert_eq!(config.executor.interpreter, "/usr/bin/osascript");
        assert_eq!(config.executor.timeout_ms, 5000);
        assert_eq!(config.executor.max_output_bytes, 65536);
        assert_eq!(config.executor.max_retries, 1);
        assert_eq!(config.executor.base_delay_ms, 250);
        assert_eq!(config.transport.max_line_bytes, 1024);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn executor_config_defaults() {
        let config = ExecutorConfig::default();
        assert_eq!(config.interpreter, "osascript");
        assert_eq!(config.script_flag, "-e");
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.max_output_bytes, 1_048_576);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 1_000);
    }

    #[test]
    fn logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn reject_zero_timeout() {
        let json = r#"{
            "executor": {
                "timeout_ms": 0
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_empty_application_name() {
        let json = r#"{ "application": { "name": "  " } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_excessive_retries() {
        let json = r#"{ "executor": { "max_retries": 50 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
