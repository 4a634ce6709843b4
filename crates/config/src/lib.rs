//! Tarn Configuration Management
//!
//! Loads interpreter options from `key = value` option files or JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tarn_core::TarnError;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    /// Malformed JSON document
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for TarnError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::FileError(e) => TarnError::Io(e),
            other => TarnError::Config(other.to_string()),
        }
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Interpreter options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Instance name used in log events (from "name" option)
    pub name: String,
    /// Nested script calls before a stack overflow error (from "maxcalldepth" option, default: 256)
    pub max_call_depth: usize,
    /// Poll the cancellation token once per statement (from "checkcancellation" option)
    pub check_cancellation: bool,
    /// Allow `return` at script top level (from "toplevelreturn" option)
    pub top_level_return: bool,
    /// Emit a trace event per executed statement (from "tracestatements" option)
    pub trace_statements: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            name: "tarn".into(),
            max_call_depth: 256,
            check_cancellation: true,
            top_level_return: true,
            trace_statements: false,
        }
    }
}

impl InterpreterConfig {
    /// Load configuration from an option file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Load configuration from a JSON document; missing keys keep their defaults
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse option file content
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                config.parse_option(key.trim(), value.trim());
            } else {
                tracing::warn!("Ignoring malformed option line: {}", line);
            }
        }

        config
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        match key {
            "name" => self.name = value.into(),
            "maxcalldepth" => {
                self.max_call_depth = parse_or(key, value, 256);
            }
            "checkcancellation" => {
                self.check_cancellation = parse_or(key, value, true);
            }
            "toplevelreturn" => {
                self.top_level_return = parse_or(key, value, true);
            }
            "tracestatements" => {
                self.trace_statements = parse_or(key, value, false);
            }
            _ => {
                tracing::debug!("Unknown config option: {} = {}", key, value);
            }
        }
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Interpreter configuration:");
        tracing::info!("    Name: {}", self.name);
        tracing::info!("    Max Call Depth: {}", self.max_call_depth);
        tracing::info!("    Check Cancellation: {}", self.check_cancellation);
        tracing::info!("    Top-Level Return: {}", self.top_level_return);
        tracing::info!("    Trace Statements: {}", self.trace_statements);
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: &str, default: T) -> T {
    value.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid value for {}: {:?}, using default", key, value);
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = InterpreterConfig::default();
        assert_eq!(config.max_call_depth, 256);
        assert!(config.check_cancellation);
        assert!(config.top_level_return);
    }

    #[test]
    fn test_parse_simple_config() {
        let config_text = r#"
# interpreter options
name = sandbox
maxcalldepth = 32
tracestatements = true
"#;
        let config = InterpreterConfig::parse(config_text);
        assert_eq!(config.name, "sandbox");
        assert_eq!(config.max_call_depth, 32);
        assert!(config.trace_statements);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = InterpreterConfig::parse("maxcalldepth = lots\nunknown = 1\nnonsense");
        assert_eq!(config, InterpreterConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "toplevelreturn = false").unwrap();
        writeln!(file, "checkcancellation = false").unwrap();

        let config = InterpreterConfig::load_from_file(file.path()).unwrap();
        assert!(!config.top_level_return);
        assert!(!config.check_cancellation);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = InterpreterConfig::load_from_file(dir.path().join("missing.txt"));
        assert!(matches!(result, Err(ConfigError::FileError(_))));
    }

    #[test]
    fn test_from_json() {
        let config = InterpreterConfig::from_json(r#"{ "max_call_depth": 8 }"#).unwrap();
        assert_eq!(config.max_call_depth, 8);
        assert_eq!(config.name, "tarn");

        assert!(InterpreterConfig::from_json("{").is_err());
    }
}
