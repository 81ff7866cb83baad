//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! {
//!   "parser": { "comment_prefixes": ["#", "//"], "continuation_marker": "\\" },
//!   "executor": { "error_rows": "divert" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Recipe parsing options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Lines starting with any of these (after leading whitespace) are ignored.
    pub comment_prefixes: Vec<String>,
    /// A line ending in this character continues on the next physical line.
    pub continuation_marker: char,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            comment_prefixes: vec!["#".to_string(), "//".to_string()],
            continuation_marker: '\\',
        }
    }
}

/// What happens to a row a directive diverts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorRowPolicy {
    /// Remove the row from the batch; later directives never see it.
    #[default]
    Divert,
    /// Record the error but keep the row in place for later directives.
    Retain,
}

/// Pipeline execution options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorOptions {
    pub error_rows: ErrorRowPolicy,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub parser: ParserOptions,
    pub executor: ExecutorOptions,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.parser.comment_prefixes.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidValue {
                field: "parser.comment_prefixes".to_string(),
                message: "comment prefixes must not be empty".to_string(),
            });
        }
        if self.parser.continuation_marker.is_whitespace() {
            return Err(ConfigError::InvalidValue {
                field: "parser.continuation_marker".to_string(),
                message: "continuation marker must not be whitespace".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.parser.comment_prefixes, vec!["#", "//"]);
        assert_eq!(config.executor.error_rows, ErrorRowPolicy::Divert);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json(
            r#"{"parser": {"continuation_marker": "+"}, "executor": {"error_rows": "retain"}}"#,
        )
        .unwrap();
        assert_eq!(config.parser.continuation_marker, '+');
        assert_eq!(config.parser.comment_prefixes.len(), 2);
        assert_eq!(config.executor.error_rows, ErrorRowPolicy::Retain);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"parser": {"comment_prefixes": [""]}}"#),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"executor": {"error_rows": "explode"}}"#),
            Err(ConfigError::JsonError(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"parser": {{"comment_prefixes": ["--"]}}}}"#).unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.parser.comment_prefixes, vec!["--"]);
    }
}
