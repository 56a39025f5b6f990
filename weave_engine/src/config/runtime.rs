// RUNTIME PREFERENCES (User Experience)

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalPreferences {
    /// Whether to show position information in error messages
    pub include_position_in_errors: bool,

    /// Whether to log string length statistics
    pub log_string_statistics: bool,
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            include_position_in_errors: env::var("WEAVE_LEXICAL_INCLUDE_POSITIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_string_statistics: env::var("WEAVE_LEXICAL_LOG_STRING_STATS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorPreferences {
    /// Whether to log per-execution success events
    pub log_execution_events: bool,

    /// Output format assumed when the header carries no output directive
    pub default_output_format: String,
}

impl Default for EvaluatorPreferences {
    fn default() -> Self {
        Self {
            log_execution_events: env::var("WEAVE_RUNTIME_LOG_EXECUTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            default_output_format: env::var("WEAVE_RUNTIME_DEFAULT_OUTPUT")
                .unwrap_or_else(|_| "json".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging (user preference)
    pub use_structured_logging: bool,

    /// User preferred minimum log level
    pub min_log_level: LogLevel,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var("WEAVE_LOGGING_USE_STRUCTURED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var("WEAVE_LOGGING_MIN_LEVEL")
                .ok()
                .and_then(|v| LogLevel::parse(&v))
                .unwrap_or(LogLevel::Info),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub lexical: LexicalPreferences,
    pub evaluator: EvaluatorPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse a configuration from TOML text. Missing sections and fields
    /// fall back to their environment-driven defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a configuration from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config file {}: {}", path.display(), e))?;
        Self::from_toml_str(&text).map_err(|e| format!("Invalid config file: {}", e))
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Lexical
    pub const LEXICAL_INCLUDE_POSITIONS: &str = "WEAVE_LEXICAL_INCLUDE_POSITIONS";
    pub const LEXICAL_LOG_STRING_STATS: &str = "WEAVE_LEXICAL_LOG_STRING_STATS";

    // Runtime
    pub const RUNTIME_LOG_EXECUTIONS: &str = "WEAVE_RUNTIME_LOG_EXECUTIONS";
    pub const RUNTIME_DEFAULT_OUTPUT: &str = "WEAVE_RUNTIME_DEFAULT_OUTPUT";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "WEAVE_LOGGING_USE_STRUCTURED";
    pub const LOGGING_MIN_LEVEL: &str = "WEAVE_LOGGING_MIN_LEVEL";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_toml_round_trip() {
        let config = RuntimeConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed = RuntimeConfig::from_toml_str(&text).unwrap();
        assert_eq!(
            parsed.evaluator.default_output_format,
            config.evaluator.default_output_format
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = RuntimeConfig::from_toml_str(
            "[evaluator]\nlog_execution_events = false\ndefault_output_format = \"csv\"\n",
        )
        .unwrap();

        assert!(!parsed.evaluator.log_execution_events);
        assert_eq!(parsed.evaluator.default_output_format, "csv");
        // Untouched section falls back to its default
        assert!(parsed.lexical.include_position_in_errors);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nuse_structured_logging = true").unwrap();

        let config = RuntimeConfig::load_from_path(file.path()).unwrap();
        assert!(config.logging.use_structured_logging);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let error = RuntimeConfig::load_from_path(Path::new("/nonexistent/weave.toml"))
            .unwrap_err();
        assert!(error.contains("/nonexistent/weave.toml"));
    }

    #[test]
    fn test_env_var_names_exist() {
        assert!(!env_vars::LEXICAL_INCLUDE_POSITIONS.is_empty());
        assert!(!env_vars::LOGGING_MIN_LEVEL.is_empty());
    }
}
