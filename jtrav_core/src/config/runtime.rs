//! Runtime preferences
//!
//! Read from `JTRAV_*` environment variables, optionally overridden by a TOML
//! file passed on the command line.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::compile_time::batch::MAX_READ_THREADS;
use crate::config::compile_time::front_end::PARSE_THRESHOLD;
use crate::logging::events::LogLevel as EventLevel;

/// Parse `key` from the environment, falling back to `default` when unset or malformed
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Front-end driver preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontEndPreferences {
    /// Disable the source prefetch pool even for large batches
    pub use_single_thread: bool,

    /// Worker threads used to prefetch sources (clamped to the compile-time maximum)
    pub read_threads: usize,

    /// Units parsed in full before the driver switches to diet parsing
    pub parse_threshold: usize,
}

impl Default for FrontEndPreferences {
    fn default() -> Self {
        Self {
            use_single_thread: env_or(env_vars::USE_SINGLE_THREAD, false),
            read_threads: env_or(env_vars::READ_THREADS, 4),
            parse_threshold: env_or(env_vars::PARSE_THRESHOLD, PARSE_THRESHOLD),
        }
    }
}

impl FrontEndPreferences {
    /// Effective number of prefetch workers
    pub fn effective_read_threads(&self) -> usize {
        self.read_threads.clamp(1, MAX_READ_THREADS)
    }
}

/// Logging preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Minimum level that reaches the configured logger
    pub min_log_level: LogLevel,

    /// Whether to print a cargo-style summary of collected diagnostics on failure
    pub enable_cargo_style_output: bool,

    /// Whether to attach the current file to log events
    pub include_file_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env_or(env_vars::LOGGING_USE_STRUCTURED, false),
            enable_console_logging: env_or(env_vars::LOGGING_ENABLE_CONSOLE, true),
            min_log_level: env_or(env_vars::LOGGING_MIN_LEVEL, LogLevel::Info),
            enable_cargo_style_output: env_or(env_vars::LOGGING_CARGO_STYLE, true),
            include_file_context: env_or(env_vars::LOGGING_INCLUDE_FILE_CONTEXT, true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    pub fn to_events_log_level(&self) -> EventLevel {
        match self {
            LogLevel::Error => EventLevel::Error,
            LogLevel::Warning => EventLevel::Warning,
            LogLevel::Info => EventLevel::Info,
            LogLevel::Debug => EventLevel::Debug,
        }
    }
}

/// Accepts level names or their numeric rank, case-insensitively
impl FromStr for LogLevel {
    type Err = String;

    fn from_str(level: &str) -> Result<Self, Self::Err> {
        match level.to_ascii_lowercase().as_str() {
            "error" | "0" => Ok(LogLevel::Error),
            "warn" | "warning" | "1" => Ok(LogLevel::Warning),
            "info" | "2" => Ok(LogLevel::Info),
            "debug" | "3" => Ok(LogLevel::Debug),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    level.parse().ok()
}

/// Errors raised while loading a runtime preferences file
#[derive(Debug, Error)]
pub enum RuntimeConfigError {
    #[error("Failed to read preferences file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid preferences file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// All runtime preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub front_end: FrontEndPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Preferences from environment variables only
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Load preferences from a TOML file; missing keys fall back to the environment defaults
    pub fn load(path: &Path) -> Result<Self, RuntimeConfigError> {
        let content = fs::read_to_string(path).map_err(|source| RuntimeConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| RuntimeConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Front end
    pub const USE_SINGLE_THREAD: &str = "JTRAV_USE_SINGLE_THREAD";
    pub const READ_THREADS: &str = "JTRAV_READ_THREADS";
    pub const PARSE_THRESHOLD: &str = "JTRAV_PARSE_THRESHOLD";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "JTRAV_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "JTRAV_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "JTRAV_LOGGING_MIN_LEVEL";
    pub const LOGGING_CARGO_STYLE: &str = "JTRAV_LOGGING_CARGO_STYLE";
    pub const LOGGING_INCLUDE_FILE_CONTEXT: &str = "JTRAV_LOGGING_INCLUDE_FILE_CONTEXT";
}
