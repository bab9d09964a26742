//! Logging configuration
//!
//! Collection limits are compile-time constants. Level, sink and summary
//! behaviour come from the [`LoggingPreferences`] installed by the CLI or
//! by `jtrav_init` before the first batch.

use crate::config::compile_time::logging::{
    LOG_BUFFER_SIZE, MAX_ERROR_COLLECTION, MAX_LOG_EVENTS_PER_FILE,
};
use crate::config::runtime::LoggingPreferences;
use crate::logging::events::LogLevel;
use std::sync::OnceLock;

static PREFERENCES: OnceLock<LoggingPreferences> = OnceLock::new();

/// Install preferences for this process; a second call is rejected
pub fn init_runtime_preferences(preferences: LoggingPreferences) -> Result<(), String> {
    PREFERENCES
        .set(preferences)
        .map_err(|_| "Logging preferences already installed".to_string())
}

/// Installed preferences, or the environment defaults when none were installed
pub fn preferences() -> LoggingPreferences {
    PREFERENCES.get().cloned().unwrap_or_default()
}

pub fn min_level() -> LogLevel {
    preferences().min_log_level.to_events_log_level()
}

pub fn debug_enabled() -> bool {
    min_level() >= LogLevel::Debug
}

pub fn include_file_context() -> bool {
    preferences().include_file_context
}

pub fn cargo_style_summary() -> bool {
    preferences().enable_cargo_style_output
}

/// Check that the compiled-in collection limits are consistent
pub fn validate_limits() -> Result<(), String> {
    if !(100..=100_000).contains(&LOG_BUFFER_SIZE) {
        return Err(format!(
            "Log buffer size {} outside 100..=100000",
            LOG_BUFFER_SIZE
        ));
    }
    if MAX_LOG_EVENTS_PER_FILE > LOG_BUFFER_SIZE {
        return Err(format!(
            "Per-unit event limit {} exceeds the buffer size {}",
            MAX_LOG_EVENTS_PER_FILE, LOG_BUFFER_SIZE
        ));
    }
    if MAX_ERROR_COLLECTION < MAX_LOG_EVENTS_PER_FILE {
        return Err("Batch event limit is smaller than the per-unit limit".to_string());
    }
    Ok(())
}
