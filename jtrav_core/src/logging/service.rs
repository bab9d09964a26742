//! Logging service and its sinks

use super::codes::Code;
use super::config;
use super::events::{LogEvent, LogLevel};
use crate::config::runtime::LoggingPreferences;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Destination for log events
pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// How console events are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFormat {
    Text,
    /// One JSON object per line
    Json,
}

/// Level-filtered front door for a single sink; with no sink every event is dropped
pub struct LoggingService {
    sink: Option<Arc<dyn Logger>>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self {
            sink: Some(logger),
            min_level,
        }
    }

    /// Service that accepts nothing
    pub fn silent() -> Self {
        Self {
            sink: None,
            min_level: LogLevel::Error,
        }
    }

    pub fn from_preferences(preferences: &LoggingPreferences) -> Self {
        if !preferences.enable_console_logging {
            return Self::silent();
        }
        let format = if preferences.use_structured_logging {
            ConsoleFormat::Json
        } else {
            ConsoleFormat::Text
        };
        Self::new(
            Arc::new(ConsoleLogger::new(format)),
            preferences.min_log_level.to_events_log_level(),
        )
    }

    /// Service for the preferences installed in [`config`]
    pub fn with_config() -> Self {
        Self::from_preferences(&config::preferences())
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        self.sink.is_some() && level <= self.min_level
    }

    pub fn log_event(&self, event: LogEvent) {
        if !self.should_log(event.level) {
            return;
        }
        if let Some(sink) = &self.sink {
            sink.log(&event);
        }
    }

    pub fn log_error(&self, error_code: Code, message: &str) {
        self.log_event(LogEvent::error(error_code, message));
    }

    pub fn log_success(&self, success_code: Code, message: &str) {
        self.log_event(LogEvent::success(success_code, message));
    }
}

/// Console sink; errors and warnings go to stderr so stdout keeps the batch report clean
pub struct ConsoleLogger {
    format: ConsoleFormat,
}

impl ConsoleLogger {
    pub fn new(format: ConsoleFormat) -> Self {
        Self { format }
    }

    fn render(&self, event: &LogEvent) -> String {
        match self.format {
            ConsoleFormat::Text => event.to_string(),
            ConsoleFormat::Json => event.format_json().unwrap_or_else(|_| event.to_string()),
        }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        let line = self.render(event);
        match event.level {
            LogLevel::Error | LogLevel::Warning => eprintln!("{}", line),
            LogLevel::Info | LogLevel::Debug => println!("{}", line),
        }
    }
}

/// Bounded in-memory sink used by tests and embedding hosts
#[derive(Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn has_code(&self, code: Code) -> bool {
        self.lock().iter().any(|e| e.code == code)
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        let mut events = self.lock();
        let capacity = crate::config::compile_time::logging::LOG_BUFFER_SIZE;
        if events.len() >= capacity {
            let excess = events.len() + 1 - capacity;
            events.drain(..excess);
        }
        events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::runtime::LogLevel as PreferenceLevel;
    use crate::logging::codes;

    #[test]
    fn test_level_filtering() {
        let memory = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(memory.clone(), LogLevel::Warning);

        service.log_event(LogEvent::debug("parsing A.java"));
        service.log_success(codes::success::BATCH_COMPILED, "compiled");
        service.log_event(LogEvent::warning("only 2 of 3 sources prefetched"));
        service.log_error(codes::front_end::SYNTAX_ERROR, "unexpected '}'");

        assert_eq!(memory.event_count(), 2);
        assert!(memory.has_code(codes::front_end::SYNTAX_ERROR));
        assert!(!memory.has_code(codes::success::BATCH_COMPILED));

        memory.clear();
        assert!(memory.events().is_empty());
    }

    #[test]
    fn test_disabled_console_is_silent() {
        let preferences = LoggingPreferences {
            enable_console_logging: false,
            min_log_level: PreferenceLevel::Debug,
            ..LoggingPreferences::default()
        };
        let service = LoggingService::from_preferences(&preferences);
        assert!(!service.should_log(LogLevel::Error));
    }

    #[test]
    fn test_json_console_rendering() {
        let console = ConsoleLogger::new(ConsoleFormat::Json);
        let line = console.render(
            &LogEvent::error(codes::translation::TRANSLATION_FAILED, "rejected")
                .with_context("unit", "A.java"),
        );
        let json: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(json["code"], "E040");
        assert_eq!(json["context"]["unit"], "A.java");
    }
}
