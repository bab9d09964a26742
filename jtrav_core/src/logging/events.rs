//! Log events emitted by the bridge

use super::codes::{self, Code};
use crate::config::compile_time::logging::MAX_LOG_MESSAGE_LENGTH;
use crate::utils::Span;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Log severity; lower is more severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
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

    /// Code used when the caller does not supply one
    fn default_code(&self) -> Code {
        match self {
            LogLevel::Error => codes::system::INTERNAL_ERROR,
            LogLevel::Warning => Code::new("W000"),
            LogLevel::Info => Code::new("I000"),
            LogLevel::Debug => Code::new("D000"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub code: Code,
    pub message: String,
    pub span: Option<Span>,
    /// Ordered so formatted output is stable
    pub context: BTreeMap<String, String>,
}

fn clip(message: &str) -> String {
    if message.len() <= MAX_LOG_MESSAGE_LENGTH {
        return message.to_string();
    }
    let mut cut = MAX_LOG_MESSAGE_LENGTH;
    while !message.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &message[..cut])
}

impl LogEvent {
    fn new(level: LogLevel, code: Code, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            code,
            message: clip(message),
            span: None,
            context: BTreeMap::new(),
        }
    }

    pub fn error(error_code: Code, message: &str) -> Self {
        Self::new(LogLevel::Error, error_code, message)
    }

    pub fn warning(message: &str) -> Self {
        Self::new(LogLevel::Warning, LogLevel::Warning.default_code(), message)
    }

    pub fn info(message: &str) -> Self {
        Self::new(LogLevel::Info, LogLevel::Info.default_code(), message)
    }

    /// Info event carrying a success code
    pub fn success(success_code: Code, message: &str) -> Self {
        Self::new(LogLevel::Info, success_code, message)
    }

    pub fn debug(message: &str) -> Self {
        Self::new(LogLevel::Debug, LogLevel::Debug.default_code(), message)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn is_warning(&self) -> bool {
        self.level == LogLevel::Warning
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.code.as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.code.as_str())
    }

    /// Single-line JSON object for structured console output
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        let code = self.code.as_str();
        let mut json = serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339(),
            "level": self.level.as_str(),
            "code": code,
            "category": codes::get_category(code),
            "message": self.message,
        });

        if self.is_error() {
            json["error"] = serde_json::json!({
                "severity": codes::get_severity(code).as_str(),
                "recoverable": codes::is_recoverable(code),
                "requires_halt": self.requires_halt(),
                "description": codes::get_description(code),
                "action": self.recommended_action(),
            });
        }

        if let Some(span) = &self.span {
            json["span"] = serde_json::json!({
                "line": span.start().line,
                "column": span.start().column,
                "end_line": span.end().line,
                "end_column": span.end().column,
            });
        }

        if !self.context.is_empty() {
            json["context"] = serde_json::to_value(&self.context)?;
        }

        serde_json::to_string(&json)
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} - {}",
            self.level.as_str(),
            self.code.as_str(),
            self.message
        )?;
        if let Some(span) = &self.span {
            write!(f, " at {}", span.start())?;
        }
        let mut pairs = self.context.iter();
        if let Some((key, value)) = pairs.next() {
            write!(f, " ({}={}", key, value)?;
            for (key, value) in pairs {
                write!(f, ", {}={}", key, value)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_event_metadata() {
        let event = LogEvent::error(codes::front_end::SYNTAX_ERROR, "Syntax error");

        assert!(event.is_error());
        assert_eq!(event.code.as_str(), "E022");
        assert!(event.requires_halt());
        assert_eq!(event.recommended_action(), "Fix the reported syntax error");
    }

    #[test]
    fn test_display_includes_sorted_context() {
        let event = LogEvent::error(codes::translation::TRANSLATION_FAILED, "Node rejected")
            .with_context("unit", "A.java")
            .with_context("node", "field");

        assert_eq!(
            event.to_string(),
            "[ERROR] E040 - Node rejected (node=field, unit=A.java)"
        );
        assert_eq!(LogEvent::warning("slow").to_string(), "[WARN] W000 - slow");
    }

    #[test]
    fn test_json_formatting() {
        let event = LogEvent::error(codes::linkage::NATIVE_LINKAGE_FAILURE, "missing entry")
            .with_context("entry_point", "enter_type");

        let json: serde_json::Value = serde_json::from_str(&event.format_json().unwrap()).unwrap();
        assert_eq!(json["code"], "E050");
        assert_eq!(json["error"]["requires_halt"], true);
        assert_eq!(json["context"]["entry_point"], "enter_type");
        assert!(json.get("span").is_none());
    }

    #[test]
    fn test_long_messages_are_clipped() {
        let event = LogEvent::info(&"é".repeat(MAX_LOG_MESSAGE_LENGTH));
        assert!(event.message.ends_with("..."));
        assert!(event.message.len() <= MAX_LOG_MESSAGE_LENGTH + 3);
    }
}
