//! Per-unit diagnostic collection with cargo-style output
//!
//! Errors and warnings logged while a unit context is active are grouped
//! under that compilation unit so a failed batch can be reported unit by unit.

use super::events::LogEvent;
use crate::config::compile_time::logging::{MAX_ERROR_COLLECTION, MAX_LOG_EVENTS_PER_FILE};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The compilation unit a thread is currently working on
#[derive(Debug, Clone)]
pub struct UnitContext {
    pub file_path: PathBuf,
    /// Ordinal of the unit in its batch
    pub file_id: usize,
}

impl UnitContext {
    pub fn new(file_path: PathBuf, file_id: usize) -> Self {
        Self { file_path, file_id }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingSummary {
    /// Units that were entered at least once
    pub units_seen: usize,
    /// Units with at least one collected error
    pub units_failed: usize,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Default)]
struct UnitRecord {
    file_id: usize,
    events: Vec<LogEvent>,
    truncated: bool,
}

impl UnitRecord {
    fn error_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_error()).count()
    }
}

#[derive(Debug, Default)]
struct CollectorState {
    units: BTreeMap<PathBuf, UnitRecord>,
    total: usize,
}

/// Thread-safe per-unit event collector
pub struct ErrorCollector {
    state: Mutex<CollectorState>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CollectorState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CollectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_unit(&self, context: &UnitContext) {
        self.state()
            .units
            .entry(context.file_path.clone())
            .or_default()
            .file_id = context.file_id;
    }

    /// Keep `event` under `file_path`; silently dropped once the batch limit is hit
    pub fn record_event(&self, file_path: &Path, event: LogEvent) {
        let mut state = self.state();
        let full = state.total >= MAX_ERROR_COLLECTION;
        let record = state.units.entry(file_path.to_path_buf()).or_default();
        if record.events.len() >= MAX_LOG_EVENTS_PER_FILE {
            record.truncated = true;
            return;
        }
        if full {
            return;
        }
        record.events.push(event);
        state.total += 1;
    }

    pub fn unit_events(&self, file_path: &Path) -> Vec<LogEvent> {
        self.state()
            .units
            .get(file_path)
            .map(|record| record.events.clone())
            .unwrap_or_default()
    }

    pub fn summary(&self) -> ProcessingSummary {
        let state = self.state();
        let mut summary = ProcessingSummary {
            units_seen: state.units.len(),
            ..Default::default()
        };
        for record in state.units.values() {
            let errors = record.error_count();
            if errors > 0 {
                summary.units_failed += 1;
            }
            summary.errors += errors;
            summary.warnings += record.events.iter().filter(|e| e.is_warning()).count();
        }
        summary
    }

    pub fn clear(&self) {
        *self.state() = CollectorState::default();
    }
}

impl Default for ErrorCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Collected errors and warnings grouped by unit, rustc style
pub fn format_cargo_style_errors(collector: &ErrorCollector) -> String {
    let mut out = String::new();
    let state = collector.state();

    for (path, record) in &state.units {
        if record.events.is_empty() {
            continue;
        }
        for event in &record.events {
            let label = if event.is_error() { "error" } else { "warning" };
            let location = match &event.span {
                Some(span) => format!("{}:{}", path.display(), span.start()),
                None => path.display().to_string(),
            };
            let _ = writeln!(
                out,
                "{}[{}]: {}\n  --> {}",
                label,
                event.code.as_str(),
                event.message,
                location
            );
            for (key, value) in &event.context {
                if key != "file" && key != "file_id" {
                    let _ = writeln!(out, "  = {}: {}", key, value);
                }
            }
            if event.is_error() {
                let action = event.recommended_action();
                if action != "No specific action available" {
                    let _ = writeln!(out, "  = help: {}", action);
                }
            }
        }
        if record.truncated {
            let _ = writeln!(
                out,
                "  = note: unit #{} hit the limit of {} diagnostics",
                record.file_id, MAX_LOG_EVENTS_PER_FILE
            );
        }
        out.push('\n');
    }
    drop(state);

    let summary = collector.summary();
    if summary.errors > 0 {
        let _ = writeln!(
            out,
            "error: {} error(s) in {} unit(s)",
            summary.errors, summary.units_failed
        );
    }
    if summary.warnings > 0 {
        let _ = writeln!(out, "warning: {} warning(s)", summary.warnings);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;
    use crate::utils::{Position, Span};

    #[test]
    fn test_events_grouped_by_unit() {
        let collector = ErrorCollector::new();
        collector.record_unit(&UnitContext::new(PathBuf::from("C.java"), 2));
        collector.record_event(
            Path::new("A.java"),
            LogEvent::error(codes::front_end::SYNTAX_ERROR, "unexpected '}'"),
        );
        collector.record_event(Path::new("B.java"), LogEvent::warning("unused import"));

        assert_eq!(collector.unit_events(Path::new("A.java")).len(), 1);
        assert!(collector.unit_events(Path::new("C.java")).is_empty());

        assert_eq!(
            collector.summary(),
            ProcessingSummary {
                units_seen: 3,
                units_failed: 1,
                errors: 1,
                warnings: 1,
            }
        );

        collector.clear();
        assert_eq!(collector.summary(), ProcessingSummary::default());
    }

    #[test]
    fn test_per_unit_limit_marks_truncation() {
        let collector = ErrorCollector::new();
        let path = Path::new("Big.java");
        for _ in 0..MAX_LOG_EVENTS_PER_FILE + 5 {
            collector.record_event(path, LogEvent::warning("noise"));
        }
        assert_eq!(collector.unit_events(path).len(), MAX_LOG_EVENTS_PER_FILE);
        assert!(format_cargo_style_errors(&collector).contains("hit the limit"));
    }

    #[test]
    fn test_cargo_style_output() {
        let collector = ErrorCollector::new();
        let span = Span::new(Position::new(10, 2, 5), Position::new(11, 2, 6));
        collector.record_event(
            Path::new("p/A.java"),
            LogEvent::error(codes::front_end::SYNTAX_ERROR, "unexpected token")
                .with_span(span)
                .with_context("token", "}")
                .with_context("file", "p/A.java"),
        );

        let output = format_cargo_style_errors(&collector);
        assert!(output.contains("error[E022]: unexpected token"));
        assert!(output.contains("--> p/A.java:2:5"));
        assert!(output.contains("= token: }"));
        assert!(!output.contains("= file:"));
        assert!(output.contains("= help: Fix the reported syntax error"));
        assert!(output.contains("1 error(s) in 1 unit(s)"));
    }
}
