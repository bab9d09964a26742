//! Global logging for the traversal bridge
//!
//! A process-wide [`LoggingService`] and [`ErrorCollector`], the compilation
//! unit the current thread is working on, and the `log_*!` macros that feed
//! both.

pub mod codes;
pub mod collector;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::OnceLock;

pub use codes::Code;
pub use collector::{ErrorCollector, ProcessingSummary, UnitContext};
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleFormat, ConsoleLogger, Logger, LoggingService, MemoryLogger};

static SERVICE: OnceLock<LoggingService> = OnceLock::new();
static COLLECTOR: OnceLock<ErrorCollector> = OnceLock::new();

thread_local! {
    static CURRENT_UNIT: RefCell<Option<UnitContext>> = const { RefCell::new(None) };
}

/// Install the service built from the runtime preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_limits().map_err(|e| format!("Invalid logging limits: {}", e))?;
    init_global_logging_with_service(LoggingService::with_config())?;

    crate::log_success!(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Logging initialized",
        "build" => crate::config::build_info::source_info()
    );
    Ok(())
}

/// Install a caller-built service; fails if logging is already up
pub fn init_global_logging_with_service(service: LoggingService) -> Result<(), String> {
    SERVICE
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())?;
    // The collector is only ever installed next to the service
    let _ = COLLECTOR.set(ErrorCollector::new());
    Ok(())
}

pub fn is_initialized() -> bool {
    SERVICE.get().is_some()
}

fn service() -> Option<&'static LoggingService> {
    SERVICE.get()
}

fn collector() -> Option<&'static ErrorCollector> {
    COLLECTOR.get()
}

/// Restores the previous unit context when dropped
struct UnitGuard {
    previous: Option<UnitContext>,
}

impl Drop for UnitGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_UNIT.with(|cell| *cell.borrow_mut() = previous);
    }
}

/// Run `f` with `file_path` (ordinal `file_id` in its batch) as the current unit
pub fn with_file_context<F, R>(file_path: PathBuf, file_id: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    let context = UnitContext::new(file_path, file_id);
    if let Some(collector) = collector() {
        collector.record_unit(&context);
    }
    let previous = CURRENT_UNIT.with(|cell| cell.borrow_mut().replace(context));
    let _guard = UnitGuard { previous };
    f()
}

pub fn current_unit() -> Option<UnitContext> {
    CURRENT_UNIT.with(|cell| cell.borrow().clone())
}

/// Attach context pairs and the current unit, forward to the service and
/// keep errors and warnings in the collector
fn emit(mut event: LogEvent, context: Vec<(&str, &str)>) {
    for (key, value) in context {
        event = event.with_context(key, value);
    }

    let unit = current_unit();
    if let Some(unit) = &unit {
        if config::include_file_context() {
            event = event
                .with_context("file", &unit.file_path.display().to_string())
                .with_context("file_id", &unit.file_id.to_string());
        }
        if event.is_error() || event.is_warning() {
            if let Some(collector) = collector() {
                collector.record_event(&unit.file_path, event.clone());
            }
        }
    }

    if let Some(service) = service() {
        service.log_event(event);
    }
}

/// Used by `log_error!`
pub fn log_error_with_context(
    code: Code,
    message: &str,
    span: Option<crate::utils::Span>,
    context: Vec<(&str, &str)>,
) {
    let event = LogEvent::error(code, message);
    emit(
        match span {
            Some(span) => event.with_span(span),
            None => event,
        },
        context,
    );
}

/// Used by `log_success!`
pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    emit(LogEvent::success(code, message), context);
}

/// Used by `log_info!`
pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    emit(LogEvent::info(message), context);
}

/// Used by `log_warning!` and `log_debug!`
pub fn log_event_with_context(event: LogEvent, context: Vec<(&str, &str)>) {
    emit(event, context);
}

/// Print the grouped diagnostics to stderr when cargo-style output is enabled
pub fn print_cargo_style_summary() {
    if !config::cargo_style_summary() {
        return;
    }
    if let Some(collector) = collector() {
        let report = collector::format_cargo_style_errors(collector);
        if !report.is_empty() {
            eprint!("{}", report);
        }
    }
}
