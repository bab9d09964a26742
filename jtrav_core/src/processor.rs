//! Unit processor: picks the units a batch translates and stops on diagnostics
//!
//! A unit is processed at most once per session, and only when the command
//! line named it. Every unit in the batch, processed or not, is checked for
//! front-end errors; the first one with any ends the run. The session is only
//! read here; the pipeline commits the selection once translation has run.

use crate::frontend::{FrontEnd, UnitState};
use crate::logging::{self, codes, Code};
use crate::registry::BatchRegistry;
use crate::session::Session;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// A unit carried front-end errors into the processing phase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Front-end errors in '{file_name}': {error_count} error(s), syntax errors: {has_syntax_error}")]
pub struct FrontEndDiagnosticError {
    pub file_name: String,
    pub error_count: usize,
    pub has_syntax_error: bool,
}

impl FrontEndDiagnosticError {
    pub fn error_code(&self) -> Code {
        if self.has_syntax_error {
            codes::front_end::SYNTAX_ERROR
        } else {
            codes::front_end::UNIT_DIAGNOSTICS
        }
    }
}

/// Process the batch and return the registry indices selected for translation
///
/// The registry length is re-read on every step. `is_specified` decides whether
/// an unprocessed unit belongs to this run. Indices come back in ascending order.
pub fn process_batch<F, P>(
    front_end: &mut F,
    registry: &mut BatchRegistry,
    session: &Session,
    mut is_specified: P,
) -> Result<Vec<usize>, FrontEndDiagnosticError>
where
    F: FrontEnd + ?Sized,
    P: FnMut(&str) -> bool,
{
    let mut selected = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut index = 0;

    while index < registry.len() {
        let Some(unit) = registry.get_mut(index) else {
            index += 1;
            continue;
        };

        let file_name = unit.file_name().to_string();
        if session.is_processed(&file_name) || seen.contains(&file_name) {
            unit.set_state(UnitState::AlreadyProcessed);
        } else if is_specified(&file_name) {
            front_end.process(unit, index);
            seen.insert(file_name.clone());
            selected.push(index);
        } else {
            unit.set_state(UnitState::SkippedTransitive);
        }

        if unit.has_syntax_error() || unit.has_errors() {
            report_diagnostics(unit.result().problems(), &file_name, index);
            return Err(FrontEndDiagnosticError {
                file_name,
                error_count: unit.result().error_count(),
                has_syntax_error: unit.has_syntax_error(),
            });
        }

        index += 1;
    }

    Ok(selected)
}

fn report_diagnostics(problems: &[crate::frontend::Problem], file_name: &str, index: usize) {
    logging::with_file_context(PathBuf::from(file_name), index, || {
        for problem in problems.iter().filter(|p| p.is_error) {
            logging::log_error_with_context(
                codes::front_end::UNIT_DIAGNOSTICS,
                &problem.message,
                problem.span,
                vec![("problem_code", problem.code.as_str())],
            );
        }
    });
}
