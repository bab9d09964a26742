//! Compilation units, their results and the sources they are parsed from

use super::ast::CompilationUnitDecl;
use crate::logging::{codes, Code};
use crate::utils::Span;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Lifecycle of a unit inside one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    Unparsed,
    Parsed,
    Bound,
    Translated,
    /// Not requested by this run; parsed and bound for resolution only
    SkippedTransitive,
    /// Its file was already handled earlier in this batch or by an earlier batch
    AlreadyProcessed,
    CleanedUp,
    Accepted,
}

/// Why a source is part of the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceOrigin {
    /// Named on the command line
    Requested,
    /// Pulled in while completing bindings
    Closure,
}

// ============================================================================
// SOURCE UNITS
// ============================================================================

/// Failure to obtain the contents of a source
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceReadError {
    #[error("Cannot read source '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Source '{path}' is {size} bytes (limit {limit})")]
    TooLarge { path: String, size: u64, limit: u64 },
}

impl SourceReadError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::Io { .. } => codes::front_end::SOURCE_READ_FAILURE,
            Self::TooLarge { .. } => codes::front_end::SOURCE_TOO_LARGE,
        }
    }
}

/// A source file waiting to be parsed
#[derive(Debug, Clone)]
pub struct SourceUnit {
    file_name: String,
    path: PathBuf,
    origin: SourceOrigin,
    contents: Option<Result<Arc<str>, SourceReadError>>,
}

impl SourceUnit {
    /// Source backed by a file; `file_name` is kept exactly as given
    pub fn from_path(file_name: &str, origin: SourceOrigin) -> Self {
        Self {
            file_name: file_name.to_string(),
            path: PathBuf::from(file_name),
            origin,
            contents: None,
        }
    }

    /// Source whose contents are already in memory
    pub fn with_contents(file_name: &str, contents: &str, origin: SourceOrigin) -> Self {
        Self {
            file_name: file_name.to_string(),
            path: PathBuf::from(file_name),
            origin,
            contents: Some(Ok(Arc::from(contents))),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn origin(&self) -> SourceOrigin {
        self.origin
    }

    pub fn is_loaded(&self) -> bool {
        self.contents.is_some()
    }

    /// Loaded without a read error
    pub fn is_readable(&self) -> bool {
        matches!(self.contents, Some(Ok(_)))
    }

    /// Read the file if it has not been read yet
    pub fn load(&mut self, max_size: u64) {
        if self.contents.is_some() {
            return;
        }

        let path = self.path.display().to_string();
        let result = fs::metadata(&self.path)
            .map_err(|e| SourceReadError::Io {
                path: path.clone(),
                message: e.to_string(),
            })
            .and_then(|metadata| {
                if metadata.len() > max_size {
                    Err(SourceReadError::TooLarge {
                        path: path.clone(),
                        size: metadata.len(),
                        limit: max_size,
                    })
                } else {
                    fs::read_to_string(&self.path).map_err(|e| SourceReadError::Io {
                        path: path.clone(),
                        message: e.to_string(),
                    })
                }
            })
            .map(Arc::from);

        self.contents = Some(result);
    }

    /// Contents of the source, reading it on demand
    pub fn contents(&mut self, max_size: u64) -> Result<Arc<str>, SourceReadError> {
        self.load(max_size);
        match &self.contents {
            Some(result) => result.clone(),
            None => Err(SourceReadError::Io {
                path: self.file_name.clone(),
                message: "source was not loaded".to_string(),
            }),
        }
    }

    /// Drop the buffered contents
    pub fn release(&mut self) {
        self.contents = None;
    }
}

// ============================================================================
// PROBLEMS AND RESULTS
// ============================================================================

/// One diagnostic reported by the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub code: String,
    pub message: String,
    pub span: Option<Span>,
    pub is_error: bool,
}

impl Problem {
    pub fn error(code: Code, message: &str, span: Option<Span>) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.to_string(),
            span,
            is_error: true,
        }
    }

    pub fn warning(code: Code, message: &str, span: Option<Span>) -> Self {
        Self {
            is_error: false,
            ..Self::error(code, message, span)
        }
    }
}

/// Per-unit diagnostics and bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationResult {
    file_name: String,
    unit_index: usize,
    total_units_known: usize,
    max_problems: usize,
    problems: Vec<Problem>,
    /// Problems dropped after `max_problems` was reached
    suppressed_problems: usize,
    has_syntax_error: bool,
    line_separator_positions: Vec<usize>,
    package_name: Option<Vec<String>>,
    accepted: bool,
}

impl CompilationResult {
    pub fn new(file_name: &str, unit_index: usize, total_units_known: usize, max_problems: usize) -> Self {
        Self {
            file_name: file_name.to_string(),
            unit_index,
            total_units_known,
            max_problems,
            problems: Vec::new(),
            suppressed_problems: 0,
            has_syntax_error: false,
            line_separator_positions: Vec::new(),
            package_name: None,
            accepted: false,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn unit_index(&self) -> usize {
        self.unit_index
    }

    pub fn total_units_known(&self) -> usize {
        self.total_units_known
    }

    /// Record a problem; errors beyond the per-unit limit are counted but not kept
    pub fn record(&mut self, problem: Problem) {
        if self.problems.len() < self.max_problems {
            self.problems.push(problem);
        } else {
            self.suppressed_problems += 1;
            if problem.is_error && !self.problems.iter().any(|p| p.is_error) {
                // Never let the limit hide the fact that the unit failed
                self.problems.pop();
                self.problems.push(problem);
            }
        }
    }

    pub fn record_syntax_error(&mut self, message: &str, span: Option<Span>) {
        self.has_syntax_error = true;
        self.record(Problem::error(codes::front_end::SYNTAX_ERROR, message, span));
    }

    pub fn has_syntax_error(&self) -> bool {
        self.has_syntax_error
    }

    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(|p| p.is_error)
    }

    pub fn error_count(&self) -> usize {
        self.problems.iter().filter(|p| p.is_error).count()
    }

    pub fn problem_count(&self) -> usize {
        self.problems.len() + self.suppressed_problems
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn set_line_separator_positions(&mut self, positions: Vec<usize>) {
        self.line_separator_positions = positions;
    }

    pub fn line_separator_positions(&self) -> &[usize] {
        &self.line_separator_positions
    }

    pub fn record_package_name(&mut self, tokens: Vec<String>) {
        self.package_name = Some(tokens);
    }

    pub fn package_name(&self) -> Option<&[String]> {
        self.package_name.as_deref()
    }

    /// Mark the result as handed to the requestor
    pub fn tag_as_accepted(&mut self) -> &Self {
        self.accepted = true;
        self
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}

// ============================================================================
// COMPILATION UNITS
// ============================================================================

/// A parsed source plus everything the front end learned about it
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    file_name: String,
    origin: SourceOrigin,
    result: CompilationResult,
    ordinal: usize,
    state: UnitState,
    source: Option<Arc<str>>,
    decl: Option<CompilationUnitDecl>,
}

impl CompilationUnit {
    pub fn new(
        file_name: &str,
        origin: SourceOrigin,
        result: CompilationResult,
        source: Option<Arc<str>>,
        decl: Option<CompilationUnitDecl>,
    ) -> Self {
        let state = if decl.is_some() {
            UnitState::Parsed
        } else {
            UnitState::Unparsed
        };
        Self {
            file_name: file_name.to_string(),
            origin,
            ordinal: result.unit_index(),
            result,
            state,
            source,
            decl,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn origin(&self) -> SourceOrigin {
        self.origin
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn set_ordinal(&mut self, ordinal: usize) {
        self.ordinal = ordinal;
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn set_state(&mut self, state: UnitState) {
        self.state = state;
    }

    pub fn has_syntax_error(&self) -> bool {
        self.result.has_syntax_error()
    }

    pub fn has_errors(&self) -> bool {
        self.result.has_errors()
    }

    /// Dotted package name, `None` for the default package
    pub fn package_name(&self) -> Option<String> {
        self.decl
            .as_ref()
            .and_then(|d| d.package.as_ref())
            .map(|p| p.name.clone())
            .or_else(|| self.result.package_name().map(|tokens| tokens.join(".")))
    }

    pub fn result(&self) -> &CompilationResult {
        &self.result
    }

    pub fn result_mut(&mut self) -> &mut CompilationResult {
        &mut self.result
    }

    pub fn source(&self) -> Option<&Arc<str>> {
        self.source.as_ref()
    }

    pub fn decl(&self) -> Option<&CompilationUnitDecl> {
        self.decl.as_ref()
    }

    pub fn decl_mut(&mut self) -> Option<&mut CompilationUnitDecl> {
        self.decl.as_mut()
    }

    /// Both the tree and the source buffer at once
    pub fn decl_and_source_mut(&mut self) -> (Option<&mut CompilationUnitDecl>, Option<&Arc<str>>) {
        (self.decl.as_mut(), self.source.as_ref())
    }

    /// Release the syntax tree and source buffer; diagnostics are kept
    pub fn cleanup(&mut self) {
        self.decl = None;
        self.source = None;
        self.state = UnitState::CleanedUp;
    }

    /// Tag the result as accepted and return it
    pub fn mark_accepted(&mut self) -> &CompilationResult {
        self.state = UnitState::Accepted;
        self.result.tag_as_accepted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_problem_limit_keeps_first_error() {
        let mut result = CompilationResult::new("A.java", 0, 1, 2);
        result.record(Problem::warning(codes::front_end::DUPLICATE_MEMBER, "w1", None));
        result.record(Problem::warning(codes::front_end::DUPLICATE_MEMBER, "w2", None));
        result.record(Problem::error(codes::front_end::DUPLICATE_TYPE, "e1", None));

        assert!(result.has_errors());
        assert_eq!(result.problems().len(), 2);
        assert_eq!(result.problem_count(), 3);
    }

    #[test]
    fn test_syntax_error_flags_result() {
        let mut result = CompilationResult::new("A.java", 0, 1, 10);
        assert!(!result.has_syntax_error());
        result.record_syntax_error("expected ';'", None);
        assert!(result.has_syntax_error());
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_cleanup_releases_tree_and_keeps_diagnostics() {
        let mut result = CompilationResult::new("A.java", 3, 4, 10);
        result.set_line_separator_positions(vec![4, 9]);
        let mut unit = CompilationUnit::new(
            "A.java",
            SourceOrigin::Requested,
            result,
            Some(Arc::from("class A {}\n")),
            Some(CompilationUnitDecl::default()),
        );
        assert_eq!(unit.state(), UnitState::Parsed);
        assert_eq!(unit.ordinal(), 3);

        unit.cleanup();
        assert!(unit.decl().is_none());
        assert!(unit.source().is_none());
        assert_eq!(unit.result().line_separator_positions().len(), 2);

        assert!(unit.mark_accepted().is_accepted());
        assert_eq!(unit.state(), UnitState::Accepted);
    }

    #[test]
    fn test_source_unit_reads_file_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "class A {{}}").unwrap();
        let name = file.path().display().to_string();

        let mut source = SourceUnit::from_path(&name, SourceOrigin::Requested);
        assert!(!source.is_loaded());
        assert_eq!(&*source.contents(1024).unwrap(), "class A {}");
        assert!(source.is_loaded());

        source.release();
        assert!(!source.is_loaded());
    }

    #[test]
    fn test_source_unit_limits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "class LongName {{}}").unwrap();
        let name = file.path().display().to_string();

        let mut source = SourceUnit::from_path(&name, SourceOrigin::Requested);
        assert!(matches!(
            source.contents(4),
            Err(SourceReadError::TooLarge { limit: 4, .. })
        ));

        let mut missing = SourceUnit::from_path("does/not/Exist.java", SourceOrigin::Requested);
        assert!(matches!(missing.contents(1024), Err(SourceReadError::Io { .. })));
    }
}
