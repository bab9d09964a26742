//! Java front end: the seam the driver talks to and its outline implementation

pub mod ast;
pub mod environment;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod read_manager;
pub mod source;
pub mod unit;

pub use ast::CompilationUnitDecl;
pub use options::{CompilerOptions, LanguageLevel};
pub use read_manager::ReadManager;
pub use source::SourceFrontEnd;
pub use unit::{
    CompilationResult, CompilationUnit, Problem, SourceOrigin, SourceReadError, SourceUnit,
    UnitState,
};

use crate::config::ConfigError;
use crate::registry::BatchRegistry;

/// Operations the driver and the unit processor need from a Java front end
pub trait FrontEnd {
    /// Parse the command line and return the requested sources in order
    fn configure(&mut self, args: &[String]) -> Result<Vec<SourceUnit>, ConfigError>;

    fn options(&self) -> &CompilerOptions;

    fn options_mut(&mut self) -> &mut CompilerOptions;

    /// Parse one source; a diet parse leaves method bodies for `process`
    fn parse(&mut self, source: &mut SourceUnit, result: CompilationResult, diet: bool)
        -> CompilationUnit;

    /// Enter the unit's types into the lookup environment
    fn build_type_bindings(&mut self, unit: &mut CompilationUnit);

    /// Resolve imports across the batch, appending closure units as they are found
    fn complete_type_bindings(&mut self, registry: &mut BatchRegistry);

    /// Deferred processing of one unit: bodies and per-unit checks
    fn process(&mut self, unit: &mut CompilationUnit, index: usize);

    /// Errors not attributable to a parsed unit
    fn global_error_count(&self) -> usize;
}
