//! Translation of processed units into a foreign AST
//!
//! The foreign side is reached only through [`AstBuilder`] events. A unit is
//! always walked completely; when the builder rejects an event the partial
//! unit is aborted so the consumer never keeps a half-built tree.

pub mod conflicts;
pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use conflicts::ConflictIndex;
pub use memory::{ForeignNode, MemoryAstBuilder};

use crate::frontend::ast::{
    Body, EnumConstantDecl, Expression, FieldDecl, ImportDecl, InitializerDecl, MemberDecl,
    MethodDecl, PackageDecl, Statement, StatementKind, TypeDecl,
};
use crate::frontend::{CompilationUnit, LanguageLevel, UnitState};
use crate::logging::{self, codes, Code};
use std::path::PathBuf;

/// Failure reported by a builder event
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    #[error("builder rejected {node}: {message}")]
    Rejected { node: String, message: String },

    #[error("builder entry point '{entry_point}' is unavailable")]
    Linkage { entry_point: String },
}

impl BuilderError {
    pub fn rejected(node: &str, message: &str) -> Self {
        Self::Rejected {
            node: node.to_string(),
            message: message.to_string(),
        }
    }
}

/// Foreign AST node constructors
pub trait AstBuilder {
    fn begin_batch(&mut self) -> Result<(), BuilderError> {
        Ok(())
    }

    fn end_batch(&mut self) -> Result<(), BuilderError> {
        Ok(())
    }

    /// Whether the host asked for `file_name`; `None` defers to the command line
    fn is_specified_source_file(&mut self, _file_name: &str) -> Option<bool> {
        None
    }

    /// Discard whatever was built for a unit that failed half way
    fn abort_compilation_unit(&mut self, _file_name: &str) {}

    fn enter_compilation_unit(
        &mut self,
        file_name: &str,
        package: Option<&str>,
        level: LanguageLevel,
    ) -> Result<(), BuilderError>;

    fn leave_compilation_unit(&mut self, file_name: &str) -> Result<(), BuilderError>;

    fn package(&mut self, decl: &PackageDecl) -> Result<(), BuilderError>;

    fn import(&mut self, decl: &ImportDecl) -> Result<(), BuilderError>;

    fn enter_type(&mut self, decl: &TypeDecl) -> Result<(), BuilderError>;

    fn leave_type(&mut self, name: &str) -> Result<(), BuilderError>;

    fn field(&mut self, decl: &FieldDecl) -> Result<(), BuilderError>;

    fn enum_constant(&mut self, decl: &EnumConstantDecl) -> Result<(), BuilderError>;

    fn enter_method(&mut self, decl: &MethodDecl) -> Result<(), BuilderError>;

    fn leave_method(&mut self, name: &str) -> Result<(), BuilderError>;

    fn enter_initializer(&mut self, decl: &InitializerDecl) -> Result<(), BuilderError>;

    fn leave_initializer(&mut self) -> Result<(), BuilderError>;

    fn enter_statement(&mut self, statement: &Statement) -> Result<(), BuilderError>;

    fn leave_statement(&mut self, kind: StatementKind) -> Result<(), BuilderError>;

    fn expression(&mut self, expression: &Expression) -> Result<(), BuilderError>;
}

/// A unit could not be translated; siblings still are
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslationError {
    #[error("Failed to translate '{file_name}': {message}")]
    Rejected { file_name: String, message: String },

    #[error("Unit '{file_name}' has no syntax tree to translate")]
    MissingTree { file_name: String },

    #[error("Unit '{file_name}' still has unparsed bodies")]
    UnprocessedBodies { file_name: String },
}

impl TranslationError {
    pub fn error_code(&self) -> Code {
        codes::translation::TRANSLATION_FAILED
    }

    pub fn file_name(&self) -> &str {
        match self {
            Self::Rejected { file_name, .. }
            | Self::MissingTree { file_name }
            | Self::UnprocessedBodies { file_name } => file_name,
        }
    }
}

/// A builder entry point is missing; the batch cannot continue
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Native linkage failure at '{entry_point}' while translating '{file_name}'")]
pub struct LinkageError {
    pub entry_point: String,
    pub file_name: String,
}

impl LinkageError {
    pub fn error_code(&self) -> Code {
        codes::linkage::NATIVE_LINKAGE_FAILURE
    }

    /// What the operator should check
    pub fn guidance(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Linkage(#[from] LinkageError),
}

impl BridgeError {
    fn from_builder(error: BuilderError, file_name: &str) -> Self {
        match error {
            BuilderError::Rejected { node, message } => Self::Translation(TranslationError::Rejected {
                file_name: file_name.to_string(),
                message: format!("{}: {}", node, message),
            }),
            BuilderError::Linkage { entry_point } => Self::Linkage(LinkageError {
                entry_point,
                file_name: file_name.to_string(),
            }),
        }
    }
}

/// Outcome of translating one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationReport {
    pub translated: Vec<String>,
    pub failures: Vec<TranslationError>,
}

impl TranslationReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Per-batch walker that rebuilds units through an [`AstBuilder`]
pub struct TranslationBridge<'a, B: AstBuilder + ?Sized> {
    builder: &'a mut B,
    conflicts: &'a mut ConflictIndex,
    verbosity: u32,
}

impl<'a, B: AstBuilder + ?Sized> TranslationBridge<'a, B> {
    pub fn new(builder: &'a mut B, conflicts: &'a mut ConflictIndex, verbosity: u32) -> Self {
        Self {
            builder,
            conflicts,
            verbosity,
        }
    }

    /// Translate units in order
    ///
    /// Translation failures are logged and collected; a linkage failure
    /// stops the batch.
    pub fn translate<'u, I>(
        &mut self,
        units: I,
        level: LanguageLevel,
    ) -> Result<TranslationReport, LinkageError>
    where
        I: IntoIterator<Item = &'u mut CompilationUnit>,
    {
        let mut report = TranslationReport::default();

        for unit in units {
            let file_name = unit.file_name().to_string();
            let ordinal = unit.ordinal();

            let outcome = logging::with_file_context(PathBuf::from(&file_name), ordinal, || {
                self.translate_unit(unit, level)
            });

            match outcome {
                Ok(()) => report.translated.push(file_name),
                Err(BridgeError::Translation(error)) => {
                    crate::log_error!(error.error_code(), &error.to_string(),
                        "file" => &file_name,
                        "ordinal" => ordinal,
                        "level" => level
                    );
                    report.failures.push(error);
                }
                Err(BridgeError::Linkage(error)) => {
                    crate::log_error!(error.error_code(), &error.to_string(),
                        "file" => &file_name,
                        "entry_point" => &error.entry_point,
                        "action" => error.guidance()
                    );
                    return Err(error);
                }
            }
        }

        crate::log_success!(codes::success::BATCH_TRANSLATED, "Batch translated",
            "translated" => report.translated.len(),
            "failed" => report.failures.len()
        );

        Ok(report)
    }

    /// Emit one unit; on failure the builder discards the partial unit
    pub fn translate_unit(
        &mut self,
        unit: &mut CompilationUnit,
        level: LanguageLevel,
    ) -> Result<(), BridgeError> {
        let file_name = unit.file_name().to_string();
        let Some(decl) = unit.decl() else {
            return Err(TranslationError::MissingTree { file_name }.into());
        };
        if decl.has_unparsed_bodies() {
            return Err(TranslationError::UnprocessedBodies { file_name }.into());
        }

        let package = decl.package.as_ref().map(|p| p.name.as_str());
        if let Err(error) = self.emit_unit(&file_name, package, decl, level) {
            self.builder.abort_compilation_unit(&file_name);
            return Err(BridgeError::from_builder(error, &file_name));
        }

        self.conflicts.record_unit(&file_name, decl);
        unit.set_state(UnitState::Translated);

        if self.verbosity > 2 {
            crate::log_success!(codes::success::UNIT_TRANSLATED, "Unit translated",
                "file" => &file_name,
                "level" => level
            );
        }
        Ok(())
    }

    pub fn has_conflict(&self, file_name: &str, package_name: &str, class_name: &str) -> bool {
        self.conflicts.has_conflict(file_name, package_name, class_name)
    }

    fn emit_unit(
        &mut self,
        file_name: &str,
        package: Option<&str>,
        decl: &crate::frontend::CompilationUnitDecl,
        level: LanguageLevel,
    ) -> Result<(), BuilderError> {
        self.builder.enter_compilation_unit(file_name, package, level)?;
        if let Some(package) = &decl.package {
            self.builder.package(package)?;
        }
        for import in &decl.imports {
            self.builder.import(import)?;
        }
        for ty in &decl.types {
            self.emit_type(ty)?;
        }
        self.builder.leave_compilation_unit(file_name)
    }

    fn emit_type(&mut self, ty: &TypeDecl) -> Result<(), BuilderError> {
        self.builder.enter_type(ty)?;
        for member in &ty.members {
            match member {
                MemberDecl::Field(field) => self.builder.field(field)?,
                MemberDecl::Method(method) => {
                    self.builder.enter_method(method)?;
                    self.emit_body(&method.body)?;
                    self.builder.leave_method(&method.name)?;
                }
                MemberDecl::Initializer(initializer) => {
                    self.builder.enter_initializer(initializer)?;
                    self.emit_body(&initializer.body)?;
                    self.builder.leave_initializer()?;
                }
                MemberDecl::Type(nested) => self.emit_type(nested)?,
                MemberDecl::EnumConstant(constant) => {
                    self.builder.enum_constant(constant)?;
                    if let Some(body) = &constant.body {
                        self.emit_type(body)?;
                    }
                }
            }
        }
        self.builder.leave_type(&ty.name)
    }

    fn emit_body(&mut self, body: &Body) -> Result<(), BuilderError> {
        match body {
            Body::Parsed(block) => {
                for statement in &block.statements {
                    self.emit_statement(statement)?;
                }
                Ok(())
            }
            Body::None => Ok(()),
            Body::Unparsed(_) => Err(BuilderError::rejected("body", "body was never parsed")),
        }
    }

    fn emit_statement(&mut self, statement: &Statement) -> Result<(), BuilderError> {
        self.builder.enter_statement(statement)?;
        for expression in &statement.expressions {
            self.builder.expression(expression)?;
        }
        for child in &statement.children {
            self.emit_statement(child)?;
        }
        self.builder.leave_statement(statement.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse_compilation_unit;
    use crate::frontend::{CompilationResult, SourceOrigin};
    use super::testing::FailingBuilder;
    use assert_matches::assert_matches;

    fn unit(file: &str, source: &str) -> CompilationUnit {
        let parsed = parse_compilation_unit(source, false);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        CompilationUnit::new(
            file,
            SourceOrigin::Requested,
            CompilationResult::new(file, 0, 1, 10),
            Some(source.into()),
            Some(parsed.decl),
        )
    }

    #[test]
    fn test_translate_records_conflicts_and_state() {
        let mut units = vec![
            unit("A.java", "package p; import r.List; class C { void m() { int x = 1; } }"),
            unit("B.java", "class B {}"),
        ];
        let mut builder = MemoryAstBuilder::new();
        let mut conflicts = ConflictIndex::new();

        let report = TranslationBridge::new(&mut builder, &mut conflicts, 0)
            .translate(units.iter_mut(), LanguageLevel::Jdk1_7)
            .unwrap();

        assert_eq!(report.translated, vec!["A.java", "B.java"]);
        assert!(units.iter().all(|u| u.state() == UnitState::Translated));
        assert_eq!(builder.units().len(), 2);
        assert!(conflicts.has_conflict("A.java", "q", "C"));
        assert!(conflicts.has_conflict("A.java", "p", "List"));
    }

    #[test]
    fn test_translation_failure_does_not_stop_siblings() {
        let mut units = vec![
            unit("A.java", "class A { void m() {} }"),
            unit("B.java", "class B { void n() {} }"),
        ];
        let mut builder = FailingBuilder::new("A.java", false);
        let mut conflicts = ConflictIndex::new();

        let report = TranslationBridge::new(&mut builder, &mut conflicts, 0)
            .translate(units.iter_mut(), LanguageLevel::Jdk1_8)
            .unwrap();

        assert_eq!(report.translated, vec!["B.java"]);
        assert_matches!(&report.failures[..], [TranslationError::Rejected { file_name, .. }] if file_name == "A.java");
        assert_eq!(units[0].state(), UnitState::Parsed);
        // The partial unit was discarded
        assert_eq!(builder.inner.units().len(), 1);
        assert!(!conflicts.contains_file("A.java"));
    }

    #[test]
    fn test_linkage_failure_stops_the_batch() {
        let mut units = vec![
            unit("A.java", "class A { void m() {} }"),
            unit("B.java", "class B {}"),
        ];
        let mut builder = FailingBuilder::new("A.java", true);
        let mut conflicts = ConflictIndex::new();

        let error = TranslationBridge::new(&mut builder, &mut conflicts, 0)
            .translate(units.iter_mut(), LanguageLevel::Jdk1_8)
            .unwrap_err();

        assert_eq!(error.entry_point, "enter_method");
        assert!(!error.guidance().is_empty());
        assert!(builder.inner.units().is_empty());
        assert_ne!(units[1].state(), UnitState::Translated);
    }

    #[test]
    fn test_unprocessed_unit_is_rejected() {
        let source = "class A { void m() {} }";
        let mut diet = CompilationUnit::new(
            "A.java",
            SourceOrigin::Requested,
            CompilationResult::new("A.java", 0, 1, 10),
            Some(source.into()),
            Some(parse_compilation_unit(source, true).decl),
        );
        let mut builder = MemoryAstBuilder::new();
        let mut conflicts = ConflictIndex::new();
        let mut bridge = TranslationBridge::new(&mut builder, &mut conflicts, 0);

        assert_matches!(
            bridge.translate_unit(&mut diet, LanguageLevel::Jdk1_8),
            Err(BridgeError::Translation(TranslationError::UnprocessedBodies { .. }))
        );
    }
}
