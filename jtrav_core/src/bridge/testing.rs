//! Builders for exercising failure paths

use super::{AstBuilder, BuilderError, MemoryAstBuilder};
use crate::frontend::ast::{
    EnumConstantDecl, Expression, FieldDecl, ImportDecl, InitializerDecl, MethodDecl,
    PackageDecl, Statement, StatementKind, TypeDecl,
};
use crate::frontend::LanguageLevel;

/// Wraps the memory builder and fails on one entry point for one file
pub(crate) struct FailingBuilder {
    pub(crate) inner: MemoryAstBuilder,
    fail_file: String,
    linkage: bool,
    current: String,
}

impl FailingBuilder {
    pub(crate) fn new(fail_file: &str, linkage: bool) -> Self {
        Self {
            inner: MemoryAstBuilder::new(),
            fail_file: fail_file.to_string(),
            linkage,
            current: String::new(),
        }
    }
}

impl AstBuilder for FailingBuilder {
    fn begin_batch(&mut self) -> Result<(), BuilderError> {
        self.inner.begin_batch()
    }
    fn end_batch(&mut self) -> Result<(), BuilderError> {
        self.inner.end_batch()
    }
    fn abort_compilation_unit(&mut self, file_name: &str) {
        self.inner.abort_compilation_unit(file_name)
    }
    fn enter_compilation_unit(
        &mut self,
        file_name: &str,
        package: Option<&str>,
        level: LanguageLevel,
    ) -> Result<(), BuilderError> {
        self.current = file_name.to_string();
        self.inner.enter_compilation_unit(file_name, package, level)
    }
    fn leave_compilation_unit(&mut self, file_name: &str) -> Result<(), BuilderError> {
        self.inner.leave_compilation_unit(file_name)
    }
    fn package(&mut self, decl: &PackageDecl) -> Result<(), BuilderError> {
        self.inner.package(decl)
    }
    fn import(&mut self, decl: &ImportDecl) -> Result<(), BuilderError> {
        self.inner.import(decl)
    }
    fn enter_type(&mut self, decl: &TypeDecl) -> Result<(), BuilderError> {
        self.inner.enter_type(decl)
    }
    fn leave_type(&mut self, name: &str) -> Result<(), BuilderError> {
        self.inner.leave_type(name)
    }
    fn field(&mut self, decl: &FieldDecl) -> Result<(), BuilderError> {
        self.inner.field(decl)
    }
    fn enum_constant(&mut self, decl: &EnumConstantDecl) -> Result<(), BuilderError> {
        self.inner.enum_constant(decl)
    }
    fn enter_method(&mut self, decl: &MethodDecl) -> Result<(), BuilderError> {
        if self.current == self.fail_file {
            return Err(if self.linkage {
                BuilderError::Linkage {
                    entry_point: "enter_method".to_string(),
                }
            } else {
                BuilderError::rejected("method", "unsupported")
            });
        }
        self.inner.enter_method(decl)
    }
    fn leave_method(&mut self, name: &str) -> Result<(), BuilderError> {
        self.inner.leave_method(name)
    }
    fn enter_initializer(&mut self, decl: &InitializerDecl) -> Result<(), BuilderError> {
        self.inner.enter_initializer(decl)
    }
    fn leave_initializer(&mut self) -> Result<(), BuilderError> {
        self.inner.leave_initializer()
    }
    fn enter_statement(&mut self, statement: &Statement) -> Result<(), BuilderError> {
        self.inner.enter_statement(statement)
    }
    fn leave_statement(&mut self, kind: StatementKind) -> Result<(), BuilderError> {
        self.inner.leave_statement(kind)
    }
    fn expression(&mut self, expression: &Expression) -> Result<(), BuilderError> {
        self.inner.expression(expression)
    }
}
