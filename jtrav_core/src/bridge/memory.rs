//! In-process foreign AST, serialisable to JSON

use super::{AstBuilder, BuilderError};
use crate::frontend::ast::{
    EnumConstantDecl, Expression, FieldDecl, ImportDecl, InitializerDecl, MethodDecl,
    PackageDecl, Statement, StatementKind, TypeDecl,
};
use crate::frontend::LanguageLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignNode {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<ForeignNode>,
}

impl ForeignNode {
    pub fn new(kind: &str, name: Option<&str>) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.map(str::to_string),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Depth-first count of this node and its descendants
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ForeignNode::node_count).sum::<usize>()
    }

    pub fn find_child(&self, kind: &str, name: &str) -> Option<&ForeignNode> {
        self.children
            .iter()
            .find(|c| c.kind == kind && c.name.as_deref() == Some(name))
    }
}

/// Builder that keeps every translated unit in memory
#[derive(Debug, Default)]
pub struct MemoryAstBuilder {
    units: Vec<ForeignNode>,
    stack: Vec<ForeignNode>,
    batches_started: usize,
    batches_completed: usize,
}

impl MemoryAstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units(&self) -> &[ForeignNode] {
        &self.units
    }

    pub fn take_units(&mut self) -> Vec<ForeignNode> {
        std::mem::take(&mut self.units)
    }

    pub fn batches_started(&self) -> usize {
        self.batches_started
    }

    pub fn batches_completed(&self) -> usize {
        self.batches_completed
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.units)
    }

    fn open(&mut self, node: ForeignNode) -> Result<(), BuilderError> {
        if self.stack.is_empty() && node.kind != "compilation_unit" {
            return Err(BuilderError::rejected(&node.kind, "no open compilation unit"));
        }
        self.stack.push(node);
        Ok(())
    }

    fn close(&mut self, kind: &str) -> Result<ForeignNode, BuilderError> {
        match self.stack.pop() {
            Some(node) if node.kind == kind => Ok(node),
            Some(node) => Err(BuilderError::rejected(
                kind,
                &format!("innermost open node is {}", node.kind),
            )),
            None => Err(BuilderError::rejected(kind, "nothing to close")),
        }
    }

    fn close_into_parent(&mut self, kind: &str) -> Result<(), BuilderError> {
        let node = self.close(kind)?;
        self.leaf(node)
    }

    fn leaf(&mut self, node: ForeignNode) -> Result<(), BuilderError> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(node);
                Ok(())
            }
            None => Err(BuilderError::rejected(&node.kind, "no open compilation unit")),
        }
    }
}

impl AstBuilder for MemoryAstBuilder {
    fn begin_batch(&mut self) -> Result<(), BuilderError> {
        self.batches_started += 1;
        Ok(())
    }

    fn end_batch(&mut self) -> Result<(), BuilderError> {
        if !self.stack.is_empty() {
            return Err(BuilderError::rejected("batch", "a unit is still open"));
        }
        self.batches_completed += 1;
        Ok(())
    }

    fn abort_compilation_unit(&mut self, _file_name: &str) {
        self.stack.clear();
    }

    fn enter_compilation_unit(
        &mut self,
        file_name: &str,
        package: Option<&str>,
        level: LanguageLevel,
    ) -> Result<(), BuilderError> {
        if !self.stack.is_empty() {
            return Err(BuilderError::rejected("compilation_unit", "previous unit still open"));
        }
        let mut node =
            ForeignNode::new("compilation_unit", Some(file_name)).with_attribute("level", level.tag());
        if let Some(package) = package {
            node = node.with_attribute("package", package);
        }
        self.open(node)
    }

    fn leave_compilation_unit(&mut self, file_name: &str) -> Result<(), BuilderError> {
        let node = self.close("compilation_unit")?;
        if node.name.as_deref() != Some(file_name) {
            return Err(BuilderError::rejected("compilation_unit", "file name mismatch"));
        }
        self.units.push(node);
        Ok(())
    }

    fn package(&mut self, decl: &PackageDecl) -> Result<(), BuilderError> {
        self.leaf(ForeignNode::new("package", Some(&decl.name)))
    }

    fn import(&mut self, decl: &ImportDecl) -> Result<(), BuilderError> {
        let mut node = ForeignNode::new("import", Some(&decl.name));
        if decl.is_static {
            node = node.with_attribute("static", "true");
        }
        if decl.on_demand {
            node = node.with_attribute("on_demand", "true");
        }
        self.leaf(node)
    }

    fn enter_type(&mut self, decl: &TypeDecl) -> Result<(), BuilderError> {
        let mut node = ForeignNode::new(decl.kind.as_str(), Some(&decl.name));
        if !decl.modifiers.is_empty() {
            node = node.with_attribute("modifiers", decl.modifiers.join(" "));
        }
        if let Some(params) = &decl.type_parameters {
            node = node.with_attribute("type_parameters", params.as_str());
        }
        if let Some(superclass) = &decl.superclass {
            node = node.with_attribute("extends", superclass.as_str());
        }
        if !decl.interfaces.is_empty() {
            node = node.with_attribute("implements", decl.interfaces.join(", "));
        }
        self.open(node)
    }

    fn leave_type(&mut self, _name: &str) -> Result<(), BuilderError> {
        let kind = self
            .stack
            .last()
            .map(|n| n.kind.clone())
            .unwrap_or_default();
        if !matches!(kind.as_str(), "class" | "interface" | "enum" | "annotation") {
            return Err(BuilderError::rejected("type", "innermost open node is not a type"));
        }
        self.close_into_parent(&kind)
    }

    fn field(&mut self, decl: &FieldDecl) -> Result<(), BuilderError> {
        for variable in &decl.variables {
            let mut node = ForeignNode::new("field", Some(&variable.name))
                .with_attribute("type", decl.type_name.as_str());
            if !decl.modifiers.is_empty() {
                node = node.with_attribute("modifiers", decl.modifiers.join(" "));
            }
            if let Some(init) = &variable.initializer {
                node.children.push(expression_node(init));
            }
            self.leaf(node)?;
        }
        Ok(())
    }

    fn enum_constant(&mut self, decl: &EnumConstantDecl) -> Result<(), BuilderError> {
        let mut node = ForeignNode::new("enum_constant", Some(&decl.name));
        node.children = decl.arguments.iter().map(expression_node).collect();
        self.leaf(node)
    }

    fn enter_method(&mut self, decl: &MethodDecl) -> Result<(), BuilderError> {
        let kind = if decl.is_constructor() {
            "constructor"
        } else {
            "method"
        };
        let mut node = ForeignNode::new(kind, Some(&decl.name));
        if let Some(return_type) = &decl.return_type {
            node = node.with_attribute("returns", return_type.as_str());
        }
        if !decl.modifiers.is_empty() {
            node = node.with_attribute("modifiers", decl.modifiers.join(" "));
        }
        if !decl.throws.is_empty() {
            node = node.with_attribute("throws", decl.throws.join(", "));
        }
        for parameter in &decl.parameters {
            let mut param = ForeignNode::new("parameter", Some(&parameter.name))
                .with_attribute("type", parameter.type_name.as_str());
            if parameter.varargs {
                param = param.with_attribute("varargs", "true");
            }
            node.children.push(param);
        }
        self.open(node)
    }

    fn leave_method(&mut self, _name: &str) -> Result<(), BuilderError> {
        let kind = match self.stack.last().map(|n| n.kind.as_str()) {
            Some("constructor") => "constructor",
            _ => "method",
        };
        self.close_into_parent(kind)
    }

    fn enter_initializer(&mut self, decl: &InitializerDecl) -> Result<(), BuilderError> {
        let node = ForeignNode::new("initializer", None)
            .with_attribute("static", decl.is_static.to_string());
        self.open(node)
    }

    fn leave_initializer(&mut self) -> Result<(), BuilderError> {
        self.close_into_parent("initializer")
    }

    fn enter_statement(&mut self, statement: &Statement) -> Result<(), BuilderError> {
        let node = ForeignNode::new(statement.kind.as_str(), statement.label.as_deref())
            .with_attribute("line", statement.span.start.line.to_string());
        self.open(node)
    }

    fn leave_statement(&mut self, kind: StatementKind) -> Result<(), BuilderError> {
        self.close_into_parent(kind.as_str())
    }

    fn expression(&mut self, expression: &Expression) -> Result<(), BuilderError> {
        self.leaf(expression_node(expression))
    }
}

fn expression_node(expression: &Expression) -> ForeignNode {
    ForeignNode::new(expression.kind.as_str(), None).with_attribute("text", expression.text.as_str())
}
