//! Type index shared by every unit of a batch

use super::ast::{CompilationUnitDecl, MemberDecl, TypeDecl};
use crate::utils::Span;
use std::collections::{HashMap, HashSet};

/// A type declared somewhere in the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBinding {
    pub qualified_name: String,
    pub file_name: String,
    pub span: Span,
}

/// Qualified names of every type a unit declares, nested types included
pub fn declared_types(decl: &CompilationUnitDecl) -> Vec<(String, Span)> {
    let package = decl.package.as_ref().map(|p| p.name.as_str());
    let mut out = Vec::new();
    for ty in &decl.types {
        collect_declared(ty, &qualify(package, &ty.name), &mut out);
    }
    out
}

fn collect_declared(ty: &TypeDecl, qualified: &str, out: &mut Vec<(String, Span)>) {
    out.push((qualified.to_string(), ty.span));
    for member in &ty.members {
        if let MemberDecl::Type(nested) = member {
            collect_declared(nested, &format!("{}.{}", qualified, nested.name), out);
        }
    }
}

/// `package.simple`, or just `simple` in the default package
pub fn qualify(package: Option<&str>, simple: &str) -> String {
    match package {
        Some(p) if !p.is_empty() => format!("{}.{}", p, simple),
        _ => simple.to_string(),
    }
}

/// Packages provided by the platform and never looked up on the sourcepath
pub fn is_platform_name(name: &str) -> bool {
    ["java.", "javax.", "jdk.", "sun.", "com.sun.", "org.w3c.", "org.xml."]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

#[derive(Debug, Default)]
pub struct LookupEnvironment {
    types: HashMap<String, TypeBinding>,
    packages: HashSet<String>,
}

impl LookupEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type; returns the earlier binding when the name is taken
    pub fn define_type(&mut self, binding: TypeBinding) -> Result<(), TypeBinding> {
        if let Some(existing) = self.types.get(&binding.qualified_name) {
            return Err(existing.clone());
        }
        if let Some((package, _)) = binding.qualified_name.rsplit_once('.') {
            self.packages.insert(package.to_string());
        }
        self.types.insert(binding.qualified_name.clone(), binding);
        Ok(())
    }

    pub fn get_type(&self, qualified_name: &str) -> Option<&TypeBinding> {
        self.types.get(qualified_name)
    }

    pub fn is_known_type(&self, qualified_name: &str) -> bool {
        self.types.contains_key(qualified_name)
    }

    pub fn is_known_package(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn clear(&mut self) {
        self.types.clear();
        self.packages.clear();
    }
}
