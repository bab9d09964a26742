//! Which simple type names each translated file has in scope

use crate::frontend::ast::CompilationUnitDecl;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
struct FileScope {
    package: String,
    /// Top-level types declared by the file
    declared: HashSet<String>,
    /// Single-type imports: simple name to qualifier
    imported: HashMap<String, String>,
}

/// Per-file scopes recorded as units are translated
#[derive(Debug, Clone, Default)]
pub struct ConflictIndex {
    files: HashMap<String, FileScope>,
}

impl ConflictIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_unit(&mut self, file_name: &str, decl: &CompilationUnitDecl) {
        let scope = FileScope {
            package: decl
                .package
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            declared: decl.types.iter().map(|t| t.name.clone()).collect(),
            imported: decl
                .imports
                .iter()
                .filter(|i| !i.is_static && !i.on_demand)
                .filter_map(|i| {
                    i.simple_name()
                        .map(|simple| (simple.to_string(), i.qualifier().to_string()))
                })
                .collect(),
        };
        self.files.insert(file_name.to_string(), scope);
    }

    pub fn contains_file(&self, file_name: &str) -> bool {
        self.files.contains_key(file_name)
    }

    /// Whether `file` sees a type named `class_name` other than `package_name.class_name`
    pub fn has_conflict(&self, file_name: &str, package_name: &str, class_name: &str) -> bool {
        let Some(scope) = self.files.get(file_name) else {
            return false;
        };

        if scope.declared.contains(class_name) && scope.package != package_name {
            return true;
        }

        scope
            .imported
            .get(class_name)
            .is_some_and(|qualifier| qualifier != package_name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse_compilation_unit;

    fn index_with(file: &str, source: &str) -> ConflictIndex {
        let mut index = ConflictIndex::new();
        index.record_unit(file, &parse_compilation_unit(source, true).decl);
        index
    }

    #[test]
    fn test_declared_type_conflicts_with_other_package() {
        let index = index_with("A.java", "package p; class C {} class D {}");
        assert!(index.has_conflict("A.java", "q", "C"));
        assert!(!index.has_conflict("A.java", "p", "C"));
        assert!(!index.has_conflict("A.java", "q", "E"));
    }

    #[test]
    fn test_imported_type_conflicts() {
        let index = index_with("A.java", "import r.List; import java.util.*; class A {}");
        assert!(index.has_conflict("A.java", "java.util", "List"));
        assert!(!index.has_conflict("A.java", "r", "List"));
        assert!(!index.has_conflict("A.java", "java.util", "Map"));
    }

    #[test]
    fn test_unknown_file_has_no_conflicts() {
        let index = index_with("A.java", "package p; class C {}");
        assert!(!index.has_conflict("B.java", "q", "C"));
    }

    #[test]
    fn test_answers_do_not_depend_on_recording_order() {
        let a = "package p; class C {}";
        let b = "import p.C; class B {}";

        let mut first = ConflictIndex::new();
        first.record_unit("A.java", &parse_compilation_unit(a, true).decl);
        first.record_unit("B.java", &parse_compilation_unit(b, true).decl);

        let mut second = ConflictIndex::new();
        second.record_unit("B.java", &parse_compilation_unit(b, true).decl);
        second.record_unit("A.java", &parse_compilation_unit(a, true).decl);

        for (file, package, class) in [("A.java", "q", "C"), ("B.java", "q", "C"), ("B.java", "p", "C")] {
            assert_eq!(
                first.has_conflict(file, package, class),
                second.has_conflict(file, package, class)
            );
        }
    }
}
