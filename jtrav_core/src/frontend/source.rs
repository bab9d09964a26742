//! Outline front end over `.java` sources
//!
//! Parses with the outline parser, keeps a batch-wide type index and pulls
//! sources referenced through imports or supertypes in from the sourcepath.
//! There is no type checking: the only diagnostics are syntax errors,
//! unresolved imports, duplicate types and members, and public types living
//! in a file with another name.

use super::ast::{CompilationUnitDecl, ImportDecl, MemberDecl, TypeDecl};
use super::environment::{self, LookupEnvironment, TypeBinding};
use super::options::CompilerOptions;
use super::parser::{self, SyntaxError};
use super::unit::{
    CompilationResult, CompilationUnit, Problem, SourceOrigin, SourceUnit, UnitState,
};
use super::FrontEnd;
use crate::config::compile_time::front_end::MAX_SOURCE_FILE_SIZE;
use crate::config::ConfigError;
use crate::logging::codes;
use crate::registry::BatchRegistry;
use crate::utils::Span;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Something a unit refers to by name
#[derive(Debug, Clone)]
struct Reference {
    /// Written name, used in diagnostics
    name: String,
    /// Qualified names that satisfy the reference, most specific first
    candidates: Vec<String>,
    /// Set for on-demand imports, which may name a package
    package: Option<String>,
    span: Span,
    is_import: bool,
}

#[derive(Debug)]
pub struct SourceFrontEnd {
    options: CompilerOptions,
    environment: LookupEnvironment,
    global_error_count: usize,
    max_source_file_size: u64,
}

impl Default for SourceFrontEnd {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFrontEnd {
    pub fn new() -> Self {
        Self {
            options: CompilerOptions::default(),
            environment: LookupEnvironment::new(),
            global_error_count: 0,
            max_source_file_size: MAX_SOURCE_FILE_SIZE,
        }
    }

    pub fn with_max_source_file_size(mut self, limit: u64) -> Self {
        self.max_source_file_size = limit;
        self
    }

    pub fn environment(&self) -> &LookupEnvironment {
        &self.environment
    }

    /// First sourcepath file that may declare `qualified_name`
    ///
    /// Longer paths are tried first so that `p.C.Inner` finds `p/C/Inner.java`
    /// before `p/C.java`.
    pub fn find_on_sourcepath(&self, qualified_name: &str) -> Option<PathBuf> {
        let parts: Vec<&str> = qualified_name.split('.').collect();
        for root in &self.options.sourcepath {
            for len in (1..=parts.len()).rev() {
                let mut path = root.clone();
                for part in &parts[..len - 1] {
                    path.push(part);
                }
                path.push(format!("{}.java", parts[len - 1]));
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }

    fn package_on_sourcepath(&self, package: &str) -> bool {
        self.options.sourcepath.iter().any(|root| {
            let mut path = root.clone();
            for part in package.split('.') {
                path.push(part);
            }
            path.is_dir()
        })
    }

    /// Parse, bind and append a sourcepath file; false when it is already in the batch
    fn load_closure_unit(&mut self, path: &Path, registry: &mut BatchRegistry) -> bool {
        let file_name = path.display().to_string();
        if registry.contains_file(&file_name) {
            return false;
        }

        let mut source = SourceUnit::from_path(&file_name, SourceOrigin::Closure);
        let result = CompilationResult::new(
            &file_name,
            registry.len(),
            registry.len() + 1,
            self.options.max_problems_per_unit,
        );
        let mut unit = self.parse(&mut source, result, true);
        self.build_type_bindings(&mut unit);

        crate::log_debug!("Closure unit added from sourcepath",
            "file" => &file_name,
            "ordinal" => registry.len()
        );

        registry.add_compilation_unit(unit).is_some()
    }

    fn resolve(&mut self, reference: &Reference, registry: &mut BatchRegistry) -> bool {
        if reference
            .candidates
            .iter()
            .any(|c| self.environment.is_known_type(c))
        {
            return true;
        }

        if let Some(package) = &reference.package {
            if self.environment.is_known_package(package) || self.package_on_sourcepath(package)
            {
                return true;
            }
        }

        for candidate in &reference.candidates {
            if let Some(path) = self.find_on_sourcepath(candidate) {
                self.load_closure_unit(&path, registry);
                if self.environment.is_known_type(candidate) {
                    return true;
                }
            }
        }
        false
    }
}

impl FrontEnd for SourceFrontEnd {
    fn configure(&mut self, args: &[String]) -> Result<Vec<SourceUnit>, ConfigError> {
        self.options = CompilerOptions::parse(args)?;
        self.environment.clear();
        self.global_error_count = 0;

        Ok(self
            .options
            .files
            .iter()
            .map(|file| SourceUnit::from_path(file, SourceOrigin::Requested))
            .collect())
    }

    fn options(&self) -> &CompilerOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut CompilerOptions {
        &mut self.options
    }

    fn parse(
        &mut self,
        source: &mut SourceUnit,
        mut result: CompilationResult,
        diet: bool,
    ) -> CompilationUnit {
        let contents = match source.contents(self.max_source_file_size) {
            Ok(contents) => contents,
            Err(error) => {
                self.global_error_count += 1;
                crate::log_error!(error.error_code(), &error.to_string(),
                    "file" => source.file_name()
                );
                return CompilationUnit::new(
                    source.file_name(),
                    source.origin(),
                    result,
                    None,
                    None,
                );
            }
        };

        let parsed = parser::parse_compilation_unit(&contents, diet);
        result.set_line_separator_positions(parsed.line_separators);
        record_syntax_errors(&mut result, parsed.errors);
        if let Some(package) = &parsed.decl.package {
            result.record_package_name(package.tokens());
        }

        CompilationUnit::new(
            source.file_name(),
            source.origin(),
            result,
            Some(contents),
            Some(parsed.decl),
        )
    }

    fn build_type_bindings(&mut self, unit: &mut CompilationUnit) {
        let file_name = unit.file_name().to_string();
        let Some(decl) = unit.decl() else {
            return;
        };

        let mut problems = Vec::new();
        for (qualified_name, span) in environment::declared_types(decl) {
            let binding = TypeBinding {
                qualified_name: qualified_name.clone(),
                file_name: file_name.clone(),
                span,
            };
            if let Err(existing) = self.environment.define_type(binding) {
                problems.push(Problem::error(
                    codes::front_end::DUPLICATE_TYPE,
                    &format!(
                        "The type {} is already defined in {}",
                        qualified_name, existing.file_name
                    ),
                    Some(span),
                ));
            }
        }

        for problem in problems {
            unit.result_mut().record(problem);
        }
        unit.set_state(UnitState::Bound);
    }

    fn complete_type_bindings(&mut self, registry: &mut BatchRegistry) {
        let mut index = 0;
        // Closure units are appended while iterating; re-read the length each time
        while index < registry.len() {
            let references = match registry.get(index).and_then(|u| u.decl()) {
                Some(decl) => collect_references(decl),
                None => {
                    index += 1;
                    continue;
                }
            };

            let mut problems = Vec::new();
            for reference in &references {
                if self.resolve(reference, registry) {
                    continue;
                }
                if reference.is_import
                    && !environment::is_platform_name(&reference.name)
                    && self.options.classpath.is_empty()
                {
                    problems.push(Problem::error(
                        codes::front_end::UNRESOLVED_IMPORT,
                        &format!("The import {} cannot be resolved", reference.name),
                        Some(reference.span),
                    ));
                }
            }

            if let Some(unit) = registry.get_mut(index) {
                for problem in problems {
                    unit.result_mut().record(problem);
                }
            }
            index += 1;
        }
    }

    fn process(&mut self, unit: &mut CompilationUnit, index: usize) {
        let file_name = unit.file_name().to_string();
        let stem = Path::new(&file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let syntax_errors = match unit.decl_and_source_mut() {
            (Some(decl), Some(source)) => parser::parse_deferred_bodies(decl, source),
            _ => Vec::new(),
        };
        record_syntax_errors(unit.result_mut(), syntax_errors);

        let mut problems = Vec::new();
        if let Some(decl) = unit.decl() {
            check_public_types(decl, &stem, &mut problems);
            check_duplicate_members(decl, &mut problems);
        }
        for problem in problems {
            unit.result_mut().record(problem);
        }

        crate::log_success!(codes::success::UNIT_PROCESSED, "Unit processed",
            "file" => &file_name,
            "index" => index,
            "errors" => unit.result().error_count()
        );
    }

    fn global_error_count(&self) -> usize {
        self.global_error_count
    }
}

fn record_syntax_errors(result: &mut CompilationResult, errors: Vec<SyntaxError>) {
    for error in errors {
        result.record_syntax_error(&error.to_string(), Some(error.span()));
    }
}

fn collect_references(decl: &CompilationUnitDecl) -> Vec<Reference> {
    let package = decl.package.as_ref().map(|p| p.name.as_str());
    let mut references: Vec<Reference> = decl.imports.iter().map(import_reference).collect();

    let single_imports: Vec<&ImportDecl> = decl
        .imports
        .iter()
        .filter(|i| !i.on_demand && !i.is_static)
        .collect();
    let on_demand: Vec<&str> = decl
        .imports
        .iter()
        .filter(|i| i.on_demand && !i.is_static)
        .map(|i| i.name.as_str())
        .collect();

    let mut seen = HashSet::new();
    for ty in decl.all_types() {
        for written in supertypes(ty) {
            let name = strip_type_arguments(written);
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }

            let mut candidates = Vec::new();
            if let Some((head, _)) = name.split_once('.') {
                candidates.push(name.clone());
                candidates.push(environment::qualify(package, &name));
                if let Some(import) = single_imports
                    .iter()
                    .find(|i| i.simple_name() == Some(head))
                {
                    candidates.push(format!("{}{}", import.name, &name[head.len()..]));
                }
            } else {
                candidates.push(environment::qualify(package, &name));
                candidates.extend(
                    single_imports
                        .iter()
                        .filter(|i| i.simple_name() == Some(name.as_str()))
                        .map(|i| i.name.clone()),
                );
                candidates.extend(on_demand.iter().map(|p| format!("{}.{}", p, name)));
            }

            references.push(Reference {
                name,
                candidates,
                package: None,
                span: ty.span,
                is_import: false,
            });
        }
    }
    references
}

fn import_reference(import: &ImportDecl) -> Reference {
    let (candidates, package) = match (import.is_static, import.on_demand) {
        // `import static p.C.m;` needs the type `p.C`
        (true, false) => (vec![import.qualifier().to_string()], None),
        (true, true) => (vec![import.name.clone()], None),
        (false, false) => (vec![import.name.clone()], None),
        (false, true) => (vec![import.name.clone()], Some(import.name.clone())),
    };
    Reference {
        name: import.name.clone(),
        candidates,
        package,
        span: import.span,
        is_import: true,
    }
}

fn supertypes(ty: &TypeDecl) -> impl Iterator<Item = &str> {
    ty.superclass
        .iter()
        .chain(ty.interfaces.iter())
        .map(String::as_str)
}

fn strip_type_arguments(written: &str) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for ch in written.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && !c.is_whitespace() && c != '[' && c != ']' => out.push(c),
            _ => {}
        }
    }
    out
}

fn check_public_types(decl: &CompilationUnitDecl, stem: &str, problems: &mut Vec<Problem>) {
    for ty in decl.types.iter().filter(|t| t.is_public() && t.name != stem) {
        problems.push(Problem::error(
            codes::front_end::PUBLIC_TYPE_FILE_MISMATCH,
            &format!("The public type {} must be defined in its own file", ty.name),
            Some(ty.span),
        ));
    }
}

fn check_duplicate_members(decl: &CompilationUnitDecl, problems: &mut Vec<Problem>) {
    for ty in decl.all_types() {
        let mut fields = HashSet::new();
        let mut methods = HashSet::new();
        for member in &ty.members {
            match member {
                MemberDecl::Field(field) => {
                    for variable in &field.variables {
                        if !fields.insert(variable.name.as_str()) {
                            problems.push(Problem::error(
                                codes::front_end::DUPLICATE_MEMBER,
                                &format!("Duplicate field {}.{}", ty.name, variable.name),
                                Some(variable.span),
                            ));
                        }
                    }
                }
                MemberDecl::Method(method) => {
                    if !methods.insert(method.signature_key()) {
                        problems.push(Problem::error(
                            codes::front_end::DUPLICATE_MEMBER,
                            &format!(
                                "Duplicate method {} in type {}",
                                method.signature_key(),
                                ty.name
                            ),
                            Some(method.span),
                        ));
                    }
                }
                _ => {}
            }
        }
    }
}
