//! Front-end driver: configures the front end and builds the batch
//!
//! Phase one parses and binds the requested sources in command line order,
//! switching to diet parsing past the parse threshold. Phase two completes
//! bindings over the whole registry, which may append closure units.

use crate::config::compile_time::front_end::{MAX_SOURCE_FILE_SIZE, READ_MANAGER_THRESHOLD};
use crate::config::{ConfigError, FrontEndPreferences};
use crate::frontend::{
    CompilationResult, FrontEnd, LanguageLevel, ReadManager, SourceOrigin, SourceUnit,
};
use crate::logging::codes;
use crate::registry::BatchRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Front-end bookkeeping for one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerStats {
    pub parse_time: Duration,
    pub resolve_time: Duration,
    pub line_count: usize,
    pub units_accepted: usize,
}

/// What happened to a unit by the time it was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Translated,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedResult {
    pub file_name: String,
    pub disposition: Disposition,
    pub problem_count: usize,
    pub line_count: usize,
}

/// Receives every unit result once the batch is done with it
#[derive(Debug, Default)]
pub struct BatchRequestor {
    accepted: Vec<AcceptedResult>,
}

impl BatchRequestor {
    pub fn accept_result(&mut self, result: &CompilationResult, disposition: Disposition) {
        self.accepted.push(AcceptedResult {
            file_name: result.file_name().to_string(),
            disposition,
            problem_count: result.problem_count(),
            line_count: result.line_separator_positions().len(),
        });
    }

    pub fn accepted(&self) -> &[AcceptedResult] {
        &self.accepted
    }

    pub fn take_accepted(&mut self) -> Vec<AcceptedResult> {
        std::mem::take(&mut self.accepted)
    }
}

/// Handle on a compiled batch
#[derive(Debug)]
pub struct FrontEndDriver {
    language_level: LanguageLevel,
    registry: BatchRegistry,
    requested: HashSet<String>,
    stats: CompilerStats,
    requestor: BatchRequestor,
    global_error_count: usize,
}

impl FrontEndDriver {
    /// Configure the front end and compile the batch the arguments describe
    pub fn generate_ast<F: FrontEnd + ?Sized>(
        front_end: &mut F,
        args: &[String],
        preferences: &FrontEndPreferences,
    ) -> Result<Self, ConfigError> {
        let mut sources = front_end.configure(args)?;

        let options = front_end.options_mut();
        options.perform_statements_recovery = false;
        options.generate_class_files = false;
        let language_level = options.source_level;

        crate::log_success!(codes::success::FRONT_END_CONFIGURED, "Front end configured",
            "sources" => sources.len(),
            "source_level" => language_level
        );

        let mut driver = Self {
            language_level,
            registry: BatchRegistry::new(sources.len()),
            requested: sources
                .iter()
                .filter(|s| s.origin() == SourceOrigin::Requested)
                .map(|s| s.file_name().to_string())
                .collect(),
            stats: CompilerStats::default(),
            requestor: BatchRequestor::default(),
            global_error_count: 0,
        };

        driver.internal_begin_to_compile(front_end, &mut sources, preferences);
        driver.global_error_count = front_end.global_error_count();
        Ok(driver)
    }

    /// Parse and bind the sources, then complete bindings across the batch
    pub fn internal_begin_to_compile<F: FrontEnd + ?Sized>(
        &mut self,
        front_end: &mut F,
        sources: &mut [SourceUnit],
        preferences: &FrontEndPreferences,
    ) {
        let max_units = sources.len();

        if !preferences.use_single_thread && max_units >= READ_MANAGER_THRESHOLD {
            let loaded = ReadManager::new(preferences.effective_read_threads())
                .prefetch(sources, MAX_SOURCE_FILE_SIZE);
            if loaded < max_units {
                crate::log_warning!("Some sources could not be prefetched",
                    "loaded" => loaded,
                    "requested" => max_units
                );
            }
        }

        for (index, source) in sources.iter_mut().enumerate() {
            let result = CompilationResult::new(
                source.file_name(),
                index,
                max_units,
                front_end.options().max_problems_per_unit,
            );
            let diet = self.registry.len() >= preferences.parse_threshold;

            let parse_start = Instant::now();
            let mut unit = front_end.parse(source, result, diet);
            self.stats.parse_time += parse_start.elapsed();

            let bind_start = Instant::now();
            front_end.build_type_bindings(&mut unit);
            self.stats.resolve_time += bind_start.elapsed();

            if let Some(tokens) = unit
                .decl()
                .and_then(|d| d.package.as_ref())
                .map(|p| p.tokens())
            {
                unit.result_mut().record_package_name(tokens);
            }

            self.registry.add_compilation_unit(unit);
            source.release();
        }

        let resolve_start = Instant::now();
        front_end.complete_type_bindings(&mut self.registry);
        self.stats.resolve_time += resolve_start.elapsed();

        crate::log_success!(codes::success::BATCH_COMPILED, "Batch compiled",
            "requested" => max_units,
            "total_units" => self.registry.len(),
            "parse_ms" => self.stats.parse_time.as_millis(),
            "resolve_ms" => self.stats.resolve_time.as_millis()
        );
    }

    pub fn language_level(&self) -> LanguageLevel {
        self.language_level
    }

    pub fn global_error_count(&self) -> usize {
        self.global_error_count
    }

    pub fn registry(&self) -> &BatchRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BatchRegistry {
        &mut self.registry
    }

    /// Whether the file was named on the command line
    pub fn is_requested(&self, file_name: &str) -> bool {
        self.requested.contains(file_name)
    }

    pub fn requested_files(&self) -> &HashSet<String> {
        &self.requested
    }

    pub fn stats(&self) -> &CompilerStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut CompilerStats {
        &mut self.stats
    }

    pub fn requestor_mut(&mut self) -> &mut BatchRequestor {
        &mut self.requestor
    }

    pub fn accepted_results(&self) -> &[AcceptedResult] {
        self.requestor.accepted()
    }

    /// Registry, stats and requestor at once, for the cleanup pass
    pub fn batch_parts(&mut self) -> (&mut BatchRegistry, &mut CompilerStats, &mut BatchRequestor) {
        (&mut self.registry, &mut self.stats, &mut self.requestor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{CompilationUnit, CompilerOptions, UnitState};
    use assert_matches::assert_matches;

    /// Front end that records calls and appends one closure unit per batch
    #[derive(Default)]
    struct ScriptedFrontEnd {
        options: CompilerOptions,
        diet_flags: Vec<bool>,
        completions: usize,
        closure: Option<String>,
        bind_delay: Duration,
    }

    impl FrontEnd for ScriptedFrontEnd {
        fn configure(&mut self, args: &[String]) -> Result<Vec<SourceUnit>, ConfigError> {
            self.options = CompilerOptions::parse(args)?;
            Ok(self
                .options
                .files
                .iter()
                .map(|f| SourceUnit::with_contents(f, "class X {}", SourceOrigin::Requested))
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
            result: CompilationResult,
            diet: bool,
        ) -> CompilationUnit {
            self.diet_flags.push(diet);
            CompilationUnit::new(source.file_name(), source.origin(), result, None, None)
        }
        fn build_type_bindings(&mut self, unit: &mut CompilationUnit) {
            std::thread::sleep(self.bind_delay);
            unit.set_state(UnitState::Bound);
        }
        fn complete_type_bindings(&mut self, registry: &mut BatchRegistry) {
            self.completions += 1;
            if let Some(name) = &self.closure {
                registry.add_compilation_unit(CompilationUnit::new(
                    name,
                    SourceOrigin::Closure,
                    CompilationResult::new(name, registry.len(), 0, 10),
                    None,
                    None,
                ));
            }
        }
        fn process(&mut self, _unit: &mut CompilationUnit, _index: usize) {}
        fn global_error_count(&self) -> usize {
            0
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_generate_ast_builds_registry_in_order() {
        let mut front_end = ScriptedFrontEnd {
            closure: Some("lib/Dep.java".to_string()),
            ..Default::default()
        };
        let preferences = FrontEndPreferences {
            use_single_thread: true,
            read_threads: 1,
            parse_threshold: 2,
        };

        let driver = FrontEndDriver::generate_ast(
            &mut front_end,
            &args(&["-source", "1.6", "A.java", "B.java", "C.java"]),
            &preferences,
        )
        .unwrap();

        let names: Vec<_> = driver.registry().iter().map(|u| u.file_name()).collect();
        assert_eq!(names, vec!["A.java", "B.java", "C.java", "lib/Dep.java"]);
        assert_eq!(front_end.diet_flags, vec![false, false, true]);
        assert_eq!(front_end.completions, 1);
        assert!(driver.is_requested("B.java"));
        assert!(!driver.is_requested("lib/Dep.java"));
        assert_eq!(driver.language_level(), LanguageLevel::Jdk1_6);
        assert_eq!(driver.registry().capacity(), 6);

        assert!(!front_end.options.perform_statements_recovery);
        assert!(!front_end.options.generate_class_files);
    }

    #[test]
    fn test_binding_time_counts_as_resolve_time() {
        let delay = Duration::from_millis(15);
        let mut front_end = ScriptedFrontEnd {
            bind_delay: delay,
            ..Default::default()
        };
        let preferences = FrontEndPreferences {
            use_single_thread: true,
            ..FrontEndPreferences::default()
        };

        let driver =
            FrontEndDriver::generate_ast(&mut front_end, &args(&["A.java", "B.java"]), &preferences)
                .unwrap();

        let stats = driver.stats();
        assert!(stats.resolve_time >= delay * 2);
        assert!(stats.parse_time < stats.resolve_time);
    }

    #[test]
    fn test_configuration_errors_propagate() {
        let mut front_end = ScriptedFrontEnd::default();
        assert_matches!(
            FrontEndDriver::generate_ast(
                &mut front_end,
                &args(&["-bogus"]),
                &FrontEndPreferences::default()
            ),
            Err(ConfigError::UnknownOption { .. })
        );
    }

    #[test]
    fn test_requestor_records_results() {
        let mut requestor = BatchRequestor::default();
        let mut result = CompilationResult::new("A.java", 0, 1, 10);
        result.set_line_separator_positions(vec![3, 9]);
        requestor.accept_result(result.tag_as_accepted(), Disposition::Translated);

        assert_eq!(
            requestor.accepted(),
            &[AcceptedResult {
                file_name: "A.java".to_string(),
                disposition: Disposition::Translated,
                problem_count: 0,
                line_count: 2,
            }]
        );
    }
}
