//! One traversal batch from command line to accepted results
//!
//! filter -> driver -> global error gate -> processor -> bridge -> cleanup.
//! Everything that must survive between batches lives in the [`Session`];
//! a batch that fails before translation leaves it untouched apart from
//! the verbosity level.

mod error;
mod outcome;

pub use error::PipelineError;
pub use outcome::PipelineOutcome;

use crate::bridge::{AstBuilder, TranslationBridge};
use crate::config::FrontEndPreferences;
use crate::driver::{Disposition, FrontEndDriver};
use crate::filter::{filter_command_line, FilterConfig};
use crate::frontend::{FrontEnd, UnitState};
use crate::logging::codes;
use crate::processor;
use crate::session::Session;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Knobs for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub filter: FilterConfig,
    pub front_end: FrontEndPreferences,
}

/// Compile the batch the arguments describe and translate the requested units
pub fn run<F, B>(
    front_end: &mut F,
    builder: &mut B,
    session: &mut Session,
    args: &[String],
    config: &PipelineConfig,
) -> Result<PipelineOutcome, PipelineError>
where
    F: FrontEnd + ?Sized,
    B: AstBuilder + ?Sized,
{
    let started_at = Utc::now();

    let args = filter_command_line(args, session, &config.filter).map_err(|e| {
        crate::log_error!(e.error_code(), &e.to_string());
        e
    })?;
    let mut driver = FrontEndDriver::generate_ast(front_end, &args, &config.front_end)
        .map_err(|e| {
            crate::log_error!(e.error_code(), &e.to_string());
            e
        })?;

    if driver.global_error_count() > 0 {
        let error = PipelineError::GlobalErrors {
            count: driver.global_error_count(),
        };
        crate::log_error!(error.error_code(), &error.to_string(),
            "count" => driver.global_error_count()
        );
        return Err(error);
    }

    let requested = driver.requested_files().clone();
    let selected = processor::process_batch(front_end, driver.registry_mut(), session, |file| {
        builder
            .is_specified_source_file(file)
            .unwrap_or_else(|| requested.contains(file))
    })
    .map_err(|e| {
        crate::log_error!(e.error_code(), &e.to_string(),
            "file" => &e.file_name,
            "errors" => e.error_count
        );
        PipelineError::from(e)
    })?;

    builder.begin_batch()?;
    let batch = session.begin_batch();

    let selected_files: Vec<String> = selected
        .iter()
        .filter_map(|&i| driver.registry().get(i))
        .map(|u| u.file_name().to_string())
        .collect();
    crate::log_info!("Units selected for translation",
        "batch" => batch,
        "previously_processed" => session.processed_count(),
        "selected" => selected_files.len()
    );

    let level = driver.language_level();
    let verbosity = session.verbosity();
    let translation = TranslationBridge::new(&mut *builder, session.conflicts_mut(), verbosity)
        .translate(driver.registry_mut().selected_mut(&selected), level);
    let report = match translation {
        Ok(report) => report,
        Err(linkage) => {
            // Only units the builder received in full count as handled
            for unit in driver.registry().iter() {
                if unit.state() == UnitState::Translated {
                    session.mark_processed(unit.file_name());
                }
            }
            session.set_error();
            return Err(linkage.into());
        }
    };
    for file in &selected_files {
        session.mark_processed(file);
    }
    if report.has_failures() {
        session.set_error();
    }

    let failed: HashSet<&str> = report.failures.iter().map(|f| f.file_name()).collect();
    let mut skipped = Vec::new();
    let (registry, stats, requestor) = driver.batch_parts();
    for index in 0..registry.len() {
        let Some(mut unit) = registry.take(index) else {
            continue;
        };
        let disposition = if unit.state() == UnitState::Translated {
            Disposition::Translated
        } else if failed.contains(unit.file_name()) {
            Disposition::Failed
        } else {
            skipped.push(unit.file_name().to_string());
            Disposition::Skipped
        };

        unit.cleanup();
        stats.line_count += unit.result().line_separator_positions().len();
        requestor.accept_result(unit.mark_accepted(), disposition);
        stats.units_accepted += 1;
    }

    crate::log_success!(codes::success::BATCH_ACCEPTED, "Batch accepted",
        "batch" => batch,
        "units" => driver.stats().units_accepted,
        "lines" => driver.stats().line_count
    );

    if let Err(error) = builder.end_batch() {
        session.set_error();
        return Err(error.into());
    }

    Ok(PipelineOutcome {
        started_at,
        language_level: level,
        selected: selected_files,
        translated: report.translated,
        failures: report.failures,
        skipped,
        stats: driver.stats().clone(),
        accepted: driver.requestor_mut().take_accepted(),
        processed_total: session.processed_count(),
        error_occurred: session.has_error(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::FailingBuilder;
    use crate::bridge::MemoryAstBuilder;
    use crate::frontend::SourceFrontEnd;
    use assert_matches::assert_matches;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, contents: &str) -> String {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            filter: FilterConfig::default(),
            front_end: FrontEndPreferences {
                use_single_thread: true,
                read_threads: 1,
                parse_threshold: 10,
            },
        }
    }

    fn two_units(dir: &Path) -> Vec<String> {
        vec![
            write(dir, "A.java", "package p;\nclass C {\n  int f() { return 1; }\n}\n"),
            write(dir, "B.java", "class B {\n  void g() {}\n}\n"),
        ]
    }

    #[test]
    fn test_two_units_are_translated() {
        let dir = TempDir::new().unwrap();
        let args = two_units(dir.path());
        let mut front_end = SourceFrontEnd::new();
        let mut builder = MemoryAstBuilder::new();
        let mut session = Session::new();

        let outcome = run(&mut front_end, &mut builder, &mut session, &args, &config()).unwrap();

        assert_eq!(outcome.translated, args);
        assert_eq!(outcome.selected, args);
        assert!(outcome.skipped.is_empty());
        assert!(!outcome.error_occurred);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(builder.units().len(), 2);
        assert_eq!(builder.batches_started(), 1);
        assert_eq!(builder.batches_completed(), 1);
        assert_eq!(outcome.stats.units_accepted, 2);
        assert_eq!(outcome.stats.line_count, 7);
        assert!(outcome
            .accepted
            .iter()
            .all(|r| r.disposition == Disposition::Translated));
        assert!(session.has_conflict(&args[0], "q", "C"));
    }

    #[test]
    fn test_syntax_error_stops_before_translation() {
        let dir = TempDir::new().unwrap();
        let args = vec![
            write(dir.path(), "A.java", "class A { void m( }"),
            write(dir.path(), "B.java", "class B {}"),
        ];
        let mut front_end = SourceFrontEnd::new();
        let mut builder = MemoryAstBuilder::new();
        let mut session = Session::new();

        let error = run(&mut front_end, &mut builder, &mut session, &args, &config()).unwrap_err();

        assert_matches!(&error, PipelineError::Diagnostics(e) if e.has_syntax_error);
        assert_eq!(error.exit_code(), 1);
        assert!(builder.units().is_empty());
        assert_eq!(builder.batches_started(), 0);
        assert_eq!(builder.batches_completed(), 0);
        assert!(!session.is_processed(&args[1]));
    }

    #[test]
    fn test_batch_rejected_by_a_later_unit_can_be_retried() {
        let dir = TempDir::new().unwrap();
        let args = vec![
            write(dir.path(), "A.java", "class A { int f() { return 1; } }"),
            write(dir.path(), "B.java", "class B { void m( }"),
        ];
        let mut front_end = SourceFrontEnd::new();
        let mut builder = MemoryAstBuilder::new();
        let mut session = Session::new();

        let error = run(&mut front_end, &mut builder, &mut session, &args, &config()).unwrap_err();
        assert_matches!(&error, PipelineError::Diagnostics(e) if e.file_name == args[1]);
        assert!(!session.is_processed(&args[0]));
        assert_eq!(session.processed_count(), 0);
        assert_eq!(session.batches_run(), 0);
        assert_eq!(builder.batches_started(), builder.batches_completed());

        write(dir.path(), "B.java", "class B { void m() {} }");
        let retry = run(&mut front_end, &mut builder, &mut session, &args, &config()).unwrap();

        assert_eq!(retry.translated, args);
        assert!(retry.skipped.is_empty());
        assert_eq!(retry.processed_total, 2);
        assert_eq!(builder.units().len(), 2);
        assert_eq!(builder.batches_started(), 1);
        assert_eq!(builder.batches_completed(), 1);
    }

    #[test]
    fn test_missing_file_trips_the_global_gate() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("Missing.java").display().to_string();
        let mut builder = MemoryAstBuilder::new();
        let mut session = Session::new();

        let error = run(
            &mut SourceFrontEnd::new(),
            &mut builder,
            &mut session,
            &[missing],
            &config(),
        )
        .unwrap_err();

        assert_matches!(error, PipelineError::GlobalErrors { count: 1 });
        assert_eq!(builder.batches_started(), 0);
    }

    #[test]
    fn test_second_invocation_translates_nothing_new() {
        let dir = TempDir::new().unwrap();
        let args = two_units(dir.path());
        let mut front_end = SourceFrontEnd::new();
        let mut builder = MemoryAstBuilder::new();
        let mut session = Session::new();

        run(&mut front_end, &mut builder, &mut session, &args, &config()).unwrap();
        let second = run(&mut front_end, &mut builder, &mut session, &args, &config()).unwrap();

        assert!(second.selected.is_empty());
        assert_eq!(second.skipped, args);
        assert_eq!(second.processed_total, 2);
        assert_eq!(builder.units().len(), 2);
        assert_eq!(session.batches_run(), 2);
        assert_eq!(
            second.batch_report(),
            "Total units processed: 2; In this iteration, the following 0 units will be processed:"
        );
    }

    #[test]
    fn test_closure_units_are_accepted_but_not_translated() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("src");
        let a = write(&root, "p/A.java", "package p; import q.Helper; public class A {}");
        let helper = write(&root, "q/Helper.java", "package q; public class Helper { void h() {} }");
        let args = vec!["-sourcepath".to_string(), root.display().to_string(), a.clone()];
        let mut builder = MemoryAstBuilder::new();
        let mut session = Session::new();

        let outcome = run(
            &mut SourceFrontEnd::new(),
            &mut builder,
            &mut session,
            &args,
            &config(),
        )
        .unwrap();

        assert_eq!(outcome.translated, vec![a]);
        assert_eq!(outcome.skipped, vec![helper.clone()]);
        assert_eq!(outcome.accepted.len(), 2);
        assert!(!session.is_processed(&helper));
    }

    #[test]
    fn test_translation_failure_sets_the_error_flag() {
        let dir = TempDir::new().unwrap();
        let args = two_units(dir.path());
        let mut builder = FailingBuilder::new(&args[0], false);
        let mut session = Session::new();

        let outcome = run(
            &mut SourceFrontEnd::new(),
            &mut builder,
            &mut session,
            &args,
            &config(),
        )
        .unwrap();

        assert_eq!(outcome.translated, vec![args[1].clone()]);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.error_occurred);
        assert!(session.has_error());
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(outcome.accepted[0].disposition, Disposition::Failed);
        assert_eq!(builder.inner.batches_completed(), 1);
    }

    #[test]
    fn test_linkage_failure_skips_end_batch() {
        let dir = TempDir::new().unwrap();
        let args = two_units(dir.path());
        let mut builder = FailingBuilder::new(&args[1], true);
        let mut session = Session::new();

        let error = run(
            &mut SourceFrontEnd::new(),
            &mut builder,
            &mut session,
            &args,
            &config(),
        )
        .unwrap_err();

        assert_matches!(error, PipelineError::Linkage(_));
        assert!(session.has_error());
        assert_eq!(builder.inner.batches_completed(), 0);
        assert!(session.is_processed(&args[0]));
        assert!(!session.is_processed(&args[1]));
        assert_eq!(session.processed_count(), 1);
    }

    #[test]
    fn test_verbosity_flag_is_filtered() {
        let dir = TempDir::new().unwrap();
        let mut args = two_units(dir.path());
        args.insert(0, "--verbose=3".to_string());
        let mut session = Session::new();

        let outcome = run(
            &mut SourceFrontEnd::new(),
            &mut MemoryAstBuilder::new(),
            &mut session,
            &args,
            &config(),
        )
        .unwrap();

        assert_eq!(session.verbosity(), 3);
        assert_eq!(outcome.translated.len(), 2);
    }
}
