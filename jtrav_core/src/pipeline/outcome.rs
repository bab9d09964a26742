use crate::bridge::TranslationError;
use crate::driver::{AcceptedResult, CompilerStats};
use crate::frontend::LanguageLevel;
use chrono::{DateTime, Utc};

/// Result of one traversal batch
#[derive(Debug)]
pub struct PipelineOutcome {
    pub started_at: DateTime<Utc>,
    pub language_level: LanguageLevel,
    /// Units handed to translation this batch, in registry order
    pub selected: Vec<String>,
    pub translated: Vec<String>,
    pub failures: Vec<TranslationError>,
    /// Closure units and units translated by an earlier batch
    pub skipped: Vec<String>,
    pub stats: CompilerStats,
    pub accepted: Vec<AcceptedResult>,
    /// Running total of units processed in this session
    pub processed_total: usize,
    pub error_occurred: bool,
}

impl PipelineOutcome {
    /// Listing of the units this batch processes
    pub fn batch_report(&self) -> String {
        let count = self.selected.len();
        let mut report = format!(
            "Total units processed: {}; In this iteration, the following {} unit{} will be processed:",
            self.processed_total,
            count,
            if count == 1 { "" } else { "s" }
        );
        for file in &self.selected {
            report.push_str("\n   ");
            report.push_str(file);
        }
        report
    }

    /// Translation failures leave the status at zero; the error flag carries them
    pub fn exit_code(&self) -> i32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(selected: &[&str], total: usize) -> PipelineOutcome {
        PipelineOutcome {
            started_at: Utc::now(),
            language_level: LanguageLevel::default(),
            selected: selected.iter().map(|s| s.to_string()).collect(),
            translated: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
            stats: CompilerStats::default(),
            accepted: Vec::new(),
            processed_total: total,
            error_occurred: false,
        }
    }

    #[test]
    fn test_batch_report_lists_selected_units() {
        assert_eq!(
            outcome(&["A.java", "B.java"], 5).batch_report(),
            "Total units processed: 5; In this iteration, the following 2 units will be processed:\n   A.java\n   B.java"
        );
    }

    #[test]
    fn test_batch_report_singular() {
        assert_eq!(
            outcome(&["A.java"], 3).batch_report(),
            "Total units processed: 3; In this iteration, the following 1 unit will be processed:\n   A.java"
        );
        assert!(outcome(&[], 0)
            .batch_report()
            .ends_with("the following 0 units will be processed:"));
    }
}
