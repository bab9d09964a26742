//! State that outlives a single batch

use crate::bridge::ConflictIndex;
use std::collections::HashSet;

/// Process-lifetime traversal state, threaded through every stage by `&mut`
#[derive(Debug, Default)]
pub struct Session {
    processed: HashSet<String>,
    processed_count: usize,
    verbosity: u32,
    error_occurred: bool,
    conflicts: ConflictIndex,
    batches: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_processed(&self, file_name: &str) -> bool {
        self.processed.contains(file_name)
    }

    /// Record a file as processed; identities are never removed
    pub fn mark_processed(&mut self, file_name: &str) -> bool {
        let inserted = self.processed.insert(file_name.to_string());
        if inserted {
            self.processed_count += 1;
        }
        inserted
    }

    /// Running total of units handed to translation
    pub fn processed_count(&self) -> usize {
        self.processed_count
    }

    pub fn processed_files(&self) -> impl Iterator<Item = &str> {
        self.processed.iter().map(String::as_str)
    }

    pub fn verbosity(&self) -> u32 {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, level: u32) {
        self.verbosity = level;
    }

    /// Detailed pipeline tracing
    pub fn is_tracing(&self) -> bool {
        self.verbosity > 2
    }

    pub fn has_error(&self) -> bool {
        self.error_occurred
    }

    /// Raise the terminal error flag; it is never cleared
    pub fn set_error(&mut self) {
        self.error_occurred = true;
    }

    pub fn conflicts(&self) -> &ConflictIndex {
        &self.conflicts
    }

    pub fn conflicts_mut(&mut self) -> &mut ConflictIndex {
        &mut self.conflicts
    }

    pub fn has_conflict(&self, file_name: &str, package_name: &str, class_name: &str) -> bool {
        self.conflicts.has_conflict(file_name, package_name, class_name)
    }

    pub fn batches_run(&self) -> usize {
        self.batches
    }

    pub(crate) fn begin_batch(&mut self) -> usize {
        self.batches += 1;
        self.batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processed_set_grows_monotonically() {
        let mut session = Session::new();
        assert!(session.mark_processed("A.java"));
        assert!(!session.mark_processed("A.java"));
        assert!(session.mark_processed("B.java"));

        assert!(session.is_processed("A.java"));
        assert_eq!(session.processed_count(), 2);
        assert_eq!(session.processed_files().count(), 2);
    }

    #[test]
    fn test_error_flag_is_sticky() {
        let mut session = Session::new();
        assert!(!session.has_error());
        session.set_error();
        session.set_verbosity(0);
        assert!(session.has_error());
    }

    #[test]
    fn test_tracing_threshold() {
        let mut session = Session::new();
        session.set_verbosity(2);
        assert!(!session.is_tracing());
        session.set_verbosity(3);
        assert!(session.is_tracing());
    }
}
