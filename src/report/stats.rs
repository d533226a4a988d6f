//! Summary arithmetic for a finished run.
//!
//! This module aggregates suites into the totals printed in the
//! `## SUMMARY` block.

use crate::types::TestSuite;

/// Aggregated counts over every suite of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
    pub passed_suites: usize,
    pub failed_suites: usize,
}

impl RunTotals {
    /// Sum up test and suite counts.
    ///
    /// A suite counts as failed only when one of its tests failed; setup or
    /// teardown errors alone do not move it out of the passed column.
    pub fn from_suites(suites: &[TestSuite]) -> Self {
        let mut totals = RunTotals::default();

        for suite in suites {
            totals.total += suite.tests.len();
            totals.passed += suite.passed_count();
            totals.failed += suite.failed_count();
            totals.skipped += suite.skipped_count();
            totals.pending += suite.pending_count();

            if suite.failed_count() > 0 {
                totals.failed_suites += 1;
            } else {
                totals.passed_suites += 1;
            }
        }

        totals
    }

    /// `failed / total * 100`, or `None` for an empty run
    pub fn failure_rate(&self) -> Option<f64> {
        if self.total == 0 { None } else { Some(self.failed as f64 / self.total as f64 * 100.0) }
    }

    /// `"(3 passed, 1 failed)"`, omitting zero-valued components
    pub fn breakdown(&self) -> Option<String> {
        let parts: Vec<String> = [(self.passed, "passed"), (self.failed, "failed"), (self.skipped, "skipped")]
            .iter()
            .filter(|(count, _)| *count > 0)
            .map(|(count, label)| format!("{} {}", count, label))
            .collect();

        if parts.is_empty() { None } else { Some(format!("({})", parts.join(", "))) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorInfo, TestResult, TestStatus};

    fn suite_with(statuses: &[TestStatus]) -> TestSuite {
        let mut suite = TestSuite::new("s", "s.py");
        for (i, status) in statuses.iter().enumerate() {
            suite.push(TestResult {
                name: format!("t{}", i),
                full_name: format!("t{}", i),
                status: *status,
                duration_seconds: 0.0,
                line_number: None,
                error: None,
            });
        }
        suite
    }

    #[test]
    fn test_empty_totals() {
        let totals = RunTotals::from_suites(&[]);
        assert_eq!(totals, RunTotals::default());
        assert_eq!(totals.failure_rate(), None);
        assert_eq!(totals.breakdown(), None);
    }

    #[test]
    fn test_counts_and_breakdown() {
        let suites = vec![
            suite_with(&[TestStatus::Passed, TestStatus::Failed]),
            suite_with(&[TestStatus::Passed, TestStatus::Skipped, TestStatus::Pending]),
        ];
        let totals = RunTotals::from_suites(&suites);

        assert_eq!(totals.total, 5);
        assert_eq!(totals.passed + totals.failed + totals.skipped + totals.pending, totals.total);
        assert_eq!(totals.passed_suites, 1);
        assert_eq!(totals.failed_suites, 1);
        assert_eq!(totals.breakdown().as_deref(), Some("(2 passed, 1 failed, 1 skipped)"));
        assert_eq!(totals.failure_rate(), Some(20.0));
    }

    #[test]
    fn test_setup_error_does_not_fail_suite_count() {
        let mut suite = suite_with(&[TestStatus::Passed]);
        suite.setup_error = Some(ErrorInfo::new("RuntimeError", "db down"));
        let totals = RunTotals::from_suites(&[suite]);

        assert_eq!(totals.passed_suites, 1);
        assert_eq!(totals.failed_suites, 0);
    }

    #[test]
    fn test_breakdown_omits_zero_components() {
        let totals = RunTotals::from_suites(&[suite_with(&[TestStatus::Passed])]);
        assert_eq!(totals.breakdown().as_deref(), Some("(1 passed)"));
    }
}
