//! Cross-test failure pattern detection.
//!
//! Groups failed tests by classifier category and renders the
//! `## DETECTED PATTERNS` block appended after the numeric summary.

use super::classify;
use crate::types::{TestResult, TestSuite};
use log::debug;

/// Maximum number of member tests listed per category
const MAX_LISTED_TESTS: usize = 3;

/// A category shared by more than one failed test
#[derive(Debug, Clone, PartialEq)]
pub struct FailurePattern<'a> {
    pub category: String,
    pub tests: Vec<&'a TestResult>,
}

impl FailurePattern<'_> {
    pub fn count(&self) -> usize {
        self.tests.len()
    }
}

/// Classify every failed test's error and keep the categories seen more than once.
///
/// Groups come back in first-seen order, which makes the tie order of
/// `generate_pattern_summary` deterministic.
pub fn detect_patterns(suites: &[TestSuite]) -> Vec<FailurePattern<'_>> {
    let mut groups: Vec<FailurePattern<'_>> = Vec::new();

    for test in suites.iter().flat_map(|s| s.failed_tests()) {
        let Some(error) = test.error.as_ref() else {
            continue;
        };
        let category = classify(error);
        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.tests.push(test),
            None => groups.push(FailurePattern { category, tests: vec![test] }),
        }
    }

    groups.retain(|g| g.count() > 1);
    debug!("Detected {} failure patterns", groups.len());
    groups
}

/// Render detected patterns, most frequent first.
///
/// Returns an empty string when there is nothing to report.
pub fn generate_pattern_summary(patterns: &[FailurePattern<'_>]) -> String {
    if patterns.is_empty() {
        return String::new();
    }

    let mut ordered: Vec<&FailurePattern<'_>> = patterns.iter().collect();
    // Stable sort: equal counts keep first-seen order
    ordered.sort_by(|a, b| b.count().cmp(&a.count()));

    let mut output = String::from("\n## DETECTED PATTERNS\n");
    for pattern in ordered {
        output.push_str(&format!("- {}: {} occurrences\n", pattern.category, pattern.count()));
        for test in pattern.tests.iter().take(MAX_LISTED_TESTS) {
            output.push_str(&format!("  - {}\n", test.full_name));
        }
        if pattern.count() > MAX_LISTED_TESTS {
            output.push_str(&format!("  ... and {} more\n", pattern.count() - MAX_LISTED_TESTS));
        }
    }
    output
}
