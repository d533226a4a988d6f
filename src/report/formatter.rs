//! Text rendering of suites and run summaries.
//!
//! The formatter is a pure function of its configuration and the suites it is
//! given: rendering the same suite twice yields byte-identical text.

use super::stats::RunTotals;
use crate::config::{OutputMode, ReporterConfig};
use crate::types::{ErrorInfo, TestSuite};
use std::borrow::Cow;

/// Fixed prefix of the report's first line
pub const HEADER_PREFIX: &str = "# LLM TEST REPORTER - ";

/// Separator closing failure blocks and opening the summary
pub const SEPARATOR: &str = "---";

const ELLIPSIS: &str = "...";

/// Truncate `value` to `max_len` characters, appending `...` when cut.
///
/// Lengths count characters, not bytes, so multi-byte text is never split.
pub fn truncate_value(value: &str, max_len: usize) -> Cow<'_, str> {
    match value.char_indices().nth(max_len) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &value[..cut], ELLIPSIS)),
        None => Cow::Borrowed(value),
    }
}

/// Renders report sections according to a `ReporterConfig`
#[derive(Debug, Clone)]
pub struct ReportFormatter {
    config: ReporterConfig,
}

impl ReportFormatter {
    pub fn new(config: ReporterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// `# LLM TEST REPORTER - SUMMARY MODE` followed by a blank line
    pub fn format_header(&self) -> String {
        format!("{}{} MODE\n\n", HEADER_PREFIX, self.config.mode.as_str().to_uppercase())
    }

    /// Render one suite; empty when the mode has nothing to say about it
    pub fn format_suite(&self, suite: &TestSuite) -> String {
        match self.config.mode {
            OutputMode::Summary => self.format_suite_summary(suite),
            OutputMode::Detailed => self.format_suite_detailed(suite),
        }
    }

    fn format_suite_summary(&self, suite: &TestSuite) -> String {
        if !suite.has_failures() && !self.config.include_passed_suites {
            return String::new();
        }

        let mut output = format!("SUITE: {}\n", suite.file_path);

        if let Some(ref error) = suite.setup_error {
            output.push_str(&format!("SETUP ERROR: {}\n", self.truncate(&error.message)));
        }
        if let Some(ref error) = suite.teardown_error {
            output.push_str(&format!("TEARDOWN ERROR: {}\n", self.truncate(&error.message)));
        }

        if suite.failed_count() > 0 {
            output.push_str("FAILED TESTS:\n");
            for test in suite.failed_tests() {
                let message = match test.error {
                    Some(ref error) => self.truncate(&error.message),
                    None => Cow::Borrowed("No error message"),
                };
                output.push_str(&format!("- {}: {}\n", test.full_name, message));
            }
        } else if suite.setup_error.is_none() && suite.teardown_error.is_none() {
            output.push_str("ALL TESTS PASSED\n");
        }

        output.push('\n');
        output
    }

    fn format_suite_detailed(&self, suite: &TestSuite) -> String {
        let mut output = String::new();

        if let Some(ref error) = suite.setup_error {
            self.write_suite_error(&mut output, "SETUP ERROR", suite, error);
        }

        for (index, test) in suite.failed_tests().enumerate() {
            output.push_str(&format!("## TEST FAILURE #{}\n", index + 1));
            output.push_str(&format!("SUITE: {}\n", suite.name));
            output.push_str(&format!("TEST: {}\n", test.full_name));
            let line = test.line_number.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
            output.push_str(&format!("FILE: {}:{}\n", suite.file_path, line));

            match test.error {
                Some(ref error) => self.write_error_details(&mut output, error),
                None => {
                    output.push_str("TYPE: Unknown Error\n\n");
                    output.push_str("FAILURE REASON: No error message\n");
                }
            }

            output.push_str(&format!("\n{}\n", SEPARATOR));
        }

        if let Some(ref error) = suite.teardown_error {
            self.write_suite_error(&mut output, "TEARDOWN ERROR", suite, error);
        }

        output
    }

    fn write_suite_error(&self, output: &mut String, title: &str, suite: &TestSuite, error: &ErrorInfo) {
        output.push_str(&format!("## {}\n", title));
        output.push_str(&format!("SUITE: {}\n", suite.name));
        output.push_str(&format!("FILE: {}\n", suite.file_path));
        self.write_error_details(output, error);
        output.push_str(&format!("\n{}\n", SEPARATOR));
    }

    fn write_error_details(&self, output: &mut String, error: &ErrorInfo) {
        output.push_str(&format!("TYPE: {}\n\n", error.kind));

        if let Some(ref values) = error.values {
            output.push_str(&format!("EXPECTED: {}\n", self.truncate(&values.expected)));
            output.push_str(&format!("RECEIVED: {}\n", self.truncate(&values.actual)));
        }

        // Code context and the failure reason are never truncated
        if let Some(ref context) = error.code_context {
            output.push_str("\nCODE CONTEXT:\n");
            output.push_str(context);
            output.push('\n');
        }

        output.push_str(&format!("\nFAILURE REASON: {}\n", error.message));

        if let Some(ref hint) = error.fix_hint {
            output.push_str(&format!("FIX HINT: {}\n", hint));
        }

        if self.config.stack_trace_lines > 0
            && let Some(ref trace) = error.stack_trace
        {
            output.push_str("STACK TRACE:\n");
            for line in trace.lines().take(self.config.stack_trace_lines) {
                output.push_str(&format!("  {}\n", line));
            }
        }
    }

    /// Render the `## SUMMARY` block
    pub fn format_summary(&self, suites: &[TestSuite], duration_seconds: f64, exit_code: i32) -> String {
        let totals = RunTotals::from_suites(suites);
        let mut output = format!("{}\n## SUMMARY\n", SEPARATOR);

        if self.config.mode == OutputMode::Summary {
            output.push_str(&format!("- PASSED SUITES: {}\n", totals.passed_suites));
            output.push_str(&format!("- FAILED SUITES: {}\n", totals.failed_suites));
        }

        match totals.breakdown() {
            Some(breakdown) => output.push_str(&format!("- TOTAL TESTS: {} {}\n", totals.total, breakdown)),
            None => output.push_str(&format!("- TOTAL TESTS: {}\n", totals.total)),
        }

        if self.config.mode == OutputMode::Detailed
            && let Some(rate) = totals.failure_rate()
        {
            output.push_str(&format!("- FAILURE RATE: {:.2}%\n", rate));
        }

        output.push_str(&format!("- DURATION: {:.2}s\n", duration_seconds.max(0.0)));
        output.push_str(&format!("- EXIT CODE: {}\n", exit_code));

        output
    }

    fn truncate<'a>(&self, value: &'a str) -> Cow<'a, str> {
        truncate_value(value, self.config.max_value_length)
    }
}

#[cfg(test)]
#[path = "formatter_test.rs"]
mod formatter_test;
