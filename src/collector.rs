/// Raw event collection and error enrichment
///
/// This module handles:
/// - Bucketing raw events into suites, keeping first-seen suite order
/// - Turning a raw failure into a diagnosed `ErrorInfo`
/// - Routing setup/teardown failures onto the suite instead of a test
use crate::classify::{extract_values, generate_fix_hint, infer_error_kind};
use crate::code_context::{extract_context, find_failing_line, trim_traceback};
use crate::config::{OutputMode, ReporterConfig};
use crate::types::{ErrorInfo, RawEvent, TestPhase, TestResult, TestStatus, TestSuite};
use log::debug;
use std::collections::HashMap;
use std::path::Path;

/// Message used when a failed test reports no message at all
pub const MISSING_MESSAGE: &str = "Test failed";

/// Which optional enrichment steps run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOptions {
    pub code_context: bool,
    pub stack_trace_lines: usize,
}

impl EnrichOptions {
    pub fn from_config(config: &ReporterConfig) -> Self {
        Self { code_context: config.mode == OutputMode::Detailed, stack_trace_lines: config.stack_trace_lines }
    }
}

/// Build the diagnosed error for a failed event.
///
/// Steps run in a fixed order: kind inference, value extraction, failing line
/// and code context, stack trace, then the fix hint (which sees the values).
/// Returns the error together with the failing line when one was found.
pub fn build_error(event: &RawEvent, options: EnrichOptions) -> (ErrorInfo, Option<u32>) {
    let message = event.raw_error_message.as_deref().map(str::trim).filter(|m| !m.is_empty());

    let mut error = match message {
        Some(message) => {
            let kind = event
                .raw_error_kind
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| k.to_string())
                .unwrap_or_else(|| infer_error_kind(message));
            ErrorInfo::new(kind, message)
        }
        None => ErrorInfo::new("Error", MISSING_MESSAGE),
    };

    error.values = extract_values(&error.message);

    let traceback = event.raw_traceback.as_deref().unwrap_or("");
    let line = event.line_number.or_else(|| find_failing_line(traceback, &event.suite_path));

    if options.code_context
        && let Some(line) = line
    {
        error.code_context = extract_context(Path::new(&event.suite_path), line as usize);
    }

    error.stack_trace = trim_traceback(traceback, options.stack_trace_lines);
    error.fix_hint = Some(generate_fix_hint(&error));

    (error, line)
}

/// Groups raw events into suites in the order their suite was first seen
#[derive(Debug)]
pub struct SuiteCollector {
    options: EnrichOptions,
    suites: Vec<TestSuite>,
    index: HashMap<String, usize>,
}

impl SuiteCollector {
    pub fn new(options: EnrichOptions) -> Self {
        Self { options, suites: Vec::new(), index: HashMap::new() }
    }

    /// Add one event to its suite, creating the suite on first sight
    pub fn record(&mut self, event: RawEvent) {
        let options = self.options;
        let suite = self.suite_for(&event);

        match event.phase {
            TestPhase::Setup | TestPhase::Teardown => {
                if event.status != TestStatus::Failed {
                    return;
                }
                let (error, _) = build_error(&event, options);
                debug!("{:?} failure in suite {}: {}", event.phase, suite.file_path, error.message);
                if event.phase == TestPhase::Setup {
                    suite.setup_error = Some(error);
                } else {
                    suite.teardown_error = Some(error);
                }
            }
            TestPhase::Call => {
                let (error, line_number) = if event.status == TestStatus::Failed {
                    let (error, line) = build_error(&event, options);
                    (Some(error), line)
                } else {
                    (None, event.line_number)
                };

                suite.push(TestResult {
                    name: event.test_name.clone(),
                    full_name: event.display_name().to_string(),
                    status: event.status,
                    duration_seconds: event.duration_seconds.max(0.0),
                    line_number,
                    error,
                });
            }
        }
    }

    fn suite_for(&mut self, event: &RawEvent) -> &mut TestSuite {
        let position = match self.index.get(&event.suite_path) {
            Some(&position) => position,
            None => {
                let name = event
                    .suite_name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| suite_name_from_path(&event.suite_path));
                debug!("New suite {} ({})", name, event.suite_path);
                self.suites.push(TestSuite::new(name, event.suite_path.clone()));
                self.index.insert(event.suite_path.clone(), self.suites.len() - 1);
                self.suites.len() - 1
            }
        };
        &mut self.suites[position]
    }

    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Hand over every collected suite, leaving the collector empty
    pub fn drain(&mut self) -> Vec<TestSuite> {
        self.index.clear();
        std::mem::take(&mut self.suites)
    }
}

/// `tests/test_math.py` → `test_math`
pub fn suite_name_from_path(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(path)
        .to_string()
}
