/// Core data structures for test results
///
/// This module defines the data model shared by the classifier, the formatter
/// and the streaming session: suites, tests, diagnosed errors, and the raw
/// events handed to us by runner adapters.
use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of a single test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Pending,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
            TestStatus::Pending => "pending",
        }
    }
}

/// Expected/actual operands pulled out of an assertion message.
///
/// Kept as a pair so an `ErrorInfo` can never carry one operand without the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedValues {
    pub expected: String,
    pub actual: String,
}

/// One diagnosed failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String,    // "TypeError", "AssertionError", ...
    pub message: String, // human-readable cause
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<ExtractedValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_hint: Option<String>,
}

impl ErrorInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            values: None,
            code_context: None,
            stack_trace: None,
            fix_hint: None,
        }
    }

    pub fn expected(&self) -> Option<&str> {
        self.values.as_ref().map(|v| v.expected.as_str())
    }

    pub fn actual(&self) -> Option<&str> {
        self.values.as_ref().map(|v| v.actual.as_str())
    }
}

/// One executed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub full_name: String, // "Class > method"
    pub status: TestStatus,
    pub duration_seconds: f64,
    pub line_number: Option<u32>,
    pub error: Option<ErrorInfo>, // Some iff status == Failed
}

impl TestResult {
    pub fn is_failed(&self) -> bool {
        self.status == TestStatus::Failed
    }
}

/// A file/module grouping of tests, in execution order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    pub name: String,
    pub file_path: String,
    pub tests: Vec<TestResult>,
    pub setup_error: Option<ErrorInfo>,
    pub teardown_error: Option<ErrorInfo>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self { name: name.into(), file_path: file_path.into(), tests: Vec::new(), setup_error: None, teardown_error: None }
    }

    /// Append a test result; insertion order is execution order
    pub fn push(&mut self, test: TestResult) {
        self.tests.push(test);
    }

    /// True iff every test passed and no setup/teardown error was recorded
    pub fn passed(&self) -> bool {
        self.tests.iter().all(|t| t.status == TestStatus::Passed)
            && self.setup_error.is_none()
            && self.teardown_error.is_none()
    }

    pub fn failed_count(&self) -> usize {
        self.count(TestStatus::Failed)
    }

    pub fn passed_count(&self) -> usize {
        self.count(TestStatus::Passed)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(TestStatus::Skipped)
    }

    pub fn pending_count(&self) -> usize {
        self.count(TestStatus::Pending)
    }

    pub fn failed_tests(&self) -> impl Iterator<Item = &TestResult> {
        self.tests.iter().filter(|t| t.is_failed())
    }

    /// Any failed test or a setup/teardown error
    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0 || self.setup_error.is_some() || self.teardown_error.is_some()
    }

    fn count(&self, status: TestStatus) -> usize {
        self.tests.iter().filter(|t| t.status == status).count()
    }
}

/// Which part of a test's lifecycle an event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestPhase {
    Setup,
    #[default]
    Call,
    Teardown,
}

/// Unprocessed result handed over by a runner adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub suite_path: String,
    #[serde(default)]
    pub suite_name: Option<String>,
    pub test_name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub status: TestStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration_seconds: f64,
    #[serde(default)]
    pub line_number: Option<u32>,
    #[serde(default)]
    pub raw_error_kind: Option<String>,
    #[serde(default)]
    pub raw_error_message: Option<String>,
    #[serde(default)]
    pub raw_traceback: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phase: TestPhase,
}

impl RawEvent {
    /// Minimal event for a test in the call phase
    pub fn new(suite_path: impl Into<String>, test_name: impl Into<String>, status: TestStatus) -> Self {
        Self {
            suite_path: suite_path.into(),
            suite_name: None,
            test_name: test_name.into(),
            full_name: None,
            status,
            duration_seconds: 0.0,
            line_number: None,
            raw_error_kind: None,
            raw_error_message: None,
            raw_traceback: None,
            phase: TestPhase::Call,
        }
    }

    pub fn with_error(mut self, kind: Option<&str>, message: impl Into<String>) -> Self {
        self.raw_error_kind = kind.map(|k| k.to_string());
        self.raw_error_message = Some(message.into());
        self
    }

    /// Hierarchical name, falling back to the bare test name
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.test_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, status: TestStatus) -> TestResult {
        TestResult {
            name: name.to_string(),
            full_name: format!("Suite > {}", name),
            status,
            duration_seconds: 0.01,
            line_number: None,
            error: None,
        }
    }

    #[test]
    fn test_suite_counts() {
        let mut suite = TestSuite::new("math", "tests/math.py");
        suite.push(result("a", TestStatus::Passed));
        suite.push(result("b", TestStatus::Failed));
        suite.push(result("c", TestStatus::Skipped));
        suite.push(result("d", TestStatus::Pending));

        assert_eq!(suite.passed_count(), 1);
        assert_eq!(suite.failed_count(), 1);
        assert_eq!(suite.skipped_count(), 1);
        assert_eq!(suite.pending_count(), 1);
        assert!(suite.passed_count() + suite.failed_count() + suite.skipped_count() <= suite.tests.len());
        assert!(!suite.passed());
    }

    #[test]
    fn test_setup_error_breaks_passed() {
        let mut suite = TestSuite::new("math", "tests/math.py");
        suite.push(result("a", TestStatus::Passed));
        assert!(suite.passed());

        suite.setup_error = Some(ErrorInfo::new("RuntimeError", "fixture exploded"));
        assert!(!suite.passed());
        assert!(suite.has_failures());
        assert_eq!(suite.failed_count(), 0);
    }

    #[test]
    fn test_raw_event_deserializes_camel_case() {
        let json = r#"{"suitePath":"tests/test_x.py","testName":"test_a","fullName":"TestX > test_a","status":"failed","durationSeconds":0.5,"lineNumber":12,"rawErrorMessage":"assert 1 == 2"}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.suite_path, "tests/test_x.py");
        assert_eq!(event.status, TestStatus::Failed);
        assert_eq!(event.line_number, Some(12));
        assert_eq!(event.phase, TestPhase::Call);
        assert_eq!(event.display_name(), "TestX > test_a");
    }

    #[test]
    fn test_raw_event_accepts_null_duration_and_phase() {
        let json = r#"{"suitePath":"a.py","testName":"t","status":"failed","durationSeconds":null,"phase":null,"rawErrorMessage":"TypeError: boom"}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.status, TestStatus::Failed);
        assert_eq!(event.duration_seconds, 0.0);
        assert_eq!(event.phase, TestPhase::Call);
    }

    #[test]
    fn test_display_name_falls_back_to_test_name() {
        let event = RawEvent::new("a.js", "works", TestStatus::Passed);
        assert_eq!(event.display_name(), "works");
    }
}
