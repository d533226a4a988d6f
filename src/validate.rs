/// Report format validation
///
/// Checks that a captured report follows the text contract downstream
/// readers rely on. Structural problems are errors. Stray runner output
/// around the report is tolerated up to a threshold, then reported as a
/// warning.
use crate::config::OutputMode;
use crate::report::HEADER_PREFIX;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Serialize;

/// Non-empty lines allowed before the header or after the report end
pub const DEFAULT_STRAY_THRESHOLD: usize = 5;

lazy_static! {
    static ref ANSI_ESCAPE: Regex = Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap();
    static ref HEADER: Regex = Regex::new(r"^# LLM TEST REPORTER - ([A-Z]+) MODE$").unwrap();
    static ref TOTAL_TESTS: Regex =
        Regex::new(r"(?m)^- TOTAL TESTS: \d+( \(\d+ \w+(, \d+ \w+)*\))?$").unwrap();
    static ref DURATION: Regex = Regex::new(r"(?m)^- DURATION: \d+\.\d{2}s$").unwrap();
    static ref EXIT_CODE: Regex = Regex::new(r"(?m)^- EXIT CODE: [01]$").unwrap();
    static ref FILE_LINE: Regex = Regex::new(r":(\d+|\?)$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    pub stray_threshold: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self { stray_threshold: DEFAULT_STRAY_THRESHOLD }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Byte span of the report inside captured output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReportSpan {
    start: usize,
    end: usize,
}

/// Lines of `text` with their byte offsets, line terminators excluded
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        (start, raw.trim_end_matches(['\n', '\r']))
    })
}

fn locate_report(text: &str) -> Option<ReportSpan> {
    let mut lines = lines_with_offsets(text);

    let start = loop {
        let (offset, line) = lines.next()?;
        if line.starts_with(HEADER_PREFIX) {
            break offset;
        }
    };
    let mut end = text.len();

    // The numeric summary ends at EXIT CODE; a pattern block may follow it
    let mut after_exit_code = false;
    let mut in_patterns = false;
    for (offset, line) in lines {
        let line_end = offset + line.len();
        if !after_exit_code {
            if line.starts_with("- EXIT CODE:") {
                after_exit_code = true;
                end = line_end;
            }
            continue;
        }

        if line == "## DETECTED PATTERNS" && !in_patterns {
            in_patterns = true;
            end = line_end;
        } else if in_patterns && (line.starts_with("- ") || line.starts_with("  ")) {
            end = line_end;
        } else if !line.trim().is_empty() {
            break;
        }
    }

    Some(ReportSpan { start, end })
}

/// Slice the report out of noisy runner output.
///
/// Runs from the header line to the end of the summary (or the pattern block
/// following it). `None` when there is no header.
pub fn extract_report(text: &str) -> Option<&str> {
    locate_report(text).map(|span| &text[span.start..span.end])
}

fn count_content_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}

/// Validate captured output against the report format
pub fn validate_report(text: &str, options: &ValidationOptions) -> ValidationReport {
    let mut result = ValidationReport::default();

    let Some(span) = locate_report(text) else {
        result.errors.push("Missing or invalid header".to_string());
        return result;
    };
    let report = &text[span.start..span.end];

    let before = count_content_lines(&text[..span.start]);
    if before > options.stray_threshold {
        result.warnings.push(format!("{} lines of stray output before the report header", before));
    }
    let after = count_content_lines(&text[span.end..]);
    if after > options.stray_threshold {
        result.warnings.push(format!("{} lines of stray output after the report", after));
    }

    let header = report.lines().next().unwrap_or_default();
    let mode = HEADER
        .captures(header)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<OutputMode>().ok());
    if mode.is_none() {
        result.errors.push(format!("Invalid header line: {}", header));
    }

    if !report.lines().any(|l| l == "## SUMMARY") {
        result.errors.push("Missing SUMMARY section".to_string());
    }
    if !TOTAL_TESTS.is_match(report) {
        result.errors.push("Missing or invalid TOTAL TESTS".to_string());
    }
    if !DURATION.is_match(report) {
        result.errors.push("Missing or invalid DURATION".to_string());
    }
    if !EXIT_CODE.is_match(report) {
        result.errors.push("Missing or invalid EXIT CODE".to_string());
    }
    if ANSI_ESCAPE.is_match(report) {
        result.errors.push("Output contains ANSI color codes".to_string());
    }

    let has_suite_counts = ["- PASSED SUITES:", "- FAILED SUITES:"]
        .iter()
        .map(|prefix| report.lines().any(|l| l.starts_with(prefix)))
        .collect::<Vec<_>>();
    match mode {
        Some(OutputMode::Summary) => {
            if has_suite_counts.iter().any(|present| !present) {
                result.errors.push("Summary mode report is missing suite counts".to_string());
            }
        }
        Some(OutputMode::Detailed) => {
            if has_suite_counts.iter().any(|present| *present) {
                result.errors.push("Detailed mode report contains suite counts".to_string());
            }
            // Suite-level error blocks carry no line number
            let mut in_test_failure = false;
            for line in report.lines() {
                if line.starts_with("## ") {
                    in_test_failure = line.starts_with("## TEST FAILURE #");
                } else if in_test_failure
                    && let Some(reference) = line.strip_prefix("FILE: ")
                    && !FILE_LINE.is_match(reference.trim())
                {
                    result.errors.push(format!("File reference missing line number: {}", reference.trim()));
                }
            }
        }
        None => {}
    }

    debug!("Validated report: {} errors, {} warnings", result.errors.len(), result.warnings.len());
    result
}
