//! Expected/actual extraction and error-kind inference.

use crate::types::ExtractedValues;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

/// Which capture group holds which operand
#[derive(Debug, Clone, Copy)]
enum Operands {
    ActualThenExpected,
    ExpectedThenActual,
}

lazy_static! {
    // Ordered by how specific the phrasing is; first match wins.
    static ref VALUE_PATTERNS: Vec<(Regex, Operands)> = [
        // pytest: assert x == y
        (r"assert\s+(.+?)\s*==\s*(.+)", Operands::ActualThenExpected),
        // unittest/JUnit: Expected: x, but was: y
        (r"Expected:\s*(.+?),\s*but\s*was:\s*(.+)", Operands::ExpectedThenActual),
        // chai/jest: expected x to equal y
        (r"Expected\s+(.+?)\s+to\s+(?:equal|be)\s+(.+)", Operands::ActualThenExpected),
        // expected x, got y
        (r"expected\s+(.+?),\s*got\s+(.+)", Operands::ExpectedThenActual),
        // go testing: Expected x but got y
        (r"expected\s+(.+?)\s+but\s+got\s+(.+)", Operands::ExpectedThenActual),
        // go testing: want x, got y
        (r"want\s+(.+?),\s*got\s+(.+)", Operands::ExpectedThenActual),
    ]
    .iter()
    .filter_map(|(pattern, operands)| {
        RegexBuilder::new(pattern).case_insensitive(true).build().ok().map(|re| (re, *operands))
    })
    .collect();

    static ref KIND_PREFIX: Regex = Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.]*)\s*:").unwrap();
}

/// Extract the expected and actual values from an assertion message.
///
/// Returns `None` for freeform messages; that is the normal case, not an error.
pub fn extract_values(message: &str) -> Option<ExtractedValues> {
    VALUE_PATTERNS.iter().find_map(|(re, operands)| {
        let caps = re.captures(message)?;
        let first = caps.get(1)?.as_str().trim().to_string();
        let second = caps.get(2)?.as_str().trim().to_string();
        Some(match operands {
            Operands::ActualThenExpected => ExtractedValues { expected: second, actual: first },
            Operands::ExpectedThenActual => ExtractedValues { expected: first, actual: second },
        })
    })
}

const KIND_SUFFIXES: [&str; 6] = ["Error", "Exception", "Warning", "Failure", "Interrupt", "Exit"];

/// Infer an error kind from a message like `"KeyError: 'x'"`.
///
/// Falls back to `"Error"` when the message carries no exception-like `Name:` prefix.
pub fn infer_error_kind(message: &str) -> String {
    KIND_PREFIX
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .map(|path| path.rsplit('.').next().unwrap_or(path))
        .filter(|kind| KIND_SUFFIXES.iter().any(|suffix| kind.ends_with(suffix)))
        .map(|kind| kind.to_string())
        .unwrap_or_else(|| "Error".to_string())
}
