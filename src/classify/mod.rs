//! Error classification and analysis.
//!
//! This module turns a raw failure into a structured diagnosis:
//! - `classify` - map an error to a category label ("Key Error", "Equality Assertion", ...)
//! - `generate_fix_hint` - heuristic remediation text
//! - `values` - expected/actual extraction and error-kind inference
//! - `patterns` - grouping failures that share a category across a run
//!
//! Everything here is pure; a miss degrades to a generic label or hint, never an error.

mod patterns;
mod values;

pub use patterns::{FailurePattern, detect_patterns, generate_pattern_summary};
pub use values::{extract_values, infer_error_kind};

use crate::types::ErrorInfo;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

/// Category returned when no pattern matches and the kind is not an `...Error`
pub const UNKNOWN_CATEGORY: &str = "Unknown Error";

/// Hint returned when no rule in the decision table matches
pub const GENERIC_FIX_HINT: &str = "Review error message and stack trace for details";

fn compile(table: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .filter_map(|(pattern, category)| {
            RegexBuilder::new(pattern).case_insensitive(true).build().ok().map(|re| (re, *category))
        })
        .collect()
}

lazy_static! {
    // Assertion phrasing is checked first: assertion messages often embed an
    // exception-like substring ("assert 'KeyError' in log").
    static ref ASSERTION_PATTERNS: Vec<(Regex, &'static str)> = compile(&[
        (r"\bassert\b.*==", "Equality Assertion"),
        (r"\bassert\b.*!=", "Inequality Assertion"),
        (r"\bassert\b.*\bis\b", "Identity Assertion"),
        (r"\bassert\b.*\bin\b", "Membership Assertion"),
        (r"assertTrue|assertFalse", "Boolean Assertion"),
        (r"AssertionError", "Assertion Error"),
    ]);
    static ref EXCEPTION_PATTERNS: Vec<(Regex, &'static str)> = compile(&[
        (r"TypeError", "Type Error"),
        (r"ValueError", "Value Error"),
        (r"KeyError", "Key Error"),
        (r"IndexError", "Index Error"),
        (r"AttributeError", "Attribute Error"),
        (r"NameError", "Name Error"),
        (r"ImportError|ModuleNotFoundError", "Import Error"),
        (r"ZeroDivisionError", "Division by Zero"),
        (r"FileNotFoundError", "File Not Found"),
        (r"PermissionError", "Permission Error"),
        (r"TimeoutError", "Timeout Error"),
    ]);
    static ref ASYNC_PATTERNS: Vec<(Regex, &'static str)> = compile(&[
        (r"asyncio.*TimeoutError|await.*timed? ?out|timed? ?out.*await", "Async Timeout"),
        (r"RuntimeError.*await", "Async Runtime Error"),
        (r"not awaited", "Missing Await"),
    ]);
}

/// Classify an error into a category label.
///
/// Pattern families are tried in order (assertions, exception kinds, async),
/// against `"<kind> <message>"`, case-insensitively; the first match wins.
pub fn classify(error: &ErrorInfo) -> String {
    let text = format!("{} {}", error.kind, error.message);

    let families = [ASSERTION_PATTERNS.as_slice(), EXCEPTION_PATTERNS.as_slice(), ASYNC_PATTERNS.as_slice()];
    for family in families {
        if let Some((_, category)) = family.iter().find(|(re, _)| re.is_match(&text)) {
            return category.to_string();
        }
    }

    if error.kind.contains("Error") { error.kind.clone() } else { UNKNOWN_CATEGORY.to_string() }
}

/// Generate a short, actionable fix hint for an error.
///
/// Keyed by the lowercased kind first, then by message substrings. Advisory only.
pub fn generate_fix_hint(error: &ErrorInfo) -> String {
    let kind = error.kind.to_lowercase();
    let message = error.message.to_lowercase();

    let hint = if kind.contains("typeerror") {
        if message.contains("got") && message.contains("expected") {
            "Check the types of arguments being passed"
        } else if message.contains("not callable") || message.contains("is not a function") {
            "Ensure you're calling a function, not a value"
        } else if message.contains("missing") && message.contains("argument") {
            "Check function signature for required arguments"
        } else if message.contains("cannot read propert") {
            "Add a null/undefined check before accessing properties"
        } else {
            "Verify argument types match expected values"
        }
    } else if kind.contains("valueerror") {
        if message.contains("invalid literal") {
            "Check input format and conversion logic"
        } else {
            "Ensure values are within expected range or format"
        }
    } else if kind.contains("keyerror") {
        "Verify key exists before access"
    } else if kind.contains("indexerror") {
        "Check array bounds before accessing elements"
    } else if kind.contains("attributeerror") {
        if message.contains("has no attribute") {
            "Verify object has the attribute or method"
        } else {
            "Check object type and available attributes"
        }
    } else if kind.contains("importerror") || kind.contains("modulenotfounderror") {
        "Ensure module is installed and import path is correct"
    } else if kind.contains("referenceerror") || kind.contains("nameerror") {
        "Declare the name before use or check for typos"
    } else if kind.contains("assertionerror") || kind.contains("assert") {
        if error.values.is_some() {
            "Update test or implementation to match expected value"
        } else {
            "Review assertion logic and expected values"
        }
    } else if kind.contains("timeout") || message.contains("timeout") || message.contains("timed out") {
        "Increase timeout duration or optimize async operations"
    } else if kind.contains("filenotfound") {
        "Verify file path and ensure file exists"
    } else if kind.contains("permission") {
        "Check file/directory permissions"
    } else if kind.contains("zerodivision") {
        "Guard against a zero divisor before dividing"
    } else if message.contains("not awaited") {
        "Await the coroutine or schedule it as a task"
    } else if message.contains("nil pointer") || message.contains("null pointer") {
        "Check for nil values before dereferencing"
    } else if message.contains("panic") {
        "Add error handling or recover from the panic"
    } else {
        GENERIC_FIX_HINT
    };

    hint.to_string()
}
