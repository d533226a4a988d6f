//! Normalizes test-runner results into a deterministic, plain-text report
//! meant to be read by language models and CI tooling.
//!
//! Runner adapters produce `RawEvent`s, a `StreamingSession` buckets and
//! diagnoses them, and a `ReportFormatter` renders the report text.

pub mod adapter;
pub mod classify;
pub mod cli;
pub mod code_context;
pub mod collector;
pub mod config;
pub mod report;
pub mod runner;
pub mod session;
pub mod types;
pub mod ui;
pub mod validate;

pub use config::{ConfigLayer, OutputMode, ReporterConfig};
pub use report::ReportFormatter;
pub use runner::{RunOutcome, run_report};
pub use session::{SessionError, StreamingSession, open_sink};
pub use types::{ErrorInfo, ExtractedValues, RawEvent, TestPhase, TestResult, TestStatus, TestSuite};
