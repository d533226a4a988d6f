//! Report generation module.
//!
//! This module handles:
//! - Rendering the header, suite sections and failure blocks
//! - Summary arithmetic for the `## SUMMARY` block
//! - Value truncation
//!
//! # Module Organization
//!
//! - `formatter` - Text rendering driven by a `ReporterConfig`
//! - `stats` - Aggregated run totals

mod formatter;
mod stats;

pub use formatter::{HEADER_PREFIX, ReportFormatter, SEPARATOR, truncate_value};
pub use stats::RunTotals;
