use crate::adapter::InputFormat;
use crate::config::{ConfigLayer, OutputMode};
use crate::validate::DEFAULT_STRAY_THRESHOLD;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "llm-test-reporter")]
#[command(about = "Turn test runner output into a compact, machine-readable failure report")]
#[command(version)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Read test events and write a report
    Report(ReportArgs),

    /// Check that captured output follows the report format
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Format of the input events
    #[arg(long, value_enum, default_value_t = InputFormat::Jsonl)]
    pub format: InputFormat,

    /// Output mode (overrides config file and environment)
    #[arg(long, short = 'm', value_enum)]
    pub mode: Option<OutputMode>,

    /// Write the report to this file instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Config file to use instead of searching for .llm-reporter.json
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// List suites without failures in summary mode
    #[arg(long, overrides_with = "no_include_passed_suites")]
    pub include_passed_suites: bool,

    /// Hide suites without failures in summary mode
    #[arg(long, overrides_with = "include_passed_suites")]
    pub no_include_passed_suites: bool,

    /// Truncate expected/actual values and summary messages to this many characters
    #[arg(long, value_name = "N")]
    pub max_value_length: Option<usize>,

    /// Stack trace lines kept per failure in detailed mode (0 disables)
    #[arg(long, value_name = "N")]
    pub stack_trace_lines: Option<usize>,

    /// Append the DETECTED PATTERNS block
    #[arg(long, overrides_with = "no_detect_patterns")]
    pub detect_patterns: bool,

    /// Skip the DETECTED PATTERNS block
    #[arg(long, overrides_with = "detect_patterns")]
    pub no_detect_patterns: bool,

    /// Directory prefixed to bare file names reported by the runner (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Input file; omit or pass "-" to read stdin
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,
}

impl ReportArgs {
    /// Validate argument values clap cannot check on its own
    pub fn validate(&self) -> Result<(), String> {
        if self.max_value_length == Some(0) {
            return Err("--max-value-length must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Explicit configuration layer; unset flags leave lower layers alone
    pub fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            mode: self.mode,
            include_passed_suites: flag_pair(self.include_passed_suites, self.no_include_passed_suites),
            max_value_length: self.max_value_length,
            stack_trace_lines: self.stack_trace_lines,
            detect_patterns: flag_pair(self.detect_patterns, self.no_detect_patterns),
            output_file: self.output.clone(),
        }
    }

    /// Input file, or `None` for stdin
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|p| p.to_str() != Some("-"))
    }
}

/// `--x` / `--no-x` pair; the last one given wins and neither leaves the setting unset
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    if on {
        Some(true)
    } else if off {
        Some(false)
    } else {
        None
    }
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Captured output to check
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Non-empty lines tolerated before the header or after the report
    #[arg(long, value_name = "N", default_value_t = DEFAULT_STRAY_THRESHOLD)]
    pub stray_threshold: usize,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        CliArgs::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_args(argv: &[&str]) -> ReportArgs {
        let mut full = vec!["llm-test-reporter", "report"];
        full.extend_from_slice(argv);
        match CliArgs::try_parse_from(full).unwrap().command {
            Command::Report(args) => args,
            other => panic!("expected report command, got {:?}", other),
        }
    }

    #[test]
    fn test_report_defaults() {
        let args = report_args(&[]);
        assert_eq!(args.format, InputFormat::Jsonl);
        assert!(args.input_path().is_none());
        assert_eq!(args.config_layer(), ConfigLayer::default());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_report_flags_map_to_layer() {
        let args = report_args(&[
            "--format",
            "go-test",
            "--mode",
            "detailed",
            "-o",
            "out.txt",
            "--include-passed-suites",
            "--max-value-length",
            "40",
            "--stack-trace-lines",
            "0",
            "--no-detect-patterns",
            "results.jsonl",
        ]);
        let layer = args.config_layer();

        assert_eq!(args.format, InputFormat::GoTest);
        assert_eq!(args.input_path(), Some(&PathBuf::from("results.jsonl")));
        assert_eq!(layer.mode, Some(OutputMode::Detailed));
        assert_eq!(layer.output_file, Some(PathBuf::from("out.txt")));
        assert_eq!(layer.include_passed_suites, Some(true));
        assert_eq!(layer.max_value_length, Some(40));
        assert_eq!(layer.stack_trace_lines, Some(0));
        assert_eq!(layer.detect_patterns, Some(false));
    }

    #[test]
    fn test_negated_flags_override_lower_layers() {
        let layer = report_args(&["--no-include-passed-suites", "--detect-patterns"]).config_layer();
        assert_eq!(layer.include_passed_suites, Some(false));
        assert_eq!(layer.detect_patterns, Some(true));

        let last_wins = report_args(&["--include-passed-suites", "--no-include-passed-suites", "--no-detect-patterns", "--detect-patterns"]);
        assert_eq!(last_wins.config_layer().include_passed_suites, Some(false));
        assert_eq!(last_wins.config_layer().detect_patterns, Some(true));
    }

    #[test]
    fn test_dash_reads_stdin() {
        assert!(report_args(&["-"]).input_path().is_none());
    }

    #[test]
    fn test_zero_max_value_length_is_rejected() {
        assert!(report_args(&["--max-value-length", "0"]).validate().is_err());
    }

    #[test]
    fn test_invalid_mode_is_a_usage_error() {
        assert!(CliArgs::try_parse_from(["llm-test-reporter", "report", "--mode", "verbose"]).is_err());
    }

    #[test]
    fn test_validate_command() {
        let args = CliArgs::try_parse_from(["llm-test-reporter", "validate", "out.txt", "--stray-threshold", "2"]).unwrap();
        match args.command {
            Command::Validate(v) => {
                assert_eq!(v.file, PathBuf::from("out.txt"));
                assert_eq!(v.stray_threshold, 2);
                assert!(!v.json);
            }
            other => panic!("expected validate command, got {:?}", other),
        }
    }
}
