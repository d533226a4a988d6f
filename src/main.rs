// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use llm_test_reporter::adapter::open_source;
use llm_test_reporter::cli::{CliArgs, Command, ReportArgs, ValidateArgs};
use llm_test_reporter::validate::{ValidationOptions, validate_report};
use llm_test_reporter::{ReporterConfig, StreamingSession, open_sink, run_report, ui};
use log::debug;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

/// Exit status for usage errors and I/O failures; 0 and 1 are test outcomes
const ERROR_EXIT_CODE: i32 = 2;

fn main() {
    env_logger::init();

    // Parse CLI arguments
    let args = CliArgs::parse_args();

    let exit_code = match args.command {
        Command::Report(ref report) => run_report_command(report),
        Command::Validate(ref validate) => run_validate_command(validate),
    };

    std::process::exit(exit_code);
}

fn run_report_command(args: &ReportArgs) -> i32 {
    // Validate arguments
    if let Err(e) = args.validate() {
        ui::print_error(&e);
        return ERROR_EXIT_CODE;
    }

    let config = ReporterConfig::load(args.config.as_deref(), &args.config_layer());

    let reader: Box<dyn BufRead> = match args.input_path() {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                ui::print_error(&format!("Cannot read {}: {}", path.display(), e));
                return ERROR_EXIT_CODE;
            }
        },
        None => Box::new(io::stdin().lock()),
    };

    let work_dir = args
        .work_dir
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let sink = match open_sink(&config) {
        Ok(sink) => sink,
        Err(e) => {
            ui::print_error(&e.to_string());
            return ERROR_EXIT_CODE;
        }
    };

    let output_file = config.output_file.clone();
    let mut source = open_source(args.format, reader, work_dir);
    let session = StreamingSession::new(config, sink);

    match run_report(source.as_mut(), session, |event| debug!("{} {}", event.status.as_str(), event.display_name())) {
        Ok(outcome) => {
            if let Some(path) = output_file {
                ui::status(&format!("Report for {} events written to {}", outcome.events, path.display()));
            }
            outcome.exit_code
        }
        Err(e) => {
            ui::print_error(&e.to_string());
            ERROR_EXIT_CODE
        }
    }
}

fn run_validate_command(args: &ValidateArgs) -> i32 {
    let text = match fs::read_to_string(&args.file) {
        Ok(text) => text,
        Err(e) => {
            ui::print_error(&format!("Cannot read {}: {}", args.file.display(), e));
            return ERROR_EXIT_CODE;
        }
    };

    let result = validate_report(&text, &ValidationOptions { stray_threshold: args.stray_threshold });

    if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => ui::print_error(&format!("Failed to serialize result: {}", e)),
        }
    } else {
        for warning in &result.warnings {
            ui::print_warning(warning);
        }
        for error in &result.errors {
            ui::print_error(error);
        }
        if result.is_valid() {
            ui::status(&format!("{} follows the report format", args.file.display()));
        }
    }

    if result.is_valid() { 0 } else { 1 }
}
