/// `go test -json` adapter
///
/// Output lines are buffered per test until its terminal action
/// (`pass`, `fail`, `skip`). Failure messages, file names and line numbers
/// come from `name_test.go:LINE: message` lines in that output.
use super::{LossyLines, RawEventSource};
use crate::types::{RawEvent, TestStatus};
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::{self, BufRead};
use std::path::PathBuf;

lazy_static! {
    static ref GO_LOCATION: Regex = Regex::new(r"(?:^|\s)([^\s/]+\.go):(\d+):\s*(.*)$").unwrap();
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoEvent {
    action: String,
    #[serde(default)]
    package: String,
    #[serde(default)]
    test: String,
    #[serde(default)]
    output: String,
    #[serde(default)]
    elapsed: f64,
}

/// A `file.go:LINE: message` location found in test output
#[derive(Debug, Clone, PartialEq, Eq)]
struct GoLocation {
    file: String,
    line: u32,
    message: String,
}

fn parse_location(output: &str) -> Option<GoLocation> {
    let caps = GO_LOCATION.captures(output.trim())?;
    Some(GoLocation {
        file: caps.get(1)?.as_str().to_string(),
        line: caps.get(2)?.as_str().parse().ok()?,
        message: caps.get(3).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
    })
}

fn is_framework_line(output: &str) -> bool {
    let output = output.trim_start();
    ["=== RUN", "=== PAUSE", "=== CONT", "--- FAIL", "--- PASS", "--- SKIP"].iter().any(|p| output.starts_with(p))
}

pub struct GoTestSource<R: BufRead> {
    lines: LossyLines<R>,
    work_dir: PathBuf,
    outputs: HashMap<String, Vec<String>>,
    files: HashMap<String, String>,
    package_failed: bool,
}

impl<R: BufRead> GoTestSource<R> {
    pub fn new(reader: R, work_dir: PathBuf) -> Self {
        Self {
            lines: LossyLines::new(reader),
            work_dir,
            outputs: HashMap::new(),
            files: HashMap::new(),
            package_failed: false,
        }
    }

    fn remember_file(&mut self, test: &str, output: &str) {
        let Some(location) = parse_location(output) else {
            return;
        };
        self.files.insert(test.to_string(), location.file.clone());
        // A subtest's file is also its parent's, unless the parent already has one
        if let Some((parent, _)) = test.rsplit_once('/') {
            self.files.entry(parent.to_string()).or_insert(location.file);
        }
    }

    fn finish_test(&mut self, event: GoEvent, status: TestStatus) -> RawEvent {
        let outputs = self.outputs.remove(&event.test).unwrap_or_default();

        let (test_name, full_name) = match event.test.rsplit_once('/') {
            Some((parent, child)) => (child.to_string(), format!("{} > {}", parent, child)),
            None => (event.test.clone(), event.test.clone()),
        };

        let mut file = None;
        let mut line_number = None;
        let mut message = None;
        let mut trace = Vec::new();

        for output in outputs.iter().filter(|o| !is_framework_line(o)) {
            let trimmed = output.trim();
            if trimmed.is_empty() {
                continue;
            }
            trace.push(trimmed.to_string());
            // The last located message wins; a bare line only fills an empty slot
            if let Some(location) = parse_location(trimmed) {
                file = Some(location.file);
                line_number = Some(location.line);
                message = Some(location.message);
            } else if message.is_none() {
                message = Some(trimmed.to_string());
            }
        }

        let file = file.or_else(|| self.files.get(&event.test).cloned());
        let suite_path = match file {
            Some(ref file) => self.work_dir.join(file).to_string_lossy().to_string(),
            None if !event.package.is_empty() => event.package.clone(),
            None => self.work_dir.join("tests").to_string_lossy().to_string(),
        };

        let mut raw = RawEvent::new(suite_path, test_name, status);
        raw.full_name = Some(full_name);
        raw.duration_seconds = event.elapsed.max(0.0);

        if status == TestStatus::Failed {
            raw.line_number = line_number;
            raw.raw_error_message = message;
            if !trace.is_empty() {
                raw.raw_traceback = Some(trace.join("\n"));
            }
        }
        raw
    }
}

impl<R: BufRead> RawEventSource for GoTestSource<R> {
    fn next_event(&mut self) -> io::Result<Option<RawEvent>> {
        while let Some(line) = self.lines.next_line()? {
            if line.trim().is_empty() {
                continue;
            }

            let event: GoEvent = match serde_json::from_str(&line) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Skipping malformed go test event: {}", e);
                    continue;
                }
            };

            let status = match event.action.as_str() {
                "run" if !event.test.is_empty() => {
                    self.outputs.insert(event.test.clone(), Vec::new());
                    continue;
                }
                "output" if !event.test.is_empty() => {
                    if event.output.contains(".go:") {
                        self.remember_file(&event.test, &event.output);
                    }
                    self.outputs.entry(event.test).or_default().push(event.output);
                    continue;
                }
                "fail" if event.test.is_empty() => {
                    debug!("Package {} failed", event.package);
                    self.package_failed = true;
                    continue;
                }
                _ if event.test.is_empty() => continue,
                "pass" => TestStatus::Passed,
                "fail" => TestStatus::Failed,
                "skip" => TestStatus::Skipped,
                _ => continue,
            };

            return Ok(Some(self.finish_test(event, status)));
        }
        Ok(None)
    }

    fn exit_code_hint(&self) -> Option<i32> {
        if self.package_failed { Some(1) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = r#"{"Action":"run","Package":"example.com/calc","Test":"TestAdd"}
{"Action":"output","Package":"example.com/calc","Test":"TestAdd","Output":"=== RUN   TestAdd\n"}
{"Action":"output","Package":"example.com/calc","Test":"TestAdd","Output":"    calc_test.go:13: Expected 10 but got 5\n"}
{"Action":"output","Package":"example.com/calc","Test":"TestAdd","Output":"--- FAIL: TestAdd (0.00s)\n"}
{"Action":"fail","Package":"example.com/calc","Test":"TestAdd","Elapsed":0.01}
{"Action":"run","Package":"example.com/calc","Test":"TestDiv/by_zero"}
{"Action":"output","Package":"example.com/calc","Test":"TestDiv/by_zero","Output":"    calc_test.go:40: ok\n"}
{"Action":"pass","Package":"example.com/calc","Test":"TestDiv/by_zero","Elapsed":0}
{"Action":"run","Package":"example.com/calc","Test":"TestSkip"}
{"Action":"skip","Package":"example.com/calc","Test":"TestSkip"}
this line is not json
{"Action":"fail","Package":"example.com/calc","Elapsed":0.02}
"#;

    fn collect(input: &str) -> (Vec<RawEvent>, Option<i32>) {
        let mut source = GoTestSource::new(input.as_bytes(), PathBuf::from("/work"));
        let mut events = Vec::new();
        while let Some(event) = source.next_event().unwrap() {
            events.push(event);
        }
        (events, source.exit_code_hint())
    }

    #[test]
    fn test_parse_location() {
        let location = parse_location("    calc_test.go:13: Expected 10 but got 5").unwrap();
        assert_eq!(location.file, "calc_test.go");
        assert_eq!(location.line, 13);
        assert_eq!(location.message, "Expected 10 but got 5");
        assert!(parse_location("no location here").is_none());
        assert!(parse_location("/abs/path/calc_test.go:13: nested paths are ignored").is_none());
    }

    #[test]
    fn test_failed_test_event() {
        let (events, _) = collect(STREAM);
        let failed = &events[0];

        assert_eq!(failed.status, TestStatus::Failed);
        assert_eq!(failed.suite_path, "/work/calc_test.go");
        assert_eq!(failed.line_number, Some(13));
        assert_eq!(failed.raw_error_message.as_deref(), Some("Expected 10 but got 5"));
        assert_eq!(failed.raw_traceback.as_deref(), Some("calc_test.go:13: Expected 10 but got 5"));
        assert_eq!(failed.duration_seconds, 0.01);
    }

    #[test]
    fn test_subtest_names_and_status() {
        let (events, _) = collect(STREAM);
        assert_eq!(events.len(), 3);

        let subtest = &events[1];
        assert_eq!(subtest.test_name, "by_zero");
        assert_eq!(subtest.display_name(), "TestDiv > by_zero");
        assert_eq!(subtest.status, TestStatus::Passed);
        assert_eq!(subtest.suite_path, "/work/calc_test.go");
        assert!(subtest.raw_error_message.is_none());
    }

    #[test]
    fn test_unknown_file_falls_back_to_package() {
        let (events, _) = collect(STREAM);
        assert_eq!(events[2].status, TestStatus::Skipped);
        assert_eq!(events[2].suite_path, "example.com/calc");
    }

    #[test]
    fn test_invalid_utf8_output_is_kept() {
        let mut input = br#"{"Action":"run","Package":"p","Test":"TestBytes"}"#.to_vec();
        input.extend_from_slice(b"\n{\"Action\":\"output\",\"Package\":\"p\",\"Test\":\"TestBytes\",\"Output\":\"    bytes_test.go:7: got \xff\\n\"}\n");
        input.extend_from_slice(br#"{"Action":"fail","Package":"p","Test":"TestBytes","Elapsed":0.1}"#);

        let mut source = GoTestSource::new(input.as_slice(), PathBuf::from("/work"));
        let event = source.next_event().unwrap().unwrap();

        assert_eq!(event.status, TestStatus::Failed);
        assert_eq!(event.line_number, Some(7));
        assert_eq!(event.raw_error_message.as_deref(), Some("got \u{FFFD}"));
    }

    #[test]
    fn test_package_failure_sets_exit_hint() {
        let (_, hint) = collect(STREAM);
        assert_eq!(hint, Some(1));

        let (_, hint) = collect(r#"{"Action":"pass","Package":"example.com/calc","Elapsed":0.02}"#);
        assert_eq!(hint, None);
    }
}
