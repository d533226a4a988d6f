/// Command line integration tests
///
/// These run the built binary against the fixtures in `test-fixtures/`
/// from a scratch directory so no stray config file is picked up.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const REPORTER_ENV: [&str; 12] = [
    "LLM_REPORTER_MODE",
    "LLM_OUTPUT_MODE",
    "LLM_REPORTER_OUTPUT_FILE",
    "LLM_OUTPUT_FILE",
    "LLM_REPORTER_INCLUDE_PASSED_SUITES",
    "LLM_INCLUDE_PASSED_SUITES",
    "LLM_REPORTER_MAX_VALUE_LENGTH",
    "LLM_MAX_VALUE_LENGTH",
    "LLM_REPORTER_STACK_TRACE_LINES",
    "LLM_STACK_TRACE_LINES",
    "LLM_REPORTER_DETECT_PATTERNS",
    "LLM_DETECT_PATTERNS",
];

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test-fixtures").join(name)
}

// Helper to run the reporter binary in a directory
fn run_reporter(args: &[&str], cwd: &Path) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_llm-test-reporter"));
    for name in REPORTER_ENV {
        command.env_remove(name);
    }
    command
        .args(args)
        .current_dir(cwd)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run llm-test-reporter {}: {}", args.join(" "), e))
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_report_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = fixture("mixed.jsonl");
    let output = run_reporter(&["report", input.to_str().unwrap()], dir.path());

    assert_eq!(output.status.code(), Some(1));
    let report = stdout(&output);
    assert!(report.starts_with("# LLM TEST REPORTER - SUMMARY MODE\n\n"));
    assert!(report.contains("- EXIT CODE: 1\n"));
    assert!(!report.contains("\x1b["));
}

#[test]
fn test_report_to_file_then_validate() {
    let dir = TempDir::new().unwrap();
    let input = fixture("mixed.jsonl");
    let report_path = dir.path().join("report.txt");

    let output = run_reporter(
        &["report", "--mode", "detailed", "-o", report_path.to_str().unwrap(), input.to_str().unwrap()],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());

    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.starts_with("# LLM TEST REPORTER - DETAILED MODE\n\n"));
    assert!(report.contains("## TEST FAILURE #1\n"));

    let validated = run_reporter(&["validate", report_path.to_str().unwrap()], dir.path());
    assert_eq!(
        validated.status.code(),
        Some(0),
        "validate failed: {}",
        String::from_utf8_lossy(&validated.stderr)
    );
}

#[test]
fn test_config_file_is_discovered() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".llm-reporter.json"), r#"{"mode":"detailed","detectPatterns":false}"#).unwrap();
    let input = fixture("mixed.jsonl");

    let output = run_reporter(&["report", input.to_str().unwrap()], dir.path());
    let report = stdout(&output);

    assert!(report.starts_with("# LLM TEST REPORTER - DETAILED MODE"));
    assert!(!report.contains("DETECTED PATTERNS"));

    let overridden = run_reporter(&["report", "--mode", "summary", input.to_str().unwrap()], dir.path());
    assert!(stdout(&overridden).starts_with("# LLM TEST REPORTER - SUMMARY MODE"));
}

#[test]
fn test_go_test_input_from_stdin() {
    let dir = TempDir::new().unwrap();
    let input = fs::read(fixture("go_failing.json")).unwrap();

    let mut command = Command::new(env!("CARGO_BIN_EXE_llm-test-reporter"));
    for name in REPORTER_ENV {
        command.env_remove(name);
    }
    let mut child = command
        .args(["report", "--format", "go-test", "--work-dir", "/work", "-"])
        .current_dir(dir.path())
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .spawn()
        .unwrap();
    {
        use std::io::Write;
        child.stdin.take().unwrap().write_all(&input).unwrap();
    }
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("- TestAdd: Expected 10 but got 5\n"));
}

#[test]
fn test_unwritable_output_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = fixture("mixed.jsonl");
    let target = dir.path().join("missing").join("report.txt");

    let output = run_reporter(&["report", "-o", target.to_str().unwrap(), input.to_str().unwrap()], dir.path());

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_write_failure_during_run_is_not_a_test_outcome() {
    // Every write to /dev/full fails with ENOSPC
    let full = Path::new("/dev/full");
    if !full.exists() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = fixture("mixed.jsonl");

    let output = run_reporter(&["report", "-o", full.to_str().unwrap(), input.to_str().unwrap()], dir.path());

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_validate_rejects_non_report() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("noise.txt");
    fs::write(&path, "running 3 tests\nok\n").unwrap();

    let output = run_reporter(&["validate", path.to_str().unwrap()], dir.path());
    assert_eq!(output.status.code(), Some(1));
}
