/// Code context extraction for detailed failure blocks
///
/// This module handles:
/// - Locating the failing line of a suite file inside a traceback
/// - Rendering a line-numbered snippet with a `>` marker on the failing line
/// - Trimming tracebacks to the configured number of lines
use log::debug;
use std::fs;
use std::path::Path;

/// Lines shown before and after the failing line
pub const CONTEXT_RADIUS: usize = 2;

/// Render `lines[line - radius ..= line + radius]` with line numbers.
///
/// `line` is 1-based. Returns `None` when it falls outside the source.
pub fn format_snippet(source: &str, line: usize, radius: usize) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    if line == 0 || line > lines.len() {
        return None;
    }

    let start = line.saturating_sub(radius).max(1);
    let end = (line + radius).min(lines.len());
    let width = end.to_string().len();

    let rendered: Vec<String> = (start..=end)
        .map(|n| {
            let marker = if n == line { '>' } else { ' ' };
            format!("{} {:>width$} | {}", marker, n, lines[n - 1], width = width)
        })
        .collect();

    Some(rendered.join("\n"))
}

/// Read `path` and render the snippet around `line`.
///
/// A missing or unreadable file is not an error: there is simply no context.
pub fn extract_context(path: &Path, line: usize) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(source) => format_snippet(&source, line, CONTEXT_RADIUS),
        Err(e) => {
            debug!("No code context for {}:{}: {}", path.display(), line, e);
            None
        }
    }
}

/// Find the line number of the last traceback frame that points into `file_path`.
///
/// Understands `path:12`, `path:12:5`, `(path:12:5)` and `path", line 12` frames.
pub fn find_failing_line(traceback: &str, file_path: &str) -> Option<u32> {
    if file_path.is_empty() {
        return None;
    }
    let file_name = Path::new(file_path).file_name().and_then(|n| n.to_str()).unwrap_or(file_path);

    traceback
        .lines()
        .filter_map(|frame| {
            let at = frame.rfind(file_name)?;
            let rest = &frame[at + file_name.len()..];
            let digits = rest
                .strip_prefix(':')
                .or_else(|| rest.strip_prefix("\", line "))
                .map(|r| r.chars().take_while(|c| c.is_ascii_digit()).collect::<String>())?;
            digits.parse::<u32>().ok()
        })
        .last()
}

/// Keep the first `max_lines` non-empty traceback lines; `0` keeps none.
pub fn trim_traceback(traceback: &str, max_lines: usize) -> Option<String> {
    if max_lines == 0 {
        return None;
    }
    let kept: Vec<&str> = traceback.lines().filter(|l| !l.trim().is_empty()).take(max_lines).collect();
    if kept.is_empty() { None } else { Some(kept.join("\n")) }
}
