//! Runner adapters.
//!
//! An adapter turns one test runner's native output into a stream of
//! `RawEvent`s. The session and formatter never see runner-specific data.
//!
//! - `jsonl` - one `RawEvent` JSON object per line
//! - `gotest` - the event stream printed by `go test -json`

mod gotest;
mod jsonl;

pub use gotest::GoTestSource;
pub use jsonl::JsonLinesSource;

use crate::types::RawEvent;
use log::warn;
use std::io::{self, BufRead};
use std::path::PathBuf;

/// Line splitter that survives bytes which are not UTF-8.
///
/// Invalid sequences are replaced with U+FFFD so one garbled line never
/// ends the stream. Only errors of the underlying reader are returned.
struct LossyLines<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> LossyLines<R> {
    fn new(reader: R) -> Self {
        Self { reader, buf: Vec::new(), line_number: 0 }
    }

    /// Next line without its terminator, or `None` at end of stream
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        let line = match String::from_utf8_lossy(&self.buf) {
            std::borrow::Cow::Borrowed(line) => line.to_string(),
            std::borrow::Cow::Owned(line) => {
                warn!("Line {} is not valid UTF-8; replacing invalid bytes", self.line_number);
                line
            }
        };
        Ok(Some(line))
    }
}

/// A pull-based source of raw test events
pub trait RawEventSource {
    /// Next event, or `None` at end of stream.
    ///
    /// Malformed input is skipped by the adapter; only I/O failures of the
    /// underlying reader are returned as errors.
    fn next_event(&mut self) -> io::Result<Option<RawEvent>>;

    /// Exit status the runner itself reported, when the format carries one
    fn exit_code_hint(&self) -> Option<i32> {
        None
    }
}

/// Input formats understood by the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InputFormat {
    #[default]
    Jsonl,
    GoTest,
}

/// Build the adapter for `format` over `reader`.
///
/// `work_dir` prefixes file names reported by runners that only know bare
/// file names (go test).
pub fn open_source<'a>(format: InputFormat, reader: Box<dyn BufRead + 'a>, work_dir: PathBuf) -> Box<dyn RawEventSource + 'a> {
    match format {
        InputFormat::Jsonl => Box::new(JsonLinesSource::new(reader)),
        InputFormat::GoTest => Box::new(GoTestSource::new(reader, work_dir)),
    }
}
