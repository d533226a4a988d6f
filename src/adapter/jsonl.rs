use super::{LossyLines, RawEventSource};
use crate::types::RawEvent;
use log::warn;
use std::io::{self, BufRead};

/// Reads one camelCase `RawEvent` object per line; blank lines are ignored
pub struct JsonLinesSource<R: BufRead> {
    lines: LossyLines<R>,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: LossyLines::new(reader) }
    }
}

impl<R: BufRead> RawEventSource for JsonLinesSource<R> {
    fn next_event(&mut self) -> io::Result<Option<RawEvent>> {
        while let Some(line) = self.lines.next_line()? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<RawEvent>(trimmed) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => warn!("Skipping malformed event on line {}: {}", self.lines.line_number, e),
            }
        }
        Ok(None)
    }
}
