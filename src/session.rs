//! Streaming report session.
//!
//! A session owns the output sink for one run and moves through
//! `NotStarted -> Started -> Finished`. Suites are written as soon as they are
//! added; the summary and detected patterns are written by `finish`, which
//! also hands the sink back so it is released exactly once.

use crate::classify::{detect_patterns, generate_pattern_summary};
use crate::collector::{EnrichOptions, SuiteCollector};
use crate::config::ReporterConfig;
use crate::report::ReportFormatter;
use crate::types::{RawEvent, TestSuite};
use chrono::{DateTime, Local};
use log::debug;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of a reporting session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {operation}: session has not been started")]
    NotStarted { operation: &'static str },

    #[error("cannot {operation}: session has already finished")]
    AlreadyFinished { operation: &'static str },

    #[error("failed to open report output {}: {source}", path.display())]
    OpenSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write report: {0}")]
    Sink(#[from] io::Error),

    #[error("failed to read test events: {0}")]
    Input(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Started,
    Finished,
}

/// Open the configured output: the file named by `output_file`, else stdout.
///
/// A configured file that cannot be created is an error; there is no
/// fallback to stdout.
pub fn open_sink(config: &ReporterConfig) -> Result<Box<dyn Write>, SessionError> {
    match config.output_file {
        Some(ref path) => {
            let file = File::create(path).map_err(|source| SessionError::OpenSink { path: path.clone(), source })?;
            debug!("Writing report to {}", path.display());
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

/// One run's report, written incrementally to `W`
pub struct StreamingSession<W: Write> {
    formatter: ReportFormatter,
    detect_patterns: bool,
    sink: Option<W>,
    state: SessionState,
    started_at: Option<DateTime<Local>>,
    suites: Vec<TestSuite>,
    pending: SuiteCollector,
}

impl<W: Write> StreamingSession<W> {
    pub fn new(config: ReporterConfig, sink: W) -> Self {
        let options = EnrichOptions::from_config(&config);
        Self {
            detect_patterns: config.detect_patterns,
            formatter: ReportFormatter::new(config),
            sink: Some(sink),
            state: SessionState::NotStarted,
            started_at: None,
            suites: Vec::new(),
            pending: SuiteCollector::new(options),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &ReporterConfig {
        self.formatter.config()
    }

    /// Suites already written, in emission order
    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }

    /// Write the header and start the clock. A second call is ignored.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Started => {
                debug!("Session already started, ignoring start()");
                Ok(())
            }
            SessionState::Finished => Err(SessionError::AlreadyFinished { operation: "start" }),
            SessionState::NotStarted => {
                let header = self.formatter.format_header();
                self.write(&header)?;
                self.started_at = Some(Local::now());
                self.state = SessionState::Started;
                debug!("Session started in {} mode", self.formatter.config().mode);
                Ok(())
            }
        }
    }

    /// Buffer a raw event; its suite is written by `flush_pending` or `finish`
    pub fn record(&mut self, event: RawEvent) -> Result<(), SessionError> {
        self.require_started("record")?;
        self.pending.record(event);
        Ok(())
    }

    /// Append a finished suite and write its section immediately
    pub fn add_suite(&mut self, suite: TestSuite) -> Result<(), SessionError> {
        self.require_started("add a suite")?;
        let section = self.formatter.format_suite(&suite);
        if !section.is_empty() {
            self.write(&section)?;
        }
        debug!("Suite {} added ({} tests)", suite.file_path, suite.tests.len());
        self.suites.push(suite);
        Ok(())
    }

    /// Write every suite collected from recorded events, in first-seen order
    pub fn flush_pending(&mut self) -> Result<(), SessionError> {
        self.require_started("flush suites")?;
        for suite in self.pending.drain() {
            self.add_suite(suite)?;
        }
        Ok(())
    }

    /// 1 when any written or pending suite has a failed test or a
    /// setup/teardown error, else 0
    pub fn computed_exit_code(&self) -> i32 {
        let failing = self.suites.iter().chain(self.pending.suites()).any(|s| s.has_failures());
        if failing { 1 } else { 0 }
    }

    /// Write pending suites, the summary and detected patterns, then release the sink.
    ///
    /// The session is `Finished` afterwards even when a write fails, so a
    /// partially written tail is never repeated.
    pub fn finish(&mut self, exit_code: i32) -> Result<W, SessionError> {
        self.require_started("finish")?;
        let written = self.flush_pending().and_then(|()| self.write_tail(exit_code));

        self.state = SessionState::Finished;
        let mut sink = self.sink.take().ok_or(SessionError::AlreadyFinished { operation: "finish" })?;
        let duration = written?;
        sink.flush()?;
        debug!("Session finished with exit code {} after {:.2}s", exit_code, duration);
        Ok(sink)
    }

    fn write_tail(&mut self, exit_code: i32) -> Result<f64, SessionError> {
        let duration = self
            .started_at
            .and_then(|start| (Local::now() - start).to_std().ok())
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0);

        let mut tail = self.formatter.format_summary(&self.suites, duration, exit_code);
        if self.detect_patterns {
            tail.push_str(&generate_pattern_summary(&detect_patterns(&self.suites)));
        }
        self.write(&tail)?;
        Ok(duration)
    }

    fn require_started(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Started => Ok(()),
            SessionState::NotStarted => Err(SessionError::NotStarted { operation }),
            SessionState::Finished => Err(SessionError::AlreadyFinished { operation }),
        }
    }

    fn write(&mut self, text: &str) -> Result<(), SessionError> {
        let sink = self.sink.as_mut().ok_or(SessionError::AlreadyFinished { operation: "write" })?;
        sink.write_all(text.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
