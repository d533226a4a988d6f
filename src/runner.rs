use crate::adapter::RawEventSource;
use crate::session::{SessionError, StreamingSession};
use crate::types::RawEvent;
use log::debug;
use std::io::Write;

/// Result of driving one run through a session
#[derive(Debug)]
pub struct RunOutcome<W> {
    pub exit_code: i32,
    pub events: usize,
    pub sink: W,
}

/// Drive every event of `source` through `session` and finish the report.
///
/// This is the main entry point for producing a report.
/// The callback is invoked for each event before it is recorded.
///
/// The exit code is 1 when any test failed, any suite had a setup or teardown
/// error, or the runner itself reported failure; otherwise 0.
pub fn run_report<S, W, F>(
    source: &mut S,
    mut session: StreamingSession<W>,
    mut on_event: F,
) -> Result<RunOutcome<W>, SessionError>
where
    S: RawEventSource + ?Sized,
    W: Write,
    F: FnMut(&RawEvent),
{
    session.start()?;

    let mut events = 0;
    while let Some(event) = source.next_event().map_err(SessionError::Input)? {
        on_event(&event);
        session.record(event)?;
        events += 1;
    }
    debug!("Consumed {} events", events);

    let hinted = source.exit_code_hint().unwrap_or(0);
    let exit_code = if hinted != 0 { 1 } else { session.computed_exit_code() };

    let sink = session.finish(exit_code)?;
    Ok(RunOutcome { exit_code, events, sink })
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod runner_test;
