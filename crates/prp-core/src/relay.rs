//! Stream-json relay.
//!
//! Reads the agent's stdout one line at a time. Every line that parses as JSON
//! is re-serialized onto the primary output, in order; known event shapes also
//! produce a human-readable progress note on the diagnostic output. Lines that
//! fail to parse are reported and skipped.

use std::future::Future;
use std::io::Write;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, trace};

use crate::error::Result;
use crate::event::{classify, parse_line, EventKind, ParsedLine, ResultSummary};

/// Counters for one relay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Lines forwarded to the primary output.
    pub forwarded: usize,
    /// Lines that were not valid JSON.
    pub malformed: usize,
    /// Blank lines skipped.
    pub blank: usize,
}

/// How a relay loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The agent closed its stdout.
    Finished,
    /// The cancellation future fired first.
    Cancelled,
}

/// Forwards parsed events to `out` and progress notes to `diag`.
pub struct StreamRelay<O, D> {
    out: O,
    diag: D,
    stats: RelayStats,
    events: Vec<Value>,
}

impl<O: Write, D: Write> StreamRelay<O, D> {
    pub fn new(out: O, diag: D) -> Self {
        Self {
            out,
            diag,
            stats: RelayStats::default(),
            events: Vec::new(),
        }
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Events forwarded so far, in order.
    pub fn events(&self) -> &[Value] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Value> {
        self.events
    }

    /// Handle one raw line of agent output.
    pub fn relay_line(&mut self, line: &str) -> std::io::Result<()> {
        match parse_line(line) {
            None => {
                self.stats.blank += 1;
            }
            Some(ParsedLine::Malformed { raw, error }) => {
                self.stats.malformed += 1;
                debug!(error = %error, "skipping malformed stream line");
                writeln!(self.diag, "Warning: failed to parse JSON line: {error}")?;
                writeln!(self.diag, "Line content: {raw}")?;
            }
            Some(ParsedLine::Event(value)) => {
                self.report(&value)?;
                serde_json::to_writer(&mut self.out, &value)?;
                self.out.write_all(b"\n")?;
                self.out.flush()?;
                self.stats.forwarded += 1;
                self.events.push(value);
            }
        }
        Ok(())
    }

    fn report(&mut self, value: &Value) -> std::io::Result<()> {
        match classify(value) {
            EventKind::SessionInit { session_id } => {
                writeln!(
                    self.diag,
                    "Session started: {}",
                    session_id.as_deref().unwrap_or("unknown")
                )
            }
            EventKind::Assistant { preview } => writeln!(self.diag, "Assistant: {preview}..."),
            EventKind::Result(summary) => write_stream_summary(&mut self.diag, &summary),
            EventKind::Other => {
                trace!("unclassified event");
                Ok(())
            }
        }
    }

    /// Relay every line from `reader` until it ends or `cancel` resolves.
    ///
    /// `cancel` is polled alongside each read, so a pending read never delays
    /// cancellation.
    pub async fn run<R, C>(&mut self, reader: R, cancel: C) -> Result<RelayOutcome>
    where
        R: AsyncBufRead + Unpin,
        C: Future<Output = ()>,
    {
        let mut lines = reader.split(b'\n');
        tokio::pin!(cancel);

        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    debug!(stats = ?self.stats, "relay cancelled");
                    return Ok(RelayOutcome::Cancelled);
                }
                segment = lines.next_segment() => match segment? {
                    Some(bytes) => {
                        let line = String::from_utf8_lossy(&bytes);
                        self.relay_line(&line)?;
                    }
                    None => {
                        debug!(stats = ?self.stats, "relay finished");
                        return Ok(RelayOutcome::Finished);
                    }
                },
            }
        }
    }
}

/// Multi-line summary of a stream `result` event.
fn write_stream_summary<W: Write>(w: &mut W, summary: &ResultSummary) -> std::io::Result<()> {
    writeln!(w)?;
    writeln!(w, "Final result:")?;
    writeln!(w, "  Success: {}", summary.stream_success())?;
    writeln!(w, "  Cost: {}", summary.cost_display())?;
    writeln!(w, "  Duration: {}ms", summary.duration_ms)?;
    writeln!(w, "  Turns: {}", summary.num_turns)?;
    if let Some(text) = &summary.result {
        writeln!(w)?;
        writeln!(w, "Result text:")?;
        writeln!(w, "{text}")?;
    }
    Ok(())
}
