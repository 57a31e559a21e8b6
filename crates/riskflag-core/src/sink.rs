//! Draft sinks.
//!
//! Drafts are handed over one at a time as they complete; delivery beyond
//! the sink (email, ticketing) is not part of this crate.

use crate::draft::DraftResult;
use std::io::Write;

/// Receives each draft as soon as it is produced.
pub trait DraftSink: Send {
    fn emit(&mut self, result: &DraftResult);
}

/// Writes a separated text block per draft, tagged with the `Audit_ID`.
pub struct ConsoleSink<W: Write + Send> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

const RULE: &str = "--------------------------------------------------";

impl<W: Write + Send> DraftSink for ConsoleSink<W> {
    fn emit(&mut self, result: &DraftResult) {
        let written = writeln!(
            self.out,
            "{RULE}\nREPORT FOR AUDIT {}\n{}\n{RULE}",
            result.audit_id,
            result.text()
        )
        .and_then(|_| self.out.flush());

        if let Err(e) = written {
            tracing::warn!(audit_id = %result.audit_id, error = %e, "Failed to write draft to console");
        }
    }
}

/// Keeps every draft in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub results: Vec<DraftResult>,
}

impl DraftSink for CollectingSink {
    fn emit(&mut self, result: &DraftResult) {
        self.results.push(result.clone());
    }
}

/// Logs each draft through `tracing` instead of stdout; used by the daemon.
#[derive(Debug, Default)]
pub struct LogSink;

impl DraftSink for LogSink {
    fn emit(&mut self, result: &DraftResult) {
        tracing::info!(
            event = "draft.emitted",
            audit_id = %result.audit_id,
            success = result.is_success(),
            "REPORT FOR AUDIT {}\n{}",
            result.audit_id,
            result.text()
        );
    }
}
