//! Structured observability hooks for the audit pipeline.
//!
//! This module provides:
//! - Run-scoped tracing spans via [`run_span`], attached to the run future
//!   with `Instrument` so the span follows the task across await points
//! - Emission functions for lifecycle events: run start/finish/abort,
//!   stage transitions, flagging, artifact persistence and per-record drafts
//!
//! Field names are stable so JSON log consumers can filter on `event`.

use std::path::Path;
use tracing::{error, info, warn};

/// Span tagged with the run_id.
///
/// # Example
///
/// ```ignore
/// AuditPipeline::run_with_id(..).instrument(run_span(&run_id)).await
/// ```
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("riskflag.run", run_id = %run_id)
}

/// Emit event: run started for an input source.
pub fn emit_run_started(run_id: &str, origin: &str) {
    info!(event = "run.started", run_id = %run_id, origin = %origin, "Starting audit pipeline");
}

/// Emit event: the state machine entered a stage.
pub fn emit_stage_entered(stage: &str) {
    info!(event = "stage.entered", stage = %stage);
}

/// Emit event: dataset loaded.
pub fn emit_records_loaded(origin: &str, records: usize) {
    info!(
        event = "records.loaded",
        origin = %origin,
        records = records,
        "Successfully loaded {} records",
        records
    );
}

/// Emit event: normalization finished.
pub fn emit_scores_normalized(coerced: usize, defaulted: usize) {
    info!(
        event = "scores.normalized",
        coerced = coerced,
        defaulted = defaulted,
        "Cleaned 'Risk_Score' column"
    );
}

/// Emit event: flagging finished.
pub fn emit_records_flagged(flagged: usize, total: usize) {
    info!(
        event = "records.flagged",
        flagged = flagged,
        total = total,
        "Flagging complete. {} high-risk records identified",
        flagged
    );
}

/// Emit event: cleaned artifact written.
pub fn emit_artifact_written(path: &Path, rows: usize, sha256: &str) {
    info!(
        event = "artifact.written",
        path = %path.display(),
        rows = rows,
        sha256 = %sha256,
        "Processed data saved"
    );
}

/// Emit event: cleaned artifact could not be written (warning level).
pub fn emit_artifact_persist_failed(path: &Path, error: &dyn std::fmt::Display) {
    warn!(
        event = "artifact.persist_failed",
        path = %path.display(),
        error = %error,
        "Failed to save cleaned data; continuing in memory"
    );
}

/// Emit event: drafting started for a record.
pub fn emit_draft_started(audit_id: &str) {
    info!(event = "draft.started", audit_id = %audit_id, "Drafting email for audit");
}

/// Emit event: draft produced for a record.
pub fn emit_draft_completed(audit_id: &str, chars: usize) {
    info!(event = "draft.completed", audit_id = %audit_id, chars = chars);
}

/// Emit event: drafting failed for a record (error level).
pub fn emit_draft_failed(audit_id: &str, reason: &str) {
    error!(
        event = "draft.failed",
        audit_id = %audit_id,
        reason = %reason,
        "Failed to draft for audit"
    );
}

/// Emit event: run finished.
pub fn emit_run_finished(
    run_id: &str,
    duration_ms: u64,
    flagged: usize,
    drafted: usize,
    failed: usize,
) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        flagged = flagged,
        drafted = drafted,
        failed = failed,
    );
}

/// Emit event: run aborted before completion (error level).
pub fn emit_run_aborted(run_id: &str, stage: &str, error: &dyn std::fmt::Display) {
    error!(
        event = "run.aborted",
        run_id = %run_id,
        stage = %stage,
        error = %error,
        "Pipeline aborted"
    );
}
