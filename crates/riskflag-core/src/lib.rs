//! riskflag Core Library
//!
//! Loads raw audit records, normalizes risk scores, flags high-risk rows,
//! persists the cleaned dataset and drafts a compliance notice for every
//! flagged record through a [`TextGenerator`].

pub mod config;
pub mod dataset;
pub mod draft;
pub mod error;
pub mod flagging;
pub mod normalizer;
pub mod obs;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod telemetry;

pub use config::RiskflagConfig;
pub use dataset::{
    AuditRecord, CleanedArtifact, Dataset, RiskScore, COL_AUDIT_ID, COL_HIGH_RISK_FLAG,
    COL_RISK_SCORE, COL_STATUS,
};
pub use draft::{
    build_prompt, DraftGenerator, DraftOptions, DraftOutcome, DraftResult, DraftTally,
    FAILURE_SENTINEL, SYSTEM_INSTRUCTION,
};
pub use error::{DatasetError, PipelineError, Result};
pub use flagging::{apply_flags, is_high_risk, FAIL_STATUS, RISK_THRESHOLD};
pub use normalizer::{coerce_risk_score, normalize, parse_risk_score, NormalizeReport};
pub use pipeline::{AuditPipeline, CleanedDataset, PipelineSummary, RunOutcome, Stage};
pub use sink::{CollectingSink, ConsoleSink, DraftSink, LogSink};
pub use source::DatasetSource;

pub use obs::{
    emit_artifact_persist_failed, emit_artifact_written, emit_draft_completed, emit_draft_failed,
    emit_draft_started, emit_records_flagged, emit_records_loaded, emit_run_aborted,
    emit_run_finished, emit_run_started, emit_scores_normalized, emit_stage_entered, run_span,
};

pub use riskflag_gcp::{
    GcpError, GcsObject, GenerationRequest, GeneratorFactory, StorageConfig, TextGenerator,
    VertexConfig,
};
