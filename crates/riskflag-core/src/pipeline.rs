//! Audit pipeline orchestration.
//!
//! Linear state machine:
//!
//! ```text
//! LOAD -> NORMALIZE -> FLAG -> PERSIST_CLEANED -> (no flagged: DONE) -> GENERATE_DRAFTS -> DONE
//! ```
//!
//! Only a load failure or a generator that cannot be built abort the run.
//! A failed artifact write is logged and the run carries on in memory.

use crate::config::RiskflagConfig;
use crate::dataset::{CleanedArtifact, Dataset};
use crate::draft::{DraftGenerator, DraftTally};
use crate::error::{PipelineError, Result};
use crate::flagging::apply_flags;
use crate::normalizer::{normalize, NormalizeReport};
use crate::obs;
use crate::sink::DraftSink;
use chrono::{DateTime, Utc};
use riskflag_gcp::GeneratorFactory;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{info, Instrument};
use uuid::Uuid;

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Normalize,
    Flag,
    PersistCleaned,
    GenerateDrafts,
    Done,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Normalize => "normalize",
            Stage::Flag => "flag",
            Stage::PersistCleaned => "persist_cleaned",
            Stage::GenerateDrafts => "generate_drafts",
            Stage::Done => "done",
        }
    }
}

/// Terminal result of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// No record was flagged; generation was never attempted.
    NoHighRisk,
    /// Drafting ran for every flagged record.
    Drafted(DraftTally),
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Records loaded from the source.
    pub records: usize,
    pub normalize: NormalizeReport,
    /// Records with `High_Risk_Flag == true`.
    pub flagged: usize,
    /// Cleaned artifact, when it was written. Absence is not a failure.
    pub artifact: Option<CleanedArtifact>,
    pub outcome: RunOutcome,
    pub duration_ms: u64,
}

impl RunOutcome {
    pub fn tally(&self) -> DraftTally {
        match self {
            RunOutcome::NoHighRisk => DraftTally::default(),
            RunOutcome::Drafted(tally) => *tally,
        }
    }
}

impl PipelineSummary {
    pub fn drafts(&self) -> DraftTally {
        self.outcome.tally()
    }
}

/// Result of the deterministic half of the pipeline.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub dataset: Dataset,
    pub normalize: NormalizeReport,
    pub flagged: usize,
    pub artifact: Option<CleanedArtifact>,
}

/// Audit pipeline orchestrator.
pub struct AuditPipeline;

impl AuditPipeline {
    /// Execute the full pipeline.
    ///
    /// The generator is built through `factory` only when at least one record
    /// is flagged, so a run without high-risk records succeeds even when the
    /// generation settings are incomplete.
    pub async fn run(
        config: &RiskflagConfig,
        factory: &dyn GeneratorFactory,
        sink: &mut dyn DraftSink,
    ) -> Result<PipelineSummary> {
        let run_id = Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id);
        Self::run_with_id(run_id, config, factory, sink)
            .instrument(span)
            .await
    }

    async fn run_with_id(
        run_id: String,
        config: &RiskflagConfig,
        factory: &dyn GeneratorFactory,
        sink: &mut dyn DraftSink,
    ) -> Result<PipelineSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        let origin = config.input.to_string();
        obs::emit_run_started(&run_id, &origin);

        let cleaned = match Self::clean(config).await {
            Ok(cleaned) => cleaned,
            Err(e) => {
                obs::emit_run_aborted(&run_id, Stage::Load.name(), &e);
                return Err(e);
            }
        };

        let outcome = if cleaned.flagged == 0 {
            info!("No high-risk records detected. Process finished.");
            RunOutcome::NoHighRisk
        } else {
            obs::emit_stage_entered(Stage::GenerateDrafts.name());
            info!(
                flagged = cleaned.flagged,
                "Found {} high-risk records. Initializing draft generator...", cleaned.flagged
            );
            let generator = match factory.connect() {
                Ok(generator) => generator,
                Err(e) => {
                    let err = PipelineError::GeneratorInit(e);
                    obs::emit_run_aborted(&run_id, Stage::GenerateDrafts.name(), &err);
                    return Err(err);
                }
            };
            let drafter = DraftGenerator::new(generator, config.draft.clone());
            let tally = drafter.draft_all(cleaned.dataset.flagged(), sink).await;
            RunOutcome::Drafted(tally)
        };

        obs::emit_stage_entered(Stage::Done.name());
        let duration_ms = start.elapsed().as_millis() as u64;
        let tally = outcome.tally();
        obs::emit_run_finished(
            &run_id,
            duration_ms,
            cleaned.flagged,
            tally.succeeded,
            tally.failed,
        );

        Ok(PipelineSummary {
            run_id,
            started_at,
            records: cleaned.dataset.len(),
            normalize: cleaned.normalize,
            flagged: cleaned.flagged,
            artifact: cleaned.artifact,
            outcome,
            duration_ms,
        })
    }

    /// LOAD, NORMALIZE, FLAG and PERSIST_CLEANED. Needs no generation
    /// configuration.
    pub async fn clean(config: &RiskflagConfig) -> Result<CleanedDataset> {
        obs::emit_stage_entered(Stage::Load.name());
        let origin = config.input.to_string();
        let mut dataset = config
            .input
            .load(&config.storage)
            .await
            .map_err(|error| PipelineError::Load {
                origin: origin.clone(),
                error,
            })?;
        obs::emit_records_loaded(&origin, dataset.len());

        let (normalize, flagged) = Self::normalize_and_flag(&mut dataset);

        obs::emit_stage_entered(Stage::PersistCleaned.name());
        let artifact = Self::persist(&dataset, &config.output_path);

        Ok(CleanedDataset {
            dataset,
            normalize,
            flagged,
            artifact,
        })
    }

    /// NORMALIZE then FLAG, in place.
    pub fn normalize_and_flag(dataset: &mut Dataset) -> (NormalizeReport, usize) {
        obs::emit_stage_entered(Stage::Normalize.name());
        let report = normalize(dataset);
        obs::emit_scores_normalized(report.coerced, report.defaulted);

        obs::emit_stage_entered(Stage::Flag.name());
        let flagged = apply_flags(dataset);
        obs::emit_records_flagged(flagged, dataset.len());
        (report, flagged)
    }

    /// Best-effort write of the cleaned artifact.
    fn persist(dataset: &Dataset, path: &Path) -> Option<CleanedArtifact> {
        match dataset.write_to_path(path) {
            Ok(artifact) => {
                obs::emit_artifact_written(&artifact.path, artifact.rows, &artifact.sha256);
                Some(artifact)
            }
            Err(e) => {
                obs::emit_artifact_persist_failed(path, &e);
                None
            }
        }
    }

    /// Draft for the flagged rows of an already-cleaned dataset.
    ///
    /// Flags are recomputed on load, so a stale or hand-edited
    /// `High_Risk_Flag` column cannot select records.
    pub async fn draft_cleaned(
        config: &RiskflagConfig,
        factory: &dyn GeneratorFactory,
        sink: &mut dyn DraftSink,
    ) -> Result<RunOutcome> {
        let span = obs::run_span(&Uuid::new_v4().to_string());
        Self::draft_cleaned_inner(config, factory, sink)
            .instrument(span)
            .await
    }

    async fn draft_cleaned_inner(
        config: &RiskflagConfig,
        factory: &dyn GeneratorFactory,
        sink: &mut dyn DraftSink,
    ) -> Result<RunOutcome> {
        let origin = config.input.to_string();
        let mut dataset = config
            .input
            .load(&config.storage)
            .await
            .map_err(|error| PipelineError::Load {
                origin: origin.clone(),
                error,
            })?;
        let (_, flagged) = Self::normalize_and_flag(&mut dataset);

        if flagged == 0 {
            info!("No high-risk audits found. No emails to draft.");
            return Ok(RunOutcome::NoHighRisk);
        }

        let generator = factory.connect().map_err(PipelineError::GeneratorInit)?;
        let drafter = DraftGenerator::new(generator, config.draft.clone());
        info!("Processing {} high-risk records...", flagged);
        let tally = drafter.draft_all(dataset.flagged(), sink).await;
        Ok(RunOutcome::Drafted(tally))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Load.name(), "load");
        assert_eq!(Stage::PersistCleaned.name(), "persist_cleaned");
        assert_eq!(Stage::GenerateDrafts.name(), "generate_drafts");
    }

    #[test]
    fn test_summary_drafts_for_no_high_risk() {
        let summary = PipelineSummary {
            run_id: "r".to_string(),
            started_at: Utc::now(),
            records: 3,
            normalize: NormalizeReport::default(),
            flagged: 0,
            artifact: None,
            outcome: RunOutcome::NoHighRisk,
            duration_ms: 1,
        };
        assert_eq!(summary.drafts(), DraftTally::default());
    }

    #[test]
    fn test_outcomes_serialize_distinctly() {
        let none = serde_json::to_value(RunOutcome::NoHighRisk).unwrap();
        let some = serde_json::to_value(RunOutcome::Drafted(DraftTally {
            succeeded: 2,
            failed: 1,
        }))
        .unwrap();
        assert_eq!(none["kind"], "no_high_risk");
        assert_eq!(some["kind"], "drafted");
        assert_eq!(some["succeeded"], 2);
    }

    #[test]
    fn test_normalize_and_flag_idempotent() {
        let mut ds = Dataset::from_csv_str(
            "Audit_ID,Risk_Score,Status\nA1,95,Fail\nA2,not_a_number,Fail\nA3,81,Pass\n",
        )
        .unwrap();
        let (_, first) = AuditPipeline::normalize_and_flag(&mut ds);
        let snapshot = ds.clone();
        let (report, second) = AuditPipeline::normalize_and_flag(&mut ds);

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(report.coerced, 0);
        assert_eq!(ds, snapshot);
    }
}
