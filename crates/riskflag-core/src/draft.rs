//! Compliance draft generation.
//!
//! For each flagged record a prompt is built from exactly three fields
//! (`Audit_ID`, `Risk_Score`, `Status`) and sent with a fixed system
//! instruction to the text-generation capability. Each record yields one
//! [`DraftResult`]; a failed call never stops the remaining records.

use crate::dataset::AuditRecord;
use crate::obs;
use crate::sink::DraftSink;
use riskflag_gcp::{GenerationRequest, TextGenerator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Fixed instruction paired with every prompt.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a Senior Compliance Communication Agent. Your sole purpose is to draft formal, \
high-priority warning emails to the Compliance Director based on 'High Risk' audit records.

Core Instructions:
1. Strict Data Adherence: Use only the provided Audit_ID and Risk_Score.
2. Tone: Authoritative, urgent, and objective. Avoid \"disaster\" language.
3. No Hallucinations: Do not invent failure reasons or regulations. If unknown, \
state \"specific failure triggers are under review.\"
4. Structure:
   - Subject: [URGENT] Audit_ID
   - Body: Summary, data table, and \"Next Steps\" call to action.
";

/// Text shown in place of a draft when generation failed.
pub const FAILURE_SENTINEL: &str = "Drafting error.";

pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_DRAFT_TIMEOUT_SECS: u64 = 60;

/// Prompt for one record. Only `Audit_ID`, `Risk_Score` and `Status` are
/// ever included.
pub fn build_prompt(record: &AuditRecord) -> String {
    format!(
        "Data: Audit_ID: {}, Risk_Score: {}, Status: {}",
        record.audit_id, record.risk_score, record.status
    )
}

/// Drafting parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftOptions {
    /// Model selector passed to the capability.
    pub model: String,
    /// Sampling temperature; kept low for repeatable output.
    pub temperature: f32,
    /// Upper bound for a single generation call.
    pub timeout_secs: u64,
}

impl Default for DraftOptions {
    fn default() -> Self {
        Self {
            model: riskflag_gcp::config::DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_DRAFT_TIMEOUT_SECS,
        }
    }
}

impl DraftOptions {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Result of drafting for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DraftOutcome {
    /// Trimmed generated text.
    Drafted { text: String },
    /// Generation failed; `reason` is for logs, never shown as the draft.
    Failed { reason: String },
}

/// Draft for one flagged record, keyed by `Audit_ID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftResult {
    pub audit_id: String,
    pub outcome: DraftOutcome,
}

impl DraftResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DraftOutcome::Drafted { .. })
    }

    /// Draft text, or [`FAILURE_SENTINEL`] when generation failed.
    pub fn text(&self) -> &str {
        match &self.outcome {
            DraftOutcome::Drafted { text } => text,
            DraftOutcome::Failed { .. } => FAILURE_SENTINEL,
        }
    }
}

/// Counts of drafting outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftTally {
    pub succeeded: usize,
    pub failed: usize,
}

impl DraftTally {
    pub fn record(&mut self, result: &DraftResult) {
        if result.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Drafts compliance warnings through a [`TextGenerator`].
pub struct DraftGenerator {
    generator: Arc<dyn TextGenerator>,
    options: DraftOptions,
}

impl DraftGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, options: DraftOptions) -> Self {
        Self { generator, options }
    }

    pub fn options(&self) -> &DraftOptions {
        &self.options
    }

    fn request_for(&self, record: &AuditRecord) -> GenerationRequest {
        GenerationRequest::new(&self.options.model, &build_prompt(record))
            .with_system_instruction(SYSTEM_INSTRUCTION)
            .with_temperature(self.options.temperature)
    }

    /// Draft for a single record. Never fails: any error becomes
    /// [`DraftOutcome::Failed`].
    pub async fn draft(&self, record: &AuditRecord) -> DraftResult {
        obs::emit_draft_started(&record.audit_id);
        let request = self.request_for(record);
        let timeout = Duration::from_secs(self.options.timeout_secs);

        let outcome =
            match tokio::time::timeout(timeout, self.generator.generate(&request)).await {
                Ok(Ok(text)) => {
                    let text = text.trim();
                    if text.is_empty() {
                        DraftOutcome::Failed {
                            reason: "service returned an empty response".to_string(),
                        }
                    } else {
                        DraftOutcome::Drafted {
                            text: text.to_string(),
                        }
                    }
                }
                Ok(Err(e)) => DraftOutcome::Failed {
                    reason: e.to_string(),
                },
                Err(_) => DraftOutcome::Failed {
                    reason: format!("generation timed out after {}s", self.options.timeout_secs),
                },
            };

        match &outcome {
            DraftOutcome::Drafted { text } => obs::emit_draft_completed(&record.audit_id, text.len()),
            DraftOutcome::Failed { reason } => obs::emit_draft_failed(&record.audit_id, reason),
        }

        DraftResult {
            audit_id: record.audit_id.clone(),
            outcome,
        }
    }

    /// Draft every record in order, emitting each result to `sink` as soon
    /// as it is ready.
    pub async fn draft_all<'a, I>(&self, records: I, sink: &mut dyn DraftSink) -> DraftTally
    where
        I: IntoIterator<Item = &'a AuditRecord>,
    {
        let mut tally = DraftTally::default();
        for record in records {
            let result = self.draft(record).await;
            tally.record(&result);
            sink.emit(&result);
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RiskScore;
    use crate::sink::CollectingSink;
    use riskflag_gcp::fakes::ScriptedGenerator;

    fn flagged(id: &str, score: f64) -> AuditRecord {
        let mut record = AuditRecord::new(id, "", "Fail");
        record.risk_score = RiskScore::Score(score);
        record.high_risk_flag = Some(true);
        record.extra = vec!["confidential auditor note".to_string()];
        record
    }

    #[test]
    fn test_prompt_contains_only_core_fields() {
        let prompt = build_prompt(&flagged("A1", 95.0));
        assert_eq!(prompt, "Data: Audit_ID: A1, Risk_Score: 95.0, Status: Fail");
        assert!(!prompt.contains("confidential"));
    }

    #[test]
    fn test_system_instruction_constraints() {
        assert!(SYSTEM_INSTRUCTION.contains("Senior Compliance Communication Agent"));
        assert!(SYSTEM_INSTRUCTION.contains("Use only the provided Audit_ID and Risk_Score"));
        assert!(SYSTEM_INSTRUCTION.contains("Do not invent failure reasons"));
        assert!(SYSTEM_INSTRUCTION.contains("[URGENT] Audit_ID"));
        assert!(SYSTEM_INSTRUCTION.contains("Next Steps"));
    }

    #[tokio::test]
    async fn test_draft_trims_and_sends_parameters() {
        let fake = Arc::new(ScriptedGenerator::new("\n  Subject: [URGENT] A1\nBody  \n"));
        let drafter = DraftGenerator::new(fake.clone(), DraftOptions::new("gemini-2.0-flash"));

        let result = drafter.draft(&flagged("A1", 95.0)).await;
        assert_eq!(result.audit_id, "A1");
        assert_eq!(result.text(), "Subject: [URGENT] A1\nBody");

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "gemini-2.0-flash");
        assert_eq!(calls[0].system_instruction.as_deref(), Some(SYSTEM_INSTRUCTION));
        assert!((calls[0].temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
        assert!(calls[0].prompt.contains("A1") && calls[0].prompt.contains("95.0"));
    }

    #[tokio::test]
    async fn test_failure_becomes_sentinel() {
        let fake = Arc::new(ScriptedGenerator::new("ok").failing_on("A2"));
        let drafter = DraftGenerator::new(fake, DraftOptions::default());

        let result = drafter.draft(&flagged("A2", 90.0)).await;
        assert!(!result.is_success());
        assert_eq!(result.text(), FAILURE_SENTINEL);
        match result.outcome {
            DraftOutcome::Failed { reason } => assert!(reason.contains("unreachable")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_response_is_failure() {
        let fake = Arc::new(ScriptedGenerator::new("   \n"));
        let drafter = DraftGenerator::new(fake, DraftOptions::default());
        let result = drafter.draft(&flagged("A1", 95.0)).await;
        assert_eq!(result.text(), FAILURE_SENTINEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let fake = Arc::new(ScriptedGenerator::new("late").with_delay(Duration::from_secs(120)));
        let drafter = DraftGenerator::new(fake, DraftOptions::default().with_timeout_secs(5));

        let result = drafter.draft(&flagged("A1", 95.0)).await;
        match result.outcome {
            DraftOutcome::Failed { reason } => assert!(reason.contains("timed out")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_draft_all_isolates_failures() {
        let fake = Arc::new(ScriptedGenerator::new("draft body").failing_on("Audit_ID: B2,"));
        let drafter = DraftGenerator::new(fake.clone(), DraftOptions::default());
        let records = vec![flagged("B1", 85.0), flagged("B2", 90.0), flagged("B3", 99.0)];
        let mut sink = CollectingSink::default();

        let tally = drafter.draft_all(&records, &mut sink).await;

        assert_eq!(tally, DraftTally { succeeded: 2, failed: 1 });
        assert_eq!(fake.call_count(), 3);
        let ids: Vec<_> = sink.results.iter().map(|r| r.audit_id.as_str()).collect();
        assert_eq!(ids, vec!["B1", "B2", "B3"]);
        assert_eq!(sink.results[1].text(), FAILURE_SENTINEL);
        assert_eq!(sink.results[2].text(), "draft body");
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let result = DraftResult {
            audit_id: "A1".to_string(),
            outcome: DraftOutcome::Drafted {
                text: "hello".to_string(),
            },
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["outcome"]["status"], "drafted");
        assert_eq!(value["outcome"]["text"], "hello");
    }
}
