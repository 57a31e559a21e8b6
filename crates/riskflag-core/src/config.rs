//! Process-wide configuration.
//!
//! Built once at startup (after `.env` loading in the binaries) and passed by
//! reference into each pipeline run.

use crate::draft::DraftOptions;
use crate::source::DatasetSource;
use riskflag_gcp::{StorageConfig, VertexConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the input dataset (path or `gs://` URI).
pub const ENV_INPUT: &str = "RISKFLAG_INPUT";
/// Environment variable naming the cleaned artifact path.
pub const ENV_OUTPUT: &str = "RISKFLAG_OUTPUT";

pub const DEFAULT_INPUT: &str = "data/data.csv";
pub const DEFAULT_OUTPUT: &str = "output/cleaned_audits.csv";

/// Everything a pipeline run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskflagConfig {
    /// Raw dataset origin
    pub input: DatasetSource,
    /// Cleaned artifact destination
    pub output_path: PathBuf,
    /// Drafting parameters
    pub draft: DraftOptions,
    /// Generation capability settings (validated lazily)
    pub vertex: VertexConfig,
    /// Object storage settings
    pub storage: StorageConfig,
}

impl Default for RiskflagConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl RiskflagConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let vertex = VertexConfig::from_lookup(&lookup);
        RiskflagConfig {
            input: DatasetSource::parse(&get(ENV_INPUT).unwrap_or_else(|| DEFAULT_INPUT.to_string())),
            output_path: PathBuf::from(get(ENV_OUTPUT).unwrap_or_else(|| DEFAULT_OUTPUT.to_string())),
            draft: DraftOptions::new(&vertex.model_id),
            storage: StorageConfig::from_lookup(&lookup),
            vertex,
        }
    }

    pub fn with_input(mut self, input: DatasetSource) -> Self {
        self.input = input;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Select the model for both drafting and the Vertex client.
    pub fn with_model(mut self, model: &str) -> Self {
        self.vertex.model_id = model.to_string();
        self.draft.model = model.to_string();
        self
    }

    /// Per-call generation bound, applied to both the drafting timeout and
    /// the Vertex HTTP client. Zero is raised to one second.
    pub fn with_draft_timeout_secs(mut self, timeout_secs: u64) -> Self {
        let timeout_secs = timeout_secs.max(1);
        self.draft.timeout_secs = timeout_secs;
        self.vertex.timeout_secs = timeout_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskflag_gcp::GcsObject;

    #[test]
    fn test_defaults() {
        let config = RiskflagConfig::from_lookup(|_| None);
        assert_eq!(config.input, DatasetSource::Local(PathBuf::from(DEFAULT_INPUT)));
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(config.draft.model, riskflag_gcp::config::DEFAULT_MODEL);
        assert!((config.draft.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_env_overrides() {
        let config = RiskflagConfig::from_lookup(|key| match key {
            ENV_INPUT => Some("gs://audits/weekly.csv".to_string()),
            ENV_OUTPUT => Some("/tmp/out.csv".to_string()),
            riskflag_gcp::config::ENV_MODEL => Some("gemini-2.5-flash".to_string()),
            _ => None,
        });
        assert_eq!(config.input, DatasetSource::Gcs(GcsObject::new("audits", "weekly.csv")));
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.csv"));
        assert_eq!(config.draft.model, "gemini-2.5-flash");
        assert_eq!(config.vertex.model_id, "gemini-2.5-flash");
    }

    #[test]
    fn test_with_model_keeps_both_in_sync() {
        let config = RiskflagConfig::from_lookup(|_| None).with_model("m-1");
        assert_eq!(config.draft.model, "m-1");
        assert_eq!(config.vertex.model_id, "m-1");
    }

    #[test]
    fn test_timeout_override_reaches_client() {
        let config = RiskflagConfig::from_lookup(|_| None).with_draft_timeout_secs(120);
        assert_eq!(config.draft.timeout_secs, 120);
        assert_eq!(config.vertex.timeout_secs, 120);
    }

    #[test]
    fn test_zero_timeout_is_raised() {
        let config = RiskflagConfig::from_lookup(|_| None).with_draft_timeout_secs(0);
        assert_eq!(config.draft.timeout_secs, 1);
        assert_eq!(config.vertex.timeout_secs, 1);
    }
}
