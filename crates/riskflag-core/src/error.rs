//! Error taxonomy for riskflag-core.
//!
//! Malformed risk scores are not errors (they are defaulted by the
//! normalizer), and per-record generation failures are carried as
//! [`DraftOutcome::Failed`](crate::draft::DraftOutcome::Failed). What remains
//! here are the failures that end a run.

use riskflag_gcp::GcpError;
use std::path::PathBuf;

/// Errors produced while reading or writing a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column missing from header: {0}")]
    MissingColumn(&'static str),

    #[error("object storage error: {0}")]
    Storage(#[from] GcpError),
}

/// Run-level failures. Only these abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline aborted: input data from {origin} could not be loaded: {error}")]
    Load {
        origin: String,
        #[source]
        error: DatasetError,
    },

    #[error("pipeline aborted: draft generator could not be initialized: {0}")]
    GeneratorInit(#[source] GcpError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = DatasetError::NotFound(PathBuf::from("data/data.csv"));
        assert_eq!(err.to_string(), "input file not found: data/data.csv");
    }

    #[test]
    fn test_load_error_names_origin() {
        let err = PipelineError::Load {
            origin: "gs://bucket/audits.csv".to_string(),
            error: DatasetError::MissingColumn("Risk_Score"),
        };
        let msg = err.to_string();
        assert!(msg.contains("gs://bucket/audits.csv"));
        assert!(msg.contains("Risk_Score"));
    }

    #[test]
    fn test_generator_init_display() {
        let err = PipelineError::GeneratorInit(GcpError::MissingConfig("GOOGLE_CLOUD_PROJECT"));
        assert!(err.to_string().contains("GOOGLE_CLOUD_PROJECT"));
    }
}
