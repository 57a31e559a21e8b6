//! Where the raw dataset comes from.

use crate::dataset::Dataset;
use crate::error::DatasetError;
use riskflag_gcp::{GcsClient, GcsObject, StorageConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Origin of the raw audit CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSource {
    /// File on the local filesystem.
    Local(PathBuf),
    /// Object in a Cloud Storage bucket.
    Gcs(GcsObject),
    /// CSV text already in memory.
    Inline(String),
}

impl DatasetSource {
    /// `gs://bucket/object` becomes [`DatasetSource::Gcs`]; anything else is a
    /// local path.
    pub fn parse(location: &str) -> Self {
        match GcsObject::parse(location) {
            Some(object) => DatasetSource::Gcs(object),
            None => DatasetSource::Local(PathBuf::from(location)),
        }
    }

    /// Fetch and parse the dataset.
    pub async fn load(&self, storage: &StorageConfig) -> Result<Dataset, DatasetError> {
        match self {
            DatasetSource::Local(path) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        DatasetError::NotFound(path.clone())
                    } else {
                        DatasetError::Io {
                            path: path.clone(),
                            source: e,
                        }
                    }
                })?;
                Dataset::from_csv_str(&text)
            }
            DatasetSource::Gcs(object) => {
                let client = GcsClient::new(storage.clone())?;
                let text = client.download_text(object).await?;
                Dataset::from_csv_str(&text)
            }
            DatasetSource::Inline(text) => Dataset::from_csv_str(text),
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Local(path) => write!(f, "{}", path.display()),
            DatasetSource::Gcs(object) => write!(f, "{object}"),
            DatasetSource::Inline(_) => f.write_str("<inline>"),
        }
    }
}
