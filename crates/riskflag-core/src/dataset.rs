//! Audit dataset model and CSV codec.
//!
//! A [`Dataset`] keeps the input header order so the cleaned artifact has
//! the same columns as the source, followed by `High_Risk_Flag`. Columns
//! other than `Audit_ID`, `Risk_Score` and `Status` are carried through
//! untouched.

use crate::error::DatasetError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

pub const COL_AUDIT_ID: &str = "Audit_ID";
pub const COL_RISK_SCORE: &str = "Risk_Score";
pub const COL_STATUS: &str = "Status";
pub const COL_HIGH_RISK_FLAG: &str = "High_Risk_Flag";

/// Risk metric of one record, before or after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskScore {
    /// Value as read from the source, not yet coerced.
    Raw(String),
    /// Normalized numeric value.
    Score(f64),
}

impl RiskScore {
    /// Numeric value, if normalized.
    pub fn value(&self) -> Option<f64> {
        match self {
            RiskScore::Raw(_) => None,
            RiskScore::Score(v) => Some(*v),
        }
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskScore::Raw(raw) => f.write_str(raw),
            RiskScore::Score(v) => f.write_str(&format_score(*v)),
        }
    }
}

/// Render a score in float form: whole numbers keep one decimal (`95.0`).
pub fn format_score(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// One row of the audit dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub audit_id: String,
    pub risk_score: RiskScore,
    pub status: String,
    /// Derived by the flagging engine; `None` until flags are applied.
    pub high_risk_flag: Option<bool>,
    /// Values of the non-core columns, in header order.
    pub extra: Vec<String>,
}

impl AuditRecord {
    pub fn new(audit_id: &str, risk_score: &str, status: &str) -> Self {
        Self {
            audit_id: audit_id.to_string(),
            risk_score: RiskScore::Raw(risk_score.to_string()),
            status: status.to_string(),
            high_risk_flag: None,
            extra: Vec::new(),
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.high_risk_flag == Some(true)
    }
}

/// Column layout of a dataset: full header order (without the derived flag
/// column) and the positions of the core columns in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Layout {
    headers: Vec<String>,
    audit_id: usize,
    risk_score: usize,
    status: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            headers: vec![
                COL_AUDIT_ID.to_string(),
                COL_RISK_SCORE.to_string(),
                COL_STATUS.to_string(),
            ],
            audit_id: 0,
            risk_score: 1,
            status: 2,
        }
    }
}

/// Ordered collection of audit records sharing one schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    layout: Layout,
    /// Indices of `High_Risk_Flag` columns present in the input, dropped on load.
    #[serde(skip)]
    dropped_flags: Vec<usize>,
    pub records: Vec<AuditRecord>,
}

/// Fingerprint of a written cleaned artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedArtifact {
    pub path: PathBuf,
    pub rows: usize,
    /// SHA-256 of the written bytes, hex encoded.
    pub sha256: String,
}

impl Dataset {
    /// Dataset with the three core columns and the given records.
    pub fn new(records: Vec<AuditRecord>) -> Self {
        Dataset {
            records,
            ..Dataset::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Header row of the cleaned artifact.
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers = self.layout.headers.clone();
        headers.push(COL_HIGH_RISK_FLAG.to_string());
        headers
    }

    /// Records whose flag is set, in dataset order.
    pub fn flagged(&self) -> impl Iterator<Item = &AuditRecord> {
        self.records.iter().filter(|r| r.is_flagged())
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged().count()
    }

    /// Parse CSV text with a header row.
    ///
    /// Any `High_Risk_Flag` column in the input is ignored: the flag is always
    /// recomputed.
    pub fn from_csv_str(text: &str) -> Result<Self, DatasetError> {
        Self::from_reader(text.as_bytes())
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let header_row = rdr.headers()?.clone();

        let dropped_flags: Vec<usize> = header_row
            .iter()
            .enumerate()
            .filter(|(_, h)| *h == COL_HIGH_RISK_FLAG)
            .map(|(i, _)| i)
            .collect();
        let headers: Vec<String> = header_row
            .iter()
            .enumerate()
            .filter(|(i, _)| !dropped_flags.contains(i))
            .map(|(_, h)| h.to_string())
            .collect();

        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(DatasetError::MissingColumn(name))
        };
        let layout = Layout {
            audit_id: find(COL_AUDIT_ID)?,
            risk_score: find(COL_RISK_SCORE)?,
            status: find(COL_STATUS)?,
            headers,
        };

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row?;
            let fields: Vec<&str> = row
                .iter()
                .enumerate()
                .filter(|(i, _)| !dropped_flags.contains(i))
                .map(|(_, v)| v)
                .collect();

            let extra = fields
                .iter()
                .enumerate()
                .filter(|(i, _)| {
                    *i != layout.audit_id && *i != layout.risk_score && *i != layout.status
                })
                .map(|(_, v)| v.to_string())
                .collect();

            records.push(AuditRecord {
                audit_id: fields[layout.audit_id].to_string(),
                risk_score: RiskScore::Raw(fields[layout.risk_score].to_string()),
                status: fields[layout.status].to_string(),
                high_risk_flag: None,
                extra,
            });
        }

        Ok(Dataset {
            layout,
            dropped_flags,
            records,
        })
    }

    /// Serialize to CSV bytes: input columns, then `High_Risk_Flag`
    /// (`True`/`False`, empty if flags were never applied).
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, DatasetError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(self.output_headers())?;

        for record in &self.records {
            let mut extra = record.extra.iter();
            let mut row: Vec<String> = Vec::with_capacity(self.layout.headers.len() + 1);
            for i in 0..self.layout.headers.len() {
                let value = if i == self.layout.audit_id {
                    record.audit_id.clone()
                } else if i == self.layout.risk_score {
                    record.risk_score.to_string()
                } else if i == self.layout.status {
                    record.status.clone()
                } else {
                    extra.next().cloned().unwrap_or_default()
                };
                row.push(value);
            }
            row.push(match record.high_risk_flag {
                Some(true) => "True".to_string(),
                Some(false) => "False".to_string(),
                None => String::new(),
            });
            wtr.write_record(&row)?;
        }

        wtr.into_inner().map_err(|e| {
            let err = e.error();
            DatasetError::Csv(std::io::Error::new(err.kind(), err.to_string()).into())
        })
    }

    /// Write the cleaned artifact, creating parent directories and
    /// overwriting any previous file.
    pub fn write_to_path(&self, path: &Path) -> Result<CleanedArtifact, DatasetError> {
        let bytes = self.to_csv_bytes()?;
        let io_err = |source: std::io::Error| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, &bytes).map_err(io_err)?;

        Ok(CleanedArtifact {
            path: path.to_path_buf(),
            rows: self.records.len(),
            sha256: hex::encode(Sha256::digest(&bytes)),
        })
    }

    /// Whether the input carried a `High_Risk_Flag` column that was dropped.
    pub fn had_flag_column(&self) -> bool {
        !self.dropped_flags.is_empty()
    }
}
