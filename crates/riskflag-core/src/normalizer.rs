//! Risk score normalization.
//!
//! Every `Risk_Score` is coerced to a finite `f64`. Values that do not parse
//! (text, empty cells, `NaN`, infinities) become `0.0`, the lowest-risk
//! value, and are counted rather than rejected.

use crate::dataset::{Dataset, RiskScore};
use serde::{Deserialize, Serialize};

/// Score substituted for unparseable input.
pub const DEFAULT_RISK_SCORE: f64 = 0.0;

/// Outcome of one normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    /// Records whose score was coerced from raw text.
    pub coerced: usize,
    /// Records whose score was replaced by the default.
    pub defaulted: usize,
}

/// Parse a raw score; `None` when it is not a finite number.
pub fn parse_risk_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a raw score, falling back to [`DEFAULT_RISK_SCORE`].
pub fn coerce_risk_score(raw: &str) -> f64 {
    parse_risk_score(raw).unwrap_or(DEFAULT_RISK_SCORE)
}

/// Normalize every record in place. Already-numeric finite scores are left
/// untouched.
pub fn normalize(dataset: &mut Dataset) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    for record in &mut dataset.records {
        let score = match &record.risk_score {
            RiskScore::Raw(raw) => {
                report.coerced += 1;
                parse_risk_score(raw).unwrap_or_else(|| {
                    report.defaulted += 1;
                    DEFAULT_RISK_SCORE
                })
            }
            RiskScore::Score(v) if v.is_finite() => *v,
            RiskScore::Score(_) => {
                report.defaulted += 1;
                DEFAULT_RISK_SCORE
            }
        };
        record.risk_score = RiskScore::Score(score);
    }

    report
}
