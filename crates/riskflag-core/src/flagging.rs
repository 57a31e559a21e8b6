//! High-risk flagging.

use crate::dataset::Dataset;

/// Status value that qualifies a record for escalation. Compared exactly.
pub const FAIL_STATUS: &str = "Fail";

/// Scores strictly above this value are high risk.
pub const RISK_THRESHOLD: f64 = 80.0;

/// `Status == "Fail" AND Risk_Score > 80`.
pub fn is_high_risk(status: &str, risk_score: f64) -> bool {
    status == FAIL_STATUS && risk_score > RISK_THRESHOLD
}

/// Compute `High_Risk_Flag` for every record and return the flagged count.
///
/// Records whose score has not been normalized are flagged `false`.
pub fn apply_flags(dataset: &mut Dataset) -> usize {
    let mut flagged = 0;
    for record in &mut dataset.records {
        let flag = record
            .risk_score
            .value()
            .map_or(false, |score| is_high_risk(&record.status, score));
        record.high_risk_flag = Some(flag);
        if flag {
            flagged += 1;
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{AuditRecord, RiskScore};
    use crate::normalizer::normalize;

    #[test]
    fn test_predicate_boundaries() {
        assert!(is_high_risk("Fail", 80.0001));
        assert!(is_high_risk("Fail", 95.0));
        assert!(!is_high_risk("Fail", 80.0));
        assert!(!is_high_risk("Fail", 0.0));
        assert!(!is_high_risk("Pass", 81.0));
    }

    #[test]
    fn test_status_match_is_exact() {
        for status in ["fail", "FAIL", " Fail", "Fail ", "Failed", ""] {
            assert!(!is_high_risk(status, 99.0), "{status:?} must not qualify");
        }
    }

    #[test]
    fn test_apply_flags_preserves_order() {
        let mut ds = Dataset::new(vec![
            AuditRecord::new("A1", "95", "Fail"),
            AuditRecord::new("A2", "not_a_number", "Fail"),
            AuditRecord::new("A3", "81", "Pass"),
            AuditRecord::new("A4", "80", "Fail"),
            AuditRecord::new("A5", "80.5", "Fail"),
        ]);
        normalize(&mut ds);

        assert_eq!(apply_flags(&mut ds), 2);
        let ids: Vec<_> = ds.records.iter().map(|r| r.audit_id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2", "A3", "A4", "A5"]);
        let flags: Vec<_> = ds.records.iter().map(|r| r.high_risk_flag).collect();
        assert_eq!(
            flags,
            vec![Some(true), Some(false), Some(false), Some(false), Some(true)]
        );
    }

    #[test]
    fn test_unnormalized_records_not_flagged() {
        let mut ds = Dataset::new(vec![AuditRecord::new("A1", "95", "Fail")]);
        assert_eq!(apply_flags(&mut ds), 0);
        assert_eq!(ds.records[0].high_risk_flag, Some(false));
        assert!(matches!(ds.records[0].risk_score, RiskScore::Raw(_)));
    }

    #[test]
    fn test_flags_recomputed_on_second_pass() {
        let mut ds = Dataset::new(vec![AuditRecord::new("A1", "95", "Fail")]);
        normalize(&mut ds);
        apply_flags(&mut ds);
        ds.records[0].status = "Pass".to_string();
        assert_eq!(apply_flags(&mut ds), 0);
        assert_eq!(ds.records[0].high_risk_flag, Some(false));
    }
}
