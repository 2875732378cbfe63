//! JSON report of per-gage scores.

use serde::Serialize;

use crate::error::MetricsError;
use crate::result::MetricResult;

/// Scores for every gaged feature of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsReport {
    /// Statistics channel that was scored (e.g. `streamflow_mean`).
    pub variable: String,
    pub entries: Vec<GageScore>,
    pub skipped: Vec<SkippedGage>,
}

/// Scores for one feature/gage pair.
#[derive(Debug, Clone, Serialize)]
pub struct GageScore {
    pub feature_id: i64,
    pub gage_id: String,
    /// Number of aligned points the scores were computed over.
    pub n_points: usize,
    pub scores: MetricResult,
}

/// A feature that could not be scored.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedGage {
    pub feature_id: i64,
    pub gage_id: String,
    pub reason: String,
}

impl MetricsReport {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            entries: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Serialize a report to pretty-printed JSON.
pub fn to_json(report: &MetricsReport) -> Result<String, MetricsError> {
    serde_json::to_string_pretty(report).map_err(|e| MetricsError::Serialization {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Metric;

    #[test]
    fn test_to_json() {
        let mut scores = MetricResult::default();
        scores.insert(Metric::Nse, 0.8);
        scores.insert(Metric::Kge, f64::NAN);

        let mut report = MetricsReport::new("streamflow_mean");
        report.entries.push(GageScore {
            feature_id: 1234,
            gage_id: "01013500".to_string(),
            n_points: 48,
            scores,
        });
        report.skipped.push(SkippedGage {
            feature_id: 99,
            gage_id: "02000000".to_string(),
            reason: "no overlapping valid data".to_string(),
        });

        let json = to_json(&report).unwrap();
        assert!(json.contains("\"variable\": \"streamflow_mean\""));
        assert!(json.contains("\"gage_id\": \"01013500\""));
        assert!(json.contains("\"NSE\": 0.8"));
        assert!(json.contains("\"KGE\": null"));
        assert!(json.contains("\"n_points\": 48"));
        assert!(json.contains("\"reason\": \"no overlapping valid data\""));
    }

    #[test]
    fn test_empty_report() {
        let json = to_json(&MetricsReport::new("q_mean")).unwrap();
        assert!(json.contains("\"entries\": []"));
        assert!(json.contains("\"skipped\": []"));
    }
}
