//! Metric identifiers and per-pair score maps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::MetricsError;

/// A deterministic goodness-of-fit metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Metric {
    #[serde(rename = "NSE")]
    Nse,
    #[serde(rename = "KGE")]
    Kge,
    #[serde(rename = "RMSE")]
    Rmse,
}

impl Metric {
    /// Every metric, in report order.
    pub const ALL: [Metric; 3] = [Metric::Nse, Metric::Kge, Metric::Rmse];

    /// Canonical upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Nse => "NSE",
            Metric::Kge => "KGE",
            Metric::Rmse => "RMSE",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MetricsError::UnknownMetric {
                name: s.to_string(),
            })
    }
}

/// Scores computed over one aligned pair, keyed by metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricResult {
    scores: BTreeMap<Metric, f64>,
}

impl MetricResult {
    pub(crate) fn insert(&mut self, metric: Metric, score: f64) {
        self.scores.insert(metric, score);
    }

    /// Score for `metric`, if it was computed.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.scores.get(&metric).copied()
    }

    /// Iterate `(metric, score)` in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.scores.iter().map(|(m, s)| (*m, *s))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
