//! Deterministic goodness-of-fit metrics for simulated vs observed series.
//!
//! Inputs must already share physical units and a normalized time base
//! (e.g. both in m³/s, both in UTC). Nothing here converts units or
//! timezones.
//!
//! ```
//! use teval_metrics::{Metric, TimeSeries, calculate_all};
//!
//! let sim = TimeSeries::new("sim", vec![1, 2, 3], vec![1.0, 2.0, 4.0]).unwrap();
//! let obs = TimeSeries::new("obs", vec![1, 2, 3], vec![1.0, 2.0, 4.0]).unwrap();
//! let scores = calculate_all(&sim, &obs).unwrap();
//! assert_eq!(scores.get(Metric::Rmse), Some(0.0));
//! ```

pub mod deterministic;
pub mod error;
pub mod report;
pub mod result;
pub mod series;

pub use deterministic::{kge, nse, rmse};
pub use error::MetricsError;
pub use report::{GageScore, MetricsReport, SkippedGage, to_json};
pub use result::{Metric, MetricResult};
pub use series::{AlignedPair, TimeSeries, align};

/// Compute `metrics` over an already aligned pair.
pub fn score_pair<K>(pair: &AlignedPair<K>, metrics: &[Metric]) -> MetricResult {
    let mut result = MetricResult::default();
    for &metric in metrics {
        let score = match metric {
            Metric::Nse => nse(pair),
            Metric::Kge => kge(pair),
            Metric::Rmse => rmse(pair),
        };
        result.insert(metric, score);
    }
    result
}

/// Align `sim` and `obs` once, then compute `metrics` on the shared points.
///
/// # Errors
///
/// Returns [`MetricsError::NoOverlap`] if the series share no valid
/// timestamp; no partial result is produced.
pub fn calculate<K: Ord + Clone>(
    sim: &TimeSeries<K>,
    obs: &TimeSeries<K>,
    metrics: &[Metric],
) -> Result<MetricResult, MetricsError> {
    let pair = align(sim, obs)?;
    Ok(score_pair(&pair, metrics))
}

/// [`calculate`] with NSE, KGE and RMSE.
pub fn calculate_all<K: Ord + Clone>(
    sim: &TimeSeries<K>,
    obs: &TimeSeries<K>,
) -> Result<MetricResult, MetricsError> {
    calculate(sim, obs, &Metric::ALL)
}
