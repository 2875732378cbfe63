//! Metric evaluation error types.

/// Errors that can occur while aligning or scoring time series.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    /// Simulated and observed series share no timestamp with valid values in both.
    #[error("no overlapping valid data between simulation and observation")]
    NoOverlap,

    /// Index and value vectors of a series differ in length.
    #[error("series '{series}' has {index} timestamps but {values} values")]
    LengthMismatch {
        series: String,
        index: usize,
        values: usize,
    },

    /// A timestamp occurs twice in one series.
    #[error("series '{series}' has a duplicate timestamp at position {position}")]
    DuplicateTimestamp { series: String, position: usize },

    /// A metric name could not be parsed.
    #[error("unknown metric '{name}' (expected one of NSE, KGE, RMSE)")]
    UnknownMetric { name: String },

    /// JSON serialization failed.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}
