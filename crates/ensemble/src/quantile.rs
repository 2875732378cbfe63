//! Requested statistics and their channel-name labels.

use std::fmt;

use crate::error::EnsembleError;

/// One summary statistic computed across the member axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    Mean,
    Median,
    /// Population standard deviation.
    Std,
    /// Linear-interpolation quantile at the given fraction.
    Quantile(f64),
}

impl Statistic {
    /// Channel-name suffix: `mean`, `median`, `std`, or `pNN`.
    ///
    /// Quantile labels use `round(q * 100)` padded to two digits, so
    /// `0.05 -> p05` and `1.0 -> p100`.
    pub fn label(&self) -> String {
        match self {
            Statistic::Mean => "mean".to_string(),
            Statistic::Median => "median".to_string(),
            Statistic::Std => "std".to_string(),
            Statistic::Quantile(q) => format!("p{:02}", (q * 100.0).round() as u32),
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Ordered set of distinct quantile fractions, each in `[0, 1]`.
///
/// Construction is the rejection point for bad configuration; reduction
/// assumes a valid set.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileSet {
    values: Vec<f64>,
}

impl Default for QuantileSet {
    fn default() -> Self {
        Self {
            values: vec![0.05, 0.95],
        }
    }
}

impl QuantileSet {
    /// Validate and wrap `values`, keeping the requested order.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::InvalidQuantile`] for NaN or values outside
    /// `[0, 1]`, and [`EnsembleError::DuplicateQuantile`] when two fractions
    /// share a `pNN` label.
    pub fn new(values: Vec<f64>) -> Result<Self, EnsembleError> {
        for (i, &q) in values.iter().enumerate() {
            if !(0.0..=1.0).contains(&q) {
                return Err(EnsembleError::InvalidQuantile { value: q });
            }
            let label = (q * 100.0).round();
            if values[..i].iter().any(|p| (p * 100.0).round() == label) {
                return Err(EnsembleError::DuplicateQuantile { value: q });
            }
        }
        Ok(Self { values })
    }

    /// An empty set (mean, median and std only).
    pub fn empty() -> Self {
        Self { values: Vec::new() }
    }

    /// Fractions in requested order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of quantiles.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no quantiles were requested.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Full statistic list: mean, median, std, then each quantile.
    pub fn statistics(&self) -> Vec<Statistic> {
        let mut stats = vec![Statistic::Mean, Statistic::Median, Statistic::Std];
        stats.extend(self.values.iter().map(|&q| Statistic::Quantile(q)));
        stats
    }
}
