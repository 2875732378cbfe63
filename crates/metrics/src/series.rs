//! Time-indexed series and inner-join alignment.

use crate::error::MetricsError;

/// A univariate series indexed by timestamps of type `K`.
///
/// Stored sorted by timestamp. NaN marks a missing value. Timestamps must
/// already be normalized (same timezone, same units) across the series that
/// get compared; nothing here converts them.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<K> {
    index: Vec<K>,
    values: Vec<f64>,
}

impl<K: Ord + Clone> TimeSeries<K> {
    /// Build a series from parallel index and value vectors.
    ///
    /// `name` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::LengthMismatch`] if the vectors differ in
    /// length, or [`MetricsError::DuplicateTimestamp`] if a timestamp repeats.
    pub fn new(name: &str, index: Vec<K>, values: Vec<f64>) -> Result<Self, MetricsError> {
        if index.len() != values.len() {
            return Err(MetricsError::LengthMismatch {
                series: name.to_string(),
                index: index.len(),
                values: values.len(),
            });
        }

        let mut pairs: Vec<(K, f64)> = index.into_iter().zip(values).collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(position) = pairs.windows(2).position(|w| w[0].0 == w[1].0) {
            return Err(MetricsError::DuplicateTimestamp {
                series: name.to_string(),
                position: position + 1,
            });
        }

        let (index, values) = pairs.into_iter().unzip();
        Ok(Self { index, values })
    }

    /// Timestamps in ascending order.
    pub fn index(&self) -> &[K] {
        &self.index
    }

    /// Values aligned with [`index`](Self::index).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of entries, including missing ones.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the series has no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Simulated and observed values on their shared, valid timestamps.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair<K> {
    index: Vec<K>,
    sim: Vec<f64>,
    obs: Vec<f64>,
}

impl<K> AlignedPair<K> {
    /// Shared timestamps.
    pub fn index(&self) -> &[K] {
        &self.index
    }

    /// Simulated values.
    pub fn sim(&self) -> &[f64] {
        &self.sim
    }

    /// Observed values.
    pub fn obs(&self) -> &[f64] {
        &self.obs
    }

    /// Number of aligned points (at least 1).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Inner-join `sim` and `obs` on timestamp, dropping points where either
/// value is missing.
///
/// # Errors
///
/// Returns [`MetricsError::NoOverlap`] if no point survives.
pub fn align<K: Ord + Clone>(
    sim: &TimeSeries<K>,
    obs: &TimeSeries<K>,
) -> Result<AlignedPair<K>, MetricsError> {
    let mut index = Vec::new();
    let mut s_out = Vec::new();
    let mut o_out = Vec::new();

    // Both indexes are sorted, so a merge walk is enough.
    let (mut i, mut j) = (0, 0);
    while i < sim.len() && j < obs.len() {
        match sim.index[i].cmp(&obs.index[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                let (s, o) = (sim.values[i], obs.values[j]);
                if !s.is_nan() && !o.is_nan() {
                    index.push(sim.index[i].clone());
                    s_out.push(s);
                    o_out.push(o);
                }
                i += 1;
                j += 1;
            }
        }
    }

    if index.is_empty() {
        return Err(MetricsError::NoOverlap);
    }

    Ok(AlignedPair {
        index,
        sim: s_out,
        obs: o_out,
    })
}
