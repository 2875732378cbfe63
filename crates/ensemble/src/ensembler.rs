//! Ensembling strategies: collapse the member axis into summary statistics.

use ndarray::{ArrayD, ArrayViewD, Axis};

use crate::cube::{Attributes, Cube, EnsembleCube};
use crate::error::EnsembleError;
use crate::member_axis::{MEMBER_AXIS_ALIASES, identify_in, identify_member_axis};
use crate::quantile::{QuantileSet, Statistic};

/// Attribute overwritten on every statistics cube.
pub const DESCRIPTION_ATTR: &str = "description";

/// A strategy that turns a raw ensemble into a statistics cube.
pub trait Ensembler {
    /// Short human-readable name, used in the output description.
    fn name(&self) -> &str;

    /// Reduce `cube` across its member axis.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::AxisNotFound`] when the member axis cannot be
    /// identified; no partial output is produced.
    fn process(&self, cube: &EnsembleCube) -> Result<StatisticsCube, EnsembleError>;
}

/// Mean, median, population std and a configurable set of quantiles.
#[derive(Debug, Clone, Default)]
pub struct SimpleEnsembler {
    quantiles: QuantileSet,
}

impl SimpleEnsembler {
    /// Create an ensembler for the given quantile set.
    pub fn new(quantiles: QuantileSet) -> Self {
        Self { quantiles }
    }

    /// Returns the configured quantiles.
    pub fn quantiles(&self) -> &QuantileSet {
        &self.quantiles
    }
}

impl Ensembler for SimpleEnsembler {
    fn name(&self) -> &str {
        "SimpleEnsembler"
    }

    fn process(&self, cube: &EnsembleCube) -> Result<StatisticsCube, EnsembleError> {
        let member_axis = identify_member_axis(cube)?;
        let mut stats = reduce(cube, member_axis, &self.quantiles)?;
        stats.describe(Some(self.name()));
        Ok(stats)
    }
}

/// Ensemble cube with the member axis collapsed.
///
/// Holds one channel `{channel}_{label}` per (input channel, statistic)
/// pair. The `time`/`feature` axes and their labels are carried over
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsCube {
    cube: Cube,
    statistics: Vec<Statistic>,
}

impl StatisticsCube {
    /// Wrap a cube that already holds statistics channels (e.g. read back
    /// from disk).
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::InvalidSelection`] if the cube still carries a
    /// dimension matching a member-axis alias.
    pub fn from_cube(cube: Cube) -> Result<Self, EnsembleError> {
        if let Ok(axis) = identify_in(&cube.dim_names()) {
            return Err(EnsembleError::InvalidSelection {
                dim: axis.to_string(),
                reason: format!(
                    "statistics cube must not carry a member axis (one of {MEMBER_AXIS_ALIASES:?})"
                ),
            });
        }
        Ok(Self {
            cube,
            statistics: Vec::new(),
        })
    }

    /// Underlying cube.
    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    /// Consume and return the underlying cube.
    pub fn into_cube(self) -> Cube {
        self.cube
    }

    /// Statistics that produced this cube, in channel order. Empty when the
    /// cube was wrapped with [`from_cube`](Self::from_cube).
    pub fn statistics(&self) -> &[Statistic] {
        &self.statistics
    }

    /// Restrict the dimensions to `start..end` positions along `dim`.
    ///
    /// # Errors
    ///
    /// See [`Cube::slice_axis`].
    pub fn slice_axis(
        &self,
        dim: &str,
        range: std::ops::Range<usize>,
    ) -> Result<Self, EnsembleError> {
        Ok(Self {
            cube: self.cube.slice_axis(dim, range)?,
            statistics: self.statistics.clone(),
        })
    }

    fn describe(&mut self, strategy: Option<&str>) {
        let labels = self
            .statistics
            .iter()
            .map(Statistic::label)
            .collect::<Vec<_>>()
            .join(", ");
        let text = match strategy {
            Some(name) => format!("Ensemble summary statistics ({name}): {labels}"),
            None => format!("Ensemble summary statistics: {labels}"),
        };
        self.cube.set_attr(DESCRIPTION_ATTR, text);
    }
}

/// Collapse `member_axis` of `cube` into mean, median, std and `quantiles`.
///
/// NaN members are ignored; a cell whose members are all NaN yields NaN for
/// every statistic. Output channels are grouped by statistic (all means,
/// then medians, ...), each group in input channel order. Attributes are
/// inherited from the input.
///
/// # Errors
///
/// Returns [`EnsembleError::DimensionNotFound`] if `member_axis` is not a
/// dimension of `cube`.
pub fn reduce(
    cube: &EnsembleCube,
    member_axis: &str,
    quantiles: &QuantileSet,
) -> Result<StatisticsCube, EnsembleError> {
    let axis = cube.axis_index(member_axis)?;
    let statistics = quantiles.statistics();

    let dims: Vec<_> = cube
        .dims()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != axis)
        .map(|(_, d)| d.clone())
        .collect();

    // Computed per input channel, then regrouped per statistic.
    let per_channel: Vec<Vec<ArrayD<f64>>> = cube
        .channels()
        .iter()
        .map(|ch| reduce_channel(ch.data().view(), Axis(axis), &statistics))
        .collect();

    let mut channels = Vec::with_capacity(statistics.len() * per_channel.len());
    for (s, stat) in statistics.iter().enumerate() {
        for (ch, arrays) in cube.channels().iter().zip(&per_channel) {
            channels.push((format!("{}_{}", ch.name(), stat.label()), arrays[s].clone()));
        }
    }

    let attrs: Attributes = cube.attrs().clone();
    let mut stats = StatisticsCube {
        cube: Cube::from_parts(dims, channels, attrs),
        statistics,
    };
    stats.describe(None);
    Ok(stats)
}

/// Reduce one channel along `axis`, returning one array per statistic.
fn reduce_channel(
    data: ArrayViewD<'_, f64>,
    axis: Axis,
    statistics: &[Statistic],
) -> Vec<ArrayD<f64>> {
    let per_cell = data.map_axis(axis, |lane| cell_statistics(&lane.to_vec(), statistics));
    (0..statistics.len())
        .map(|s| per_cell.map(|values| values[s]))
        .collect()
}

/// Every requested statistic for one cell's member values.
fn cell_statistics(members: &[f64], statistics: &[Statistic]) -> Vec<f64> {
    let sorted = teval_stats::finite_sorted(members);
    if sorted.is_empty() {
        return vec![f64::NAN; statistics.len()];
    }
    statistics
        .iter()
        .map(|stat| match stat {
            Statistic::Mean => teval_stats::mean(&sorted),
            Statistic::Median => teval_stats::median(&sorted),
            Statistic::Std => teval_stats::population_std(&sorted),
            Statistic::Quantile(q) => teval_stats::quantile_linear(&sorted, *q),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{Coords, Dimension, array_from_vec};
    use approx::assert_relative_eq;

    /// `member x time` cube with members [1, 2, 3] constant over time.
    fn one_two_three() -> Cube {
        let data: Vec<f64> = [1.0, 2.0, 3.0]
            .iter()
            .flat_map(|&m| std::iter::repeat_n(m, 5))
            .collect();
        Cube::new(vec![
            Dimension::new("member", Coords::Int(vec![0, 1, 2])),
            Dimension::new("time", Coords::Range(5)),
        ])
        .unwrap()
        .with_channel("streamflow", array_from_vec("streamflow", &[3, 5], data).unwrap())
        .unwrap()
    }

    #[test]
    fn known_values() {
        let stats = reduce(&one_two_three(), "member", &QuantileSet::empty()).unwrap();
        let cube = stats.cube();
        assert_eq!(cube.dim_names(), vec!["time"]);
        for v in cube.channel("streamflow_mean").unwrap().data() {
            assert_relative_eq!(*v, 2.0, epsilon = 1e-12);
        }
        for v in cube.channel("streamflow_median").unwrap().data() {
            assert_relative_eq!(*v, 2.0, epsilon = 1e-12);
        }
        for v in cube.channel("streamflow_std").unwrap().data() {
            assert_relative_eq!(*v, (2.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
        }
    }

    #[test]
    fn nan_members_are_skipped() {
        let data = vec![1.0, f64::NAN, 3.0, f64::NAN, 5.0, f64::NAN];
        let cube = Cube::new(vec![
            Dimension::new("run", Coords::Range(3)),
            Dimension::new("time", Coords::Range(2)),
        ])
        .unwrap()
        .with_channel("q", array_from_vec("q", &[3, 2], data).unwrap())
        .unwrap();

        let stats = reduce(&cube, "run", &QuantileSet::new(vec![1.0]).unwrap()).unwrap();
        let mean = stats.cube().channel("q_mean").unwrap().data();
        // time 0: members [1, 3, 5]; time 1: all NaN
        assert_relative_eq!(mean[[0]], 3.0, epsilon = 1e-12);
        assert!(mean[[1]].is_nan());
        let max = stats.cube().channel("q_p100").unwrap().data();
        assert_eq!(max[[0]], 5.0);
        assert!(max[[1]].is_nan());
    }

    #[test]
    fn channel_order_groups_by_statistic() {
        let cube = one_two_three()
            .with_channel("velocity", ArrayD::zeros(ndarray::IxDyn(&[3, 5])))
            .unwrap();
        let stats = reduce(&cube, "member", &QuantileSet::new(vec![0.5]).unwrap()).unwrap();
        assert_eq!(
            stats.cube().channel_names(),
            vec![
                "streamflow_mean",
                "velocity_mean",
                "streamflow_median",
                "velocity_median",
                "streamflow_std",
                "velocity_std",
                "streamflow_p50",
                "velocity_p50",
            ]
        );
    }

    #[test]
    fn reduce_unknown_axis() {
        let err = reduce(&one_two_three(), "ensemble", &QuantileSet::empty()).unwrap_err();
        assert!(matches!(err, EnsembleError::DimensionNotFound { .. }));
    }

    #[test]
    fn process_overwrites_description_and_keeps_attrs() {
        let cube = one_two_three()
            .with_attr("title", "t-route output")
            .with_attr(DESCRIPTION_ATTR, "raw");
        let stats = SimpleEnsembler::default().process(&cube).unwrap();
        let attrs = stats.cube().attrs();
        assert_eq!(attrs["title"].to_string(), "t-route output");
        assert_eq!(
            attrs[DESCRIPTION_ATTR].to_string(),
            "Ensemble summary statistics (SimpleEnsembler): mean, median, std, p05, p95"
        );
    }

    #[test]
    fn reduce_describes_without_strategy_name() {
        let stats = reduce(&one_two_three(), "member", &QuantileSet::empty()).unwrap();
        assert_eq!(
            stats.cube().attrs()[DESCRIPTION_ATTR].to_string(),
            "Ensemble summary statistics: mean, median, std"
        );
    }

    #[test]
    fn from_cube_rejects_member_axis() {
        let err = StatisticsCube::from_cube(one_two_three()).unwrap_err();
        assert!(matches!(err, EnsembleError::InvalidSelection { .. }));
    }

    #[test]
    fn median_even_member_count() {
        let cell = cell_statistics(&[4.0, 1.0, 3.0, 2.0], &[Statistic::Median]);
        assert_relative_eq!(cell[0], 2.5, epsilon = 1e-12);
    }
}
