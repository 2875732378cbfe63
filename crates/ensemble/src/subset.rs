//! Positional and label-based subsetting of cubes.

use std::ops::Range;

use chrono::{DateTime, Utc};
use ndarray::Axis;

use crate::cube::{Coords, Cube, Dimension};
use crate::error::EnsembleError;

impl Cube {
    /// Keep positions `range` along `dim`. The end is clamped to the
    /// dimension length, like a Python slice.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::DimensionNotFound`] if `dim` is absent, or
    /// [`EnsembleError::InvalidSelection`] if `range.start > range.end`.
    pub fn slice_axis(&self, dim: &str, range: Range<usize>) -> Result<Cube, EnsembleError> {
        let axis = self.axis_index(dim)?;
        if range.start > range.end {
            return Err(EnsembleError::InvalidSelection {
                dim: dim.to_string(),
                reason: format!("start {} is after end {}", range.start, range.end),
            });
        }
        let len = self.dims()[axis].len();
        let end = range.end.min(len);
        let start = range.start.min(end);
        let indices: Vec<usize> = (start..end).collect();
        Ok(self.take(axis, &indices))
    }

    /// Keep the positions along a time dimension whose timestamps fall in
    /// `[start, end]` (inclusive).
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::DimensionNotFound`] if `dim` is absent, or
    /// [`EnsembleError::InvalidSelection`] if it is not time-labelled.
    pub fn select_time(
        &self,
        dim: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Cube, EnsembleError> {
        let axis = self.axis_index(dim)?;
        let Coords::Time(times) = self.dims()[axis].coords() else {
            return Err(EnsembleError::InvalidSelection {
                dim: dim.to_string(),
                reason: "dimension is not time-labelled".to_string(),
            });
        };
        let indices: Vec<usize> = times
            .iter()
            .enumerate()
            .filter(|(_, t)| **t >= start && **t <= end)
            .map(|(i, _)| i)
            .collect();
        Ok(self.take(axis, &indices))
    }

    /// Keep the positions along an integer-labelled dimension whose labels
    /// appear in `labels`, in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::DimensionNotFound`] if `dim` is absent, or
    /// [`EnsembleError::InvalidSelection`] if the dimension is not
    /// integer-labelled or a label is missing.
    pub fn select_labels(&self, dim: &str, labels: &[i64]) -> Result<Cube, EnsembleError> {
        let axis = self.axis_index(dim)?;
        let Coords::Int(ids) = self.dims()[axis].coords() else {
            return Err(EnsembleError::InvalidSelection {
                dim: dim.to_string(),
                reason: "dimension is not integer-labelled".to_string(),
            });
        };
        let indices = labels
            .iter()
            .map(|label| {
                ids.iter()
                    .position(|id| id == label)
                    .ok_or_else(|| EnsembleError::InvalidSelection {
                        dim: dim.to_string(),
                        reason: format!("label {label} not present"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.take(axis, &indices))
    }

    fn take(&self, axis: usize, indices: &[usize]) -> Cube {
        let dims: Vec<Dimension> = self
            .dims()
            .iter()
            .enumerate()
            .map(|(i, d)| {
                if i == axis {
                    Dimension::new(d.name(), d.coords().take(indices))
                } else {
                    d.clone()
                }
            })
            .collect();
        let channels = self
            .channels()
            .iter()
            .map(|ch| (ch.name().to_string(), ch.data().select(Axis(axis), indices)))
            .collect();
        Cube::from_parts(dims, channels, self.attrs().clone())
    }
}
