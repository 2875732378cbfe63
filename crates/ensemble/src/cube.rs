//! Labelled n-dimensional data cube shared by ensemble inputs and statistics outputs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use ndarray::{ArrayD, IxDyn};

use crate::error::EnsembleError;

/// Coordinate labels attached to one dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum Coords {
    /// No coordinate variable; positions `0..n` only.
    Range(usize),
    /// Integer labels (feature ids, formulation ids, step indices).
    Int(Vec<i64>),
    /// Floating-point labels.
    Float(Vec<f64>),
    /// UTC timestamps.
    Time(Vec<DateTime<Utc>>),
    /// String labels.
    Text(Vec<String>),
}

impl Coords {
    /// Number of positions along the dimension.
    pub fn len(&self) -> usize {
        match self {
            Coords::Range(n) => *n,
            Coords::Int(v) => v.len(),
            Coords::Float(v) => v.len(),
            Coords::Time(v) => v.len(),
            Coords::Text(v) => v.len(),
        }
    }

    /// Returns `true` when the dimension has zero length.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only the labels at `indices`, in the given order.
    pub(crate) fn take(&self, indices: &[usize]) -> Coords {
        match self {
            Coords::Range(_) => Coords::Range(indices.len()),
            Coords::Int(v) => Coords::Int(indices.iter().map(|&i| v[i]).collect()),
            Coords::Float(v) => Coords::Float(indices.iter().map(|&i| v[i]).collect()),
            Coords::Time(v) => Coords::Time(indices.iter().map(|&i| v[i]).collect()),
            Coords::Text(v) => Coords::Text(indices.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

/// A named dimension with its coordinate labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    name: String,
    coords: Coords,
}

impl Dimension {
    /// Create a dimension from a name and its labels.
    pub fn new(name: impl Into<String>, coords: Coords) -> Self {
        Self {
            name: name.into(),
            coords,
        }
    }

    /// Dimension name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coordinate labels.
    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Returns `true` when the dimension has zero length.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Value of a descriptive attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{s}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        AttrValue::Float(x)
    }
}

/// Descriptive attributes, keyed by name.
pub type Attributes = BTreeMap<String, AttrValue>;

/// One named data channel (e.g. `streamflow`).
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    name: String,
    data: ArrayD<f64>,
}

impl Channel {
    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channel values, shaped like the owning cube.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }
}

/// Labelled data cube: ordered dimensions, channels sharing those
/// dimensions, and descriptive attributes.
///
/// Every channel has exactly the shape given by the dimension lengths in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    dims: Vec<Dimension>,
    channels: Vec<Channel>,
    attrs: Attributes,
}

/// Raw ensemble input: a cube that carries a member axis somewhere among its
/// dimensions.
pub type EnsembleCube = Cube;

impl Cube {
    /// Create an empty cube over `dims`.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::DuplicateDimension`] if two dimensions share a name.
    pub fn new(dims: Vec<Dimension>) -> Result<Self, EnsembleError> {
        for (i, d) in dims.iter().enumerate() {
            if dims[..i].iter().any(|o| o.name == d.name) {
                return Err(EnsembleError::DuplicateDimension {
                    name: d.name.clone(),
                });
            }
        }
        Ok(Self {
            dims,
            channels: Vec::new(),
            attrs: Attributes::new(),
        })
    }

    /// Builder form of [`add_channel`](Self::add_channel).
    pub fn with_channel(
        mut self,
        name: impl Into<String>,
        data: ArrayD<f64>,
    ) -> Result<Self, EnsembleError> {
        self.add_channel(name, data)?;
        Ok(self)
    }

    /// Builder form of [`set_attr`](Self::set_attr).
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Append a channel.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::DuplicateChannel`] if the name is taken, or
    /// [`EnsembleError::ShapeMismatch`] if `data` does not match the cube shape.
    pub fn add_channel(
        &mut self,
        name: impl Into<String>,
        data: ArrayD<f64>,
    ) -> Result<(), EnsembleError> {
        let name = name.into();
        if self.channel(&name).is_some() {
            return Err(EnsembleError::DuplicateChannel { name });
        }
        let expected = self.shape();
        if data.shape() != expected.as_slice() {
            return Err(EnsembleError::ShapeMismatch {
                name,
                expected,
                got: data.shape().to_vec(),
            });
        }
        self.channels.push(Channel { name, data });
        Ok(())
    }

    /// Set (or overwrite) an attribute.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Replace all attributes.
    pub fn set_attrs(&mut self, attrs: Attributes) {
        self.attrs = attrs;
    }

    /// Dimensions in declaration order.
    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    /// Dimension names in declaration order.
    pub fn dim_names(&self) -> Vec<&str> {
        self.dims.iter().map(Dimension::name).collect()
    }

    /// Look up a dimension by exact name.
    pub fn dim(&self, name: &str) -> Option<&Dimension> {
        self.dims.iter().find(|d| d.name == name)
    }

    /// Position of a dimension by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::DimensionNotFound`] if absent.
    pub fn axis_index(&self, name: &str) -> Result<usize, EnsembleError> {
        self.dims
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| EnsembleError::DimensionNotFound {
                name: name.to_string(),
            })
    }

    /// Extents of every dimension in declaration order.
    pub fn shape(&self) -> Vec<usize> {
        self.dims.iter().map(Dimension::len).collect()
    }

    /// Channels in insertion order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Channel names in insertion order.
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(Channel::name).collect()
    }

    /// Look up a channel by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Descriptive attributes.
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// Extract one feature's series from a 2-axis `time x feature` channel.
    ///
    /// Returns the time labels and the values in time order. The axes may be
    /// declared in either order.
    ///
    /// # Errors
    ///
    /// Returns [`EnsembleError::ChannelNotFound`],
    /// [`EnsembleError::DimensionNotFound`], or
    /// [`EnsembleError::InvalidSelection`] when the feature label is unknown,
    /// the feature dimension is not integer-labelled, or the channel has
    /// dimensions other than time and feature.
    pub fn series(
        &self,
        channel: &str,
        time_dim: &str,
        feature_dim: &str,
        feature: i64,
    ) -> Result<(Coords, Vec<f64>), EnsembleError> {
        let ch = self
            .channel(channel)
            .ok_or_else(|| EnsembleError::ChannelNotFound {
                name: channel.to_string(),
            })?;
        let t_axis = self.axis_index(time_dim)?;
        let f_axis = self.axis_index(feature_dim)?;
        if self.dims.len() != 2 {
            return Err(EnsembleError::InvalidSelection {
                dim: feature_dim.to_string(),
                reason: format!(
                    "series extraction needs exactly 2 dimensions, cube has {:?}",
                    self.dim_names()
                ),
            });
        }

        let f_idx = match self.dims[f_axis].coords() {
            Coords::Int(ids) => ids.iter().position(|&id| id == feature),
            _ => {
                return Err(EnsembleError::InvalidSelection {
                    dim: feature_dim.to_string(),
                    reason: "feature dimension has no integer labels".to_string(),
                });
            }
        }
        .ok_or_else(|| EnsembleError::InvalidSelection {
            dim: feature_dim.to_string(),
            reason: format!("feature {feature} not present"),
        })?;

        let values: Vec<f64> = ch
            .data
            .index_axis(ndarray::Axis(f_axis), f_idx)
            .iter()
            .copied()
            .collect();
        debug_assert_eq!(values.len(), self.dims[t_axis].len());

        Ok((self.dims[t_axis].coords().clone(), values))
    }

    pub(crate) fn from_parts(
        dims: Vec<Dimension>,
        channels: Vec<(String, ArrayD<f64>)>,
        attrs: Attributes,
    ) -> Self {
        Self {
            dims,
            channels: channels
                .into_iter()
                .map(|(name, data)| Channel { name, data })
                .collect(),
            attrs,
        }
    }
}

/// Build an `ArrayD` from flat row-major values and a shape.
///
/// # Errors
///
/// Returns [`EnsembleError::ShapeMismatch`] if the value count does not
/// match the product of `shape`.
pub fn array_from_vec(
    name: &str,
    shape: &[usize],
    values: Vec<f64>,
) -> Result<ArrayD<f64>, EnsembleError> {
    let got = values.len();
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|_| EnsembleError::ShapeMismatch {
        name: name.to_string(),
        expected: shape.to_vec(),
        got: vec![got],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_three() -> Cube {
        Cube::new(vec![
            Dimension::new("time", Coords::Range(2)),
            Dimension::new("feature_id", Coords::Int(vec![101, 102, 103])),
        ])
        .unwrap()
    }

    #[test]
    fn new_rejects_duplicate_dimensions() {
        let err = Cube::new(vec![
            Dimension::new("time", Coords::Range(2)),
            Dimension::new("time", Coords::Range(3)),
        ])
        .unwrap_err();
        assert!(matches!(err, EnsembleError::DuplicateDimension { .. }));
    }

    #[test]
    fn add_channel_checks_shape() {
        let mut cube = two_by_three();
        let bad = ArrayD::zeros(IxDyn(&[3, 2]));
        let err = cube.add_channel("streamflow", bad).unwrap_err();
        assert!(matches!(err, EnsembleError::ShapeMismatch { .. }));

        let good = ArrayD::zeros(IxDyn(&[2, 3]));
        cube.add_channel("streamflow", good).unwrap();
        assert_eq!(cube.channel_names(), vec!["streamflow"]);
    }

    #[test]
    fn add_channel_rejects_duplicate_names() {
        let cube = two_by_three()
            .with_channel("q", ArrayD::zeros(IxDyn(&[2, 3])))
            .unwrap();
        let err = cube
            .with_channel("q", ArrayD::zeros(IxDyn(&[2, 3])))
            .unwrap_err();
        assert!(matches!(err, EnsembleError::DuplicateChannel { .. }));
    }

    #[test]
    fn series_extracts_feature_column() {
        let data = array_from_vec("q", &[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let cube = two_by_three().with_channel("q", data).unwrap();

        let (coords, values) = cube.series("q", "time", "feature_id", 102).unwrap();
        assert_eq!(coords, Coords::Range(2));
        assert_eq!(values, vec![2.0, 5.0]);
    }

    #[test]
    fn series_unknown_feature() {
        let cube = two_by_three()
            .with_channel("q", ArrayD::zeros(IxDyn(&[2, 3])))
            .unwrap();
        let err = cube.series("q", "time", "feature_id", 999).unwrap_err();
        assert!(matches!(err, EnsembleError::InvalidSelection { .. }));
    }

    #[test]
    fn attr_display() {
        assert_eq!(AttrValue::from("abc").to_string(), "abc");
        assert_eq!(AttrValue::from(7_i64).to_string(), "7");
    }

    #[test]
    fn array_from_vec_wrong_length() {
        let err = array_from_vec("q", &[2, 2], vec![1.0]).unwrap_err();
        assert!(matches!(err, EnsembleError::ShapeMismatch { .. }));
    }
}
