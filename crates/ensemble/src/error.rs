//! Error types for teval-ensemble.

/// Errors raised while building, subsetting or reducing ensemble cubes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnsembleError {
    /// No dimension matches any known member-axis alias.
    #[error("could not identify ensemble member dimension in {dims:?} (expected one of {aliases:?})")]
    AxisNotFound {
        /// Dimension names present on the cube.
        dims: Vec<String>,
        /// Aliases that were searched.
        aliases: Vec<String>,
    },

    /// A named dimension is not present on the cube.
    #[error("dimension '{name}' not found")]
    DimensionNotFound {
        /// Requested dimension name.
        name: String,
    },

    /// A dimension name appears more than once.
    #[error("duplicate dimension '{name}'")]
    DuplicateDimension {
        /// Offending dimension name.
        name: String,
    },

    /// A channel name appears more than once.
    #[error("duplicate channel '{name}'")]
    DuplicateChannel {
        /// Offending channel name.
        name: String,
    },

    /// A named channel is not present on the cube.
    #[error("channel '{name}' not found")]
    ChannelNotFound {
        /// Requested channel name.
        name: String,
    },

    /// Channel data does not match the cube's dimension extents.
    #[error("channel '{name}' has shape {got:?}, cube shape is {expected:?}")]
    ShapeMismatch {
        /// Channel name.
        name: String,
        /// Shape implied by the cube's dimensions.
        expected: Vec<usize>,
        /// Shape of the supplied data.
        got: Vec<usize>,
    },

    /// A quantile fraction lies outside `[0, 1]` or is not a number.
    #[error("quantile {value} is outside [0, 1]")]
    InvalidQuantile {
        /// Offending value.
        value: f64,
    },

    /// The same quantile fraction was requested twice.
    #[error("quantile {value} requested more than once")]
    DuplicateQuantile {
        /// Offending value.
        value: f64,
    },

    /// A subsetting request cannot be satisfied.
    #[error("invalid selection on '{dim}': {reason}")]
    InvalidSelection {
        /// Dimension being subset.
        dim: String,
        /// Description of the problem.
        reason: String,
    },
}
