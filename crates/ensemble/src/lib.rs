//! # teval-ensemble
//!
//! Collapse an ensemble data cube (time x feature x member, with the member
//! axis under any of several names) into summary statistics: mean, median,
//! population standard deviation and configurable quantiles.
//!
//! ```
//! use teval_ensemble::{Coords, Cube, Dimension, Ensembler, QuantileSet, SimpleEnsembler, array_from_vec};
//!
//! let cube = Cube::new(vec![
//!     Dimension::new("Formulation_ID", Coords::Int(vec![1, 2, 3])),
//!     Dimension::new("time", Coords::Range(1)),
//! ])?
//! .with_channel("streamflow", array_from_vec("streamflow", &[3, 1], vec![10.0, 20.0, 30.0])?)?;
//!
//! let stats = SimpleEnsembler::new(QuantileSet::new(vec![0.0, 1.0])?).process(&cube)?;
//! assert_eq!(stats.cube().channel("streamflow_p100").unwrap().data()[[0]], 30.0);
//! # Ok::<(), teval_ensemble::EnsembleError>(())
//! ```

mod cube;
mod ensembler;
mod error;
mod member_axis;
mod quantile;
mod subset;

pub use cube::{
    AttrValue, Attributes, Channel, Coords, Cube, Dimension, EnsembleCube, array_from_vec,
};
pub use ensembler::{DESCRIPTION_ATTR, Ensembler, SimpleEnsembler, StatisticsCube, reduce};
pub use error::EnsembleError;
pub use member_axis::{MEMBER_AXIS_ALIASES, identify_in, identify_member_axis};
pub use quantile::{QuantileSet, Statistic};
