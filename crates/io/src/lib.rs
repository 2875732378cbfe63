//! # teval-io
//!
//! File collaborators around the ensemble and metrics cores: load per-member
//! t-route NetCDF output into one ensemble cube, write and re-read
//! statistics NetCDF files, read gage observations from CSV, and read the
//! feature-to-gage crosswalk from a hydrofabric GeoPackage.
//!
//! Unit and timezone normalization happens here, never in the cores:
//! observations come out in UTC and, if requested, in m³/s.

mod crosswalk;
mod ensemble_read;
mod error;
mod netcdf_read;
mod observed;
mod stats_write;
mod validate;

pub use crosswalk::{
    CrosswalkConfig, HYDROFABRIC_PATTERN, feature_number, find_hydrofabric, read_gage_crosswalk,
};
pub use ensemble_read::{LoaderConfig, load_ensemble};
pub use error::IoError;
pub use observed::{CFS_TO_CMS, ObservationConfig, Observations, read_observations};
pub use stats_write::{TIME_UNITS, WriterConfig, read_statistics, write_statistics};
