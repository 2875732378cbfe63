//! NetCDF-4 writer and reader for statistics cubes.

use std::path::Path;

use teval_ensemble::{AttrValue, Coords, StatisticsCube};
use tracing::{debug, info};

use crate::error::IoError;
use crate::netcdf_read;
use crate::validate::{ValidationCollector, check_compression_level};

/// Units written on time coordinate variables.
pub const TIME_UNITS: &str = "seconds since 1970-01-01 00:00:00";

// ---------------------------------------------------------------------------
// WriterConfig
// ---------------------------------------------------------------------------

/// Configuration for writing a statistics cube.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Deflate level for data variables (0 disables compression).
    compression_level: u8,
    /// Enable the byte-shuffle filter alongside deflate.
    shuffle: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression_level: 5,
            shuffle: true,
        }
    }
}

impl WriterConfig {
    /// Set the deflate level (0-9).
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = level;
        self
    }

    /// Enable or disable the shuffle filter.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn compression_level(&self) -> u8 {
        self.compression_level
    }

    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if the compression level exceeds 9.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut errors = ValidationCollector::new();
        errors.extend(check_compression_level(self.compression_level));
        errors.finish()
    }
}

// ---------------------------------------------------------------------------
// write_statistics
// ---------------------------------------------------------------------------

/// Write `stats` to a NetCDF-4 file at `path`, replacing any existing file.
///
/// Each dimension with labels gets a same-named coordinate variable:
/// integer labels as `i64`, float labels as `f64`, text labels as strings,
/// and timestamps as `f64` seconds since the Unix epoch. Every channel is
/// written as a deflate-compressed `f64` variable. Cube attributes become
/// global attributes.
///
/// # Errors
///
/// Returns [`IoError::Validation`] for an invalid config, or
/// [`IoError::Netcdf`] if the file cannot be created or written.
pub fn write_statistics(
    stats: &StatisticsCube,
    path: &Path,
    config: &WriterConfig,
) -> Result<(), IoError> {
    config.validate()?;
    let cube = stats.cube();
    let mut file = netcdf::create(path)?;

    for dim in cube.dims() {
        file.add_dimension(dim.name(), dim.len())?;
    }

    // -- Coordinate variables ----------------------------------------------

    for dim in cube.dims() {
        let name = dim.name();
        match dim.coords() {
            Coords::Range(_) => {}
            Coords::Int(ids) => {
                let mut var = file.add_variable::<i64>(name, &[name])?;
                var.put_values(ids, ..)?;
            }
            Coords::Float(values) => {
                let mut var = file.add_variable::<f64>(name, &[name])?;
                var.put_values(values, ..)?;
            }
            Coords::Time(times) => {
                let seconds: Vec<f64> = times
                    .iter()
                    .map(|t| t.timestamp_millis() as f64 / 1000.0)
                    .collect();
                let mut var = file.add_variable::<f64>(name, &[name])?;
                var.put_attribute("units", TIME_UNITS)?;
                var.put_attribute("calendar", "standard")?;
                var.put_attribute("standard_name", "time")?;
                var.put_values(&seconds, ..)?;
            }
            Coords::Text(labels) => {
                let mut var = file.add_string_variable(name, &[name])?;
                for (i, label) in labels.iter().enumerate() {
                    var.put_string(label, [i])?;
                }
            }
        }
    }

    // -- Data variables ----------------------------------------------------

    let dim_names = cube.dim_names();
    for channel in cube.channels() {
        let mut var = file.add_variable::<f64>(channel.name(), &dim_names)?;
        if config.compression_level > 0 {
            var.set_compression(i32::from(config.compression_level), config.shuffle)?;
        }
        let values: Vec<f64> = channel.data().iter().copied().collect();
        var.put_values(&values, ..)?;
        debug!(variable = channel.name(), "wrote statistics variable");
    }

    // -- Global attributes -------------------------------------------------

    for (key, value) in cube.attrs() {
        match value {
            AttrValue::Str(s) => file.add_attribute(key, s.as_str())?,
            AttrValue::Int(i) => file.add_attribute(key, *i)?,
            AttrValue::Float(x) => file.add_attribute(key, *x)?,
        };
    }

    info!(
        path = %path.display(),
        variables = cube.channels().len(),
        compression = config.compression_level,
        "saved ensemble statistics"
    );
    Ok(())
}

/// Read a statistics file written by [`write_statistics`].
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`], [`IoError::Netcdf`], or
/// [`IoError::Ensemble`] if the file still carries a member dimension.
pub fn read_statistics(path: &Path) -> Result<StatisticsCube, IoError> {
    let cube = netcdf_read::read_cube(path, &[])?;
    info!(
        path = %path.display(),
        variables = cube.channels().len(),
        "loaded cached ensemble statistics"
    );
    Ok(StatisticsCube::from_cube(cube)?)
}
