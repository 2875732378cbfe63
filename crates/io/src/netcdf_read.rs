//! Low-level NetCDF extraction helpers.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use netcdf::AttributeValue;
use teval_ensemble::{AttrValue, Attributes, Coords, Cube, Dimension, array_from_vec};
use tracing::debug;

use crate::error::IoError;

/// Open a NetCDF file at `path`, returning [`IoError::FileNotFound`] if the
/// path does not exist on disk.
pub(crate) fn open_file(path: &Path) -> Result<netcdf::File, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(netcdf::open(path)?)
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Convert a scalar NetCDF attribute into a cube attribute. Array-valued
/// attributes have no cube counterpart and yield `None`.
pub(crate) fn attr_value(value: AttributeValue) -> Option<AttrValue> {
    match value {
        AttributeValue::Str(s) => Some(AttrValue::Str(s)),
        AttributeValue::Schar(v) => Some(AttrValue::Int(v.into())),
        AttributeValue::Uchar(v) => Some(AttrValue::Int(v.into())),
        AttributeValue::Short(v) => Some(AttrValue::Int(v.into())),
        AttributeValue::Ushort(v) => Some(AttrValue::Int(v.into())),
        AttributeValue::Int(v) => Some(AttrValue::Int(v.into())),
        AttributeValue::Uint(v) => Some(AttrValue::Int(v.into())),
        AttributeValue::Longlong(v) => Some(AttrValue::Int(v)),
        AttributeValue::Ulonglong(v) => i64::try_from(v).ok().map(AttrValue::Int),
        AttributeValue::Float(v) => Some(AttrValue::Float(v.into())),
        AttributeValue::Double(v) => Some(AttrValue::Float(v)),
        _ => None,
    }
}

/// Read every scalar global attribute of `file`.
pub(crate) fn global_attributes(file: &netcdf::File) -> Attributes {
    file.attributes()
        .filter_map(|attr| {
            let value = attr.value().ok().and_then(attr_value)?;
            Some((attr.name().to_string(), value))
        })
        .collect()
}

/// Numeric value of a variable attribute such as `_FillValue`.
fn numeric_attribute(var: &netcdf::Variable<'_>, name: &str) -> Option<f64> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(v.into()),
        AttributeValue::Int(v) => Some(v.into()),
        AttributeValue::Short(v) => Some(v.into()),
        AttributeValue::Longlong(v) => Some(v as f64),
        _ => None,
    }
}

fn string_attribute(var: &netcdf::Variable<'_>, name: &str) -> Option<String> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Time units
// ---------------------------------------------------------------------------

/// Parse CF-convention time units like `"seconds since 1970-01-01 00:00:00"`.
///
/// Returns the length of one unit in seconds and the reference instant.
/// The reference may be a bare date, carry a `T` separator, or end in `Z` /
/// `UTC`; it is always interpreted as UTC.
pub(crate) fn parse_time_units(units: &str) -> Result<(f64, DateTime<Utc>), IoError> {
    let (unit, reference) = units
        .split_once(" since ")
        .ok_or_else(|| IoError::InvalidTime {
            reason: format!("unexpected time units format: '{units}'"),
        })?;

    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
        "minutes" | "minute" | "mins" | "min" => 60.0,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3600.0,
        "days" | "day" | "d" => 86_400.0,
        other => {
            return Err(IoError::InvalidTime {
                reason: format!("unsupported time unit '{other}' in '{units}'"),
            });
        }
    };

    let reference = reference.trim();
    let reference = reference
        .strip_suffix("UTC")
        .or_else(|| reference.strip_suffix('Z'))
        .unwrap_or(reference)
        .trim();

    Ok((seconds_per_unit, parse_reference(reference)?))
}

fn parse_reference(s: &str) -> Result<DateTime<Utc>, IoError> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| IoError::InvalidTime {
            reason: format!("failed to parse reference time '{s}'"),
        })
}

/// Convert numeric offsets from `base` into UTC instants, rounded to the
/// millisecond.
pub(crate) fn offsets_to_times(
    base: DateTime<Utc>,
    seconds_per_unit: f64,
    offsets: &[f64],
) -> Result<Vec<DateTime<Utc>>, IoError> {
    offsets
        .iter()
        .map(|&offset| {
            let millis = offset * seconds_per_unit * 1000.0;
            if !millis.is_finite() {
                return Err(IoError::InvalidTime {
                    reason: format!("non-finite time offset {offset}"),
                });
            }
            base.checked_add_signed(TimeDelta::milliseconds(millis.round() as i64))
                .ok_or_else(|| IoError::InvalidTime {
                    reason: format!("time overflow adding {offset} to {base}"),
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Cube extraction
// ---------------------------------------------------------------------------

/// Read the labels of dimension `name` from its same-named coordinate
/// variable, or fall back to positional labels.
pub(crate) fn read_coords(
    file: &netcdf::File,
    name: &str,
    len: usize,
) -> Result<Coords, IoError> {
    let Some(var) = file.variable(name) else {
        return Ok(Coords::Range(len));
    };

    match var.get_values::<f64, _>(..) {
        Ok(values) => {
            if let Some(units) = string_attribute(&var, "units")
                && units.contains(" since ")
            {
                let (scale, base) = parse_time_units(&units)?;
                return Ok(Coords::Time(offsets_to_times(base, scale, &values)?));
            }
            if values.iter().all(|v| v.is_finite() && v.fract() == 0.0) {
                Ok(Coords::Int(values.iter().map(|&v| v as i64).collect()))
            } else {
                Ok(Coords::Float(values))
            }
        }
        Err(numeric_err) => {
            let labels: Result<Vec<String>, _> = (0..len).map(|i| var.get_string([i])).collect();
            labels.map(Coords::Text).map_err(|_| numeric_err.into())
        }
    }
}

/// Read a numeric variable as `f64`, replacing `_FillValue` and
/// `missing_value` entries with NaN.
pub(crate) fn read_masked_f64(var: &netcdf::Variable<'_>) -> Result<Vec<f64>, IoError> {
    let mut values = var.get_values::<f64, _>(..)?;
    let sentinels: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|name| numeric_attribute(var, name))
        .collect();
    if !sentinels.is_empty() {
        for v in &mut values {
            if sentinels.contains(v) {
                *v = f64::NAN;
            }
        }
    }
    Ok(values)
}

/// Read `path` into a [`Cube`].
///
/// With a non-empty `variables` list, exactly those variables become
/// channels and must all share the first one's dimensions. With an empty
/// list, the first numeric non-coordinate variable fixes the dimensions and
/// every other numeric variable on the same dimensions becomes a channel.
/// Dimension labels come from same-named coordinate variables. Scalar
/// global attributes are carried over.
pub(crate) fn read_cube(path: &Path, variables: &[String]) -> Result<Cube, IoError> {
    let file = open_file(path)?;

    let dim_names: Vec<String> = file.dimensions().map(|d| d.name()).collect();
    let candidates: Vec<String> = if variables.is_empty() {
        file.variables()
            .map(|v| v.name())
            .filter(|name| !dim_names.contains(name))
            .collect()
    } else {
        variables.to_vec()
    };

    let mut layout: Option<Vec<(String, usize)>> = None;
    let mut channels: Vec<(String, Vec<f64>)> = Vec::new();

    for name in &candidates {
        let var = file
            .variable(name)
            .ok_or_else(|| IoError::MissingVariable {
                name: name.clone(),
                path: path.to_path_buf(),
            })?;
        let var_dims: Vec<(String, usize)> =
            var.dimensions().iter().map(|d| (d.name(), d.len())).collect();

        if var_dims.is_empty() {
            debug!(variable = %name, "skipping scalar variable");
            continue;
        }

        match &layout {
            Some(expected) if *expected != var_dims => {
                if !variables.is_empty() {
                    return Err(IoError::Validation {
                        count: 1,
                        details: format!(
                            "variable '{name}' has dimensions {var_dims:?}, expected {expected:?}"
                        ),
                    });
                }
                debug!(variable = %name, "skipping variable on different dimensions");
                continue;
            }
            _ => {}
        }

        let data = match read_masked_f64(&var) {
            Ok(data) => data,
            Err(e) if variables.is_empty() => {
                debug!(variable = %name, error = %e, "skipping non-numeric variable");
                continue;
            }
            Err(e) => return Err(e),
        };

        if layout.is_none() {
            layout = Some(var_dims);
        }
        channels.push((name.clone(), data));
    }

    let layout = layout.ok_or_else(|| IoError::Validation {
        count: 1,
        details: format!("no numeric data variables in {}", path.display()),
    })?;

    let dims = layout
        .iter()
        .map(|(name, len)| Ok(Dimension::new(name.clone(), read_coords(&file, name, *len)?)))
        .collect::<Result<Vec<_>, IoError>>()?;
    let shape: Vec<usize> = layout.iter().map(|(_, len)| *len).collect();

    let mut cube = Cube::new(dims)?;
    for (name, data) in channels {
        let array = array_from_vec(&name, &shape, data)?;
        cube.add_channel(name, array)?;
    }
    cube.set_attrs(global_attributes(&file));

    debug!(
        path = %path.display(),
        dims = ?cube.dim_names(),
        channels = cube.channels().len(),
        "read cube"
    );
    Ok(cube)
}
