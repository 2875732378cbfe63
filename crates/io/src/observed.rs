//! Gage observations from wide CSV files.
//!
//! Layout: the first column holds timestamps, every other column is one
//! USGS site id with discharge values. This is the shape NWIS instantaneous
//! values take after pivoting by site.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use teval_metrics::TimeSeries;
use tracing::{debug, info};

use crate::error::IoError;
use crate::validate::check_unique_names;

/// Cubic feet per second to cubic metres per second.
pub const CFS_TO_CMS: f64 = 0.028316847;

/// Cell contents treated as a missing value (compared case-insensitively).
const MISSING_TOKENS: [&str; 4] = ["nan", "na", "null", "-"];

// ---------------------------------------------------------------------------
// ObservationConfig
// ---------------------------------------------------------------------------

/// Configuration for reading observation CSVs.
#[derive(Debug, Clone, Default)]
pub struct ObservationConfig {
    /// Multiply every value by [`CFS_TO_CMS`].
    convert_cfs_to_cms: bool,
}

impl ObservationConfig {
    /// Convert values from CFS to CMS on read.
    pub fn with_cfs_to_cms(mut self, convert: bool) -> Self {
        self.convert_cfs_to_cms = convert;
        self
    }

    pub fn converts_cfs(&self) -> bool {
        self.convert_cfs_to_cms
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// Discharge series per site, all on UTC timestamps.
#[derive(Debug, Clone, Default)]
pub struct Observations {
    sites: BTreeMap<String, TimeSeries<DateTime<Utc>>>,
}

impl Observations {
    /// Series for one site id.
    pub fn site(&self, id: &str) -> Option<&TimeSeries<DateTime<Utc>>> {
        self.sites.get(id)
    }

    /// Site ids in sorted order.
    pub fn site_ids(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(String::as_str)
    }

    /// Number of sites.
    pub fn n_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Timestamp parsing
// ---------------------------------------------------------------------------

/// Parse one timestamp cell into UTC.
///
/// Returns the instant and whether the input lacked an offset. Values with
/// an offset are converted to UTC; values without one are taken as UTC;
/// bare dates become midnight UTC.
pub(crate) fn parse_timestamp(s: &str) -> Result<(DateTime<Utc>, bool), IoError> {
    const OFFSET_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S%z",
        "%Y-%m-%d %H:%M%:z",
        "%Y-%m-%dT%H:%M%:z",
    ];
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok((dt.with_timezone(&Utc), false));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok((dt.with_timezone(&Utc), false));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok((naive.and_utc(), true));
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok((midnight.and_utc(), true));
    }
    Err(IoError::InvalidTime {
        reason: format!("unrecognised timestamp '{s}'"),
    })
}

fn parse_value(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || MISSING_TOKENS.iter().any(|t| cell.eq_ignore_ascii_case(t)) {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}

// ---------------------------------------------------------------------------
// read_observations
// ---------------------------------------------------------------------------

/// Read a wide observation CSV.
///
/// Empty cells and `NaN`/`NA` tokens are missing values. Timestamps are
/// normalized to UTC; naive timestamps are assumed to already be UTC and
/// this is logged once per file.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`], [`IoError::Csv`] for malformed rows or
/// unparsable values, [`IoError::InvalidTime`] for bad timestamps,
/// [`IoError::Validation`] for empty or repeated site columns, and
/// [`IoError::Metrics`] for repeated timestamps.
pub fn read_observations(path: &Path, config: &ObservationConfig) -> Result<Observations, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(IoError::Validation {
            count: 1,
            details: format!(
                "{} needs a timestamp column and at least one site column",
                path.display()
            ),
        });
    }
    let site_ids: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    check_unique_names("site column", site_ids.iter().map(String::as_str)).finish()?;

    let scale = if config.convert_cfs_to_cms { CFS_TO_CMS } else { 1.0 };
    let mut times = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); site_ids.len()];
    let mut n_naive = 0usize;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let stamp = record.get(0).unwrap_or_default();
        let (time, naive) = parse_timestamp(stamp)?;
        if naive {
            n_naive += 1;
        }
        times.push(time);

        for (col, values) in columns.iter_mut().enumerate() {
            let cell = record.get(col + 1).unwrap_or_default();
            let value = parse_value(cell).ok_or_else(|| IoError::Csv {
                reason: format!(
                    "row {}: cannot parse '{cell}' for site {} in {}",
                    row + 1,
                    site_ids[col],
                    path.display()
                ),
            })?;
            values.push(value * scale);
        }
    }

    if n_naive > 0 {
        info!(
            path = %path.display(),
            n_naive,
            "timestamps without offset assumed to be UTC"
        );
    }

    let mut sites = BTreeMap::new();
    for (id, values) in site_ids.into_iter().zip(columns) {
        let series = TimeSeries::new(&id, times.clone(), values)?;
        sites.insert(id, series);
    }

    debug!(
        path = %path.display(),
        n_sites = sites.len(),
        n_rows = times.len(),
        cfs_to_cms = config.convert_cfs_to_cms,
        "read observations"
    );
    Ok(Observations { sites })
}
