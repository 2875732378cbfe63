//! Error types for teval-io.

use std::path::PathBuf;

/// Error type for all fallible operations in the teval-io crate.
///
/// Covers file-system failures, format-specific errors from NetCDF, CSV and
/// SQLite, time decoding problems, and shape mismatches between ensemble
/// members.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file or directory does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error originating from the NetCDF library.
    #[error("netcdf error: {reason}")]
    Netcdf {
        /// Description of the underlying NetCDF failure.
        reason: String,
    },

    /// Wraps an error originating from the CSV reader.
    #[error("csv error: {reason}")]
    Csv {
        /// Description of the underlying CSV failure.
        reason: String,
    },

    /// Wraps an error originating from SQLite (GeoPackage access).
    #[error("sqlite error: {reason}")]
    Sqlite {
        /// Description of the underlying SQLite failure.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Returned when a required variable, column or table is not present.
    #[error("variable '{name}' not found in {}", path.display())]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when a dimension has an unexpected size.
    #[error("dimension '{name}' mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Name of the dimension.
        name: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when a time value or time unit cannot be parsed.
    #[error("invalid time: {reason}")]
    InvalidTime {
        /// Description of the time parsing issue.
        reason: String,
    },

    /// No file in the directory matched the ensemble pattern.
    #[error("no files matching '{pattern}' in {}", dir.display())]
    NoFilesMatched {
        /// Directory that was searched.
        dir: PathBuf,
        /// Glob pattern used.
        pattern: String,
    },

    /// Files matched, but none of them could be loaded.
    #[error("could not load any of {attempted} ensemble file(s)")]
    NoValidFiles {
        /// Number of files attempted.
        attempted: usize,
    },

    /// Wraps an error from the teval-ensemble crate.
    #[error("ensemble error: {0}")]
    Ensemble(#[from] teval_ensemble::EnsembleError),

    /// Wraps an error from the teval-metrics crate.
    #[error("metrics error: {0}")]
    Metrics(#[from] teval_metrics::MetricsError),

    /// Plain file-system failure.
    #[error("i/o error on {}: {reason}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },
}

impl From<netcdf::Error> for IoError {
    fn from(e: netcdf::Error) -> Self {
        IoError::Netcdf {
            reason: e.to_string(),
        }
    }
}

impl From<csv::Error> for IoError {
    fn from(e: csv::Error) -> Self {
        IoError::Csv {
            reason: e.to_string(),
        }
    }
}

impl From<rusqlite::Error> for IoError {
    fn from(e: rusqlite::Error) -> Self {
        IoError::Sqlite {
            reason: e.to_string(),
        }
    }
}
