//! Accumulated validation utilities.
//!
//! [`ValidationCollector`] gathers every problem found while checking a
//! configuration or a file header, so a single [`IoError::Validation`]
//! reports all of them at once.

use std::collections::BTreeSet;

use crate::error::IoError;

// ---------------------------------------------------------------------------
// ValidationCollector
// ---------------------------------------------------------------------------

/// Accumulates validation messages and converts them into one
/// [`IoError::Validation`].
#[derive(Debug, Default)]
pub(crate) struct ValidationCollector {
    errors: Vec<String>,
}

impl ValidationCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record one problem.
    pub(crate) fn push(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Merge another collector's problems into this one.
    pub(crate) fn extend(&mut self, other: ValidationCollector) {
        self.errors.extend(other.errors);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.errors.len()
    }

    /// `Ok(())` if nothing was recorded, otherwise every message joined
    /// with `"; "`.
    pub(crate) fn finish(self) -> Result<(), IoError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: self.errors.len(),
                details: self.errors.join("; "),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Deflate levels accepted by NetCDF-4.
pub(crate) fn check_compression_level(level: u8) -> ValidationCollector {
    let mut errors = ValidationCollector::new();
    if level > 9 {
        errors.push(format!("compression level {level} outside 0..=9"));
    }
    errors
}

/// Report empty and repeated names, e.g. CSV header cells.
pub(crate) fn check_unique_names<'a>(
    kind: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> ValidationCollector {
    let mut errors = ValidationCollector::new();
    let mut seen = BTreeSet::new();
    for (i, name) in names.into_iter().enumerate() {
        if name.trim().is_empty() {
            errors.push(format!("{kind} {i} has an empty name"));
        } else if !seen.insert(name) {
            errors.push(format!("duplicate {kind} '{name}'"));
        }
    }
    errors
}
