//! Ensemble discovery and member stacking.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::Glob;
use ndarray::{ArrayViewD, Axis};
use teval_ensemble::{AttrValue, Coords, Cube, Dimension, EnsembleCube};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::IoError;
use crate::netcdf_read;
use crate::validate::ValidationCollector;

// ---------------------------------------------------------------------------
// LoaderConfig
// ---------------------------------------------------------------------------

/// Configuration for loading one NetCDF file per ensemble member.
///
/// The [`Default`] implementation matches t-route output written per
/// formulation (`troute_output_formulation_*.nc`, member id in the
/// `Formulation_ID` global attribute).
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Glob matched against file names in the input directory.
    pattern: String,
    /// Name of the stacked member dimension.
    member_dim: String,
    /// Global attribute holding the member identifier.
    member_attribute: String,
    /// Data variables to load; empty loads every numeric variable.
    variables: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            pattern: "troute_output_formulation_*.nc".into(),
            member_dim: "Formulation_ID".into(),
            member_attribute: "Formulation_ID".into(),
            variables: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Set the file-name glob.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Set the name of the stacked member dimension.
    pub fn with_member_dim(mut self, name: impl Into<String>) -> Self {
        self.member_dim = name.into();
        self
    }

    /// Set the global attribute read for each member's identifier.
    pub fn with_member_attribute(mut self, name: impl Into<String>) -> Self {
        self.member_attribute = name.into();
        self
    }

    /// Restrict loading to the named data variables.
    pub fn with_variables(mut self, variables: Vec<String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn member_dim(&self) -> &str {
        &self.member_dim
    }

    /// Validate that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] listing every empty name and an
    /// unparsable glob.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut errors = ValidationCollector::new();
        if self.pattern.trim().is_empty() {
            errors.push("ensemble pattern must not be empty");
        } else if let Err(e) = Glob::new(&self.pattern) {
            errors.push(format!("invalid ensemble pattern '{}': {e}", self.pattern));
        }
        if self.member_dim.trim().is_empty() {
            errors.push("member dimension name must not be empty");
        }
        if self.member_attribute.trim().is_empty() {
            errors.push("member attribute name must not be empty");
        }
        if self.variables.iter().any(|v| v.trim().is_empty()) {
            errors.push("variable names must not be empty");
        }
        errors.finish()
    }
}

// ---------------------------------------------------------------------------
// Member identifiers
// ---------------------------------------------------------------------------

/// Where a member's identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemberIdSource {
    Attribute,
    FileName,
    Index,
}

/// Resolve a member identifier: the configured global attribute, else the
/// last run of digits in the file stem, else the file's position.
pub(crate) fn member_label(
    attr: Option<&AttrValue>,
    stem: &str,
    index: usize,
) -> (i64, MemberIdSource) {
    let from_attr = attr.and_then(|value| match value {
        AttrValue::Int(i) => Some(*i),
        AttrValue::Float(x) if x.is_finite() && x.fract() == 0.0 => Some(*x as i64),
        AttrValue::Str(s) => s.trim().parse().ok(),
        AttrValue::Float(_) => None,
    });
    if let Some(id) = from_attr {
        return (id, MemberIdSource::Attribute);
    }
    if let Some(id) = last_digit_run(stem) {
        return (id, MemberIdSource::FileName);
    }
    (index as i64, MemberIdSource::Index)
}

fn last_digit_run(s: &str) -> Option<i64> {
    let end = s.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = s[..end]
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |i| i + 1);
    s[start..end].parse().ok()
}

// ---------------------------------------------------------------------------
// load_ensemble
// ---------------------------------------------------------------------------

/// Files in `dir` (not recursive) whose names match `pattern`, sorted by path.
pub(crate) fn discover(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, IoError> {
    let matcher = Glob::new(pattern)
        .map_err(|e| IoError::Validation {
            count: 1,
            details: format!("invalid file pattern '{pattern}': {e}"),
        })?
        .compile_matcher();

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| matcher.is_match(entry.file_name()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    Ok(files)
}

/// Load every matching file in `dir` and stack them along a new leading
/// member dimension.
///
/// Files that fail to read are logged and skipped. Member labels are
/// resolved per file (see [`LoaderConfig`]); repeated labels are kept and
/// logged.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if `dir` is missing,
/// [`IoError::NoFilesMatched`] if nothing matches the pattern,
/// [`IoError::NoValidFiles`] if every file fails, and
/// [`IoError::DimensionMismatch`] / [`IoError::Validation`] if the members
/// do not share dimensions, labels and channels.
pub fn load_ensemble(dir: &Path, config: &LoaderConfig) -> Result<EnsembleCube, IoError> {
    config.validate()?;
    if !dir.is_dir() {
        return Err(IoError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let files = discover(dir, &config.pattern)?;
    if files.is_empty() {
        return Err(IoError::NoFilesMatched {
            dir: dir.to_path_buf(),
            pattern: config.pattern.clone(),
        });
    }
    info!(n_files = files.len(), dir = %dir.display(), "found ensemble files");

    let mut members: Vec<(i64, Cube)> = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        let cube = match netcdf_read::read_cube(path, &config.variables) {
            Ok(cube) => cube,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load ensemble file, skipping");
                continue;
            }
        };
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let (label, source) =
            member_label(cube.attrs().get(&config.member_attribute), stem, index);
        if source != MemberIdSource::Attribute {
            warn!(
                path = %path.display(),
                attribute = %config.member_attribute,
                member = label,
                ?source,
                "member attribute missing, using fallback identifier"
            );
        }
        debug!(path = %path.display(), member = label, "loaded member");
        members.push((label, cube));
    }

    if members.is_empty() {
        return Err(IoError::NoValidFiles {
            attempted: files.len(),
        });
    }

    let mut seen: BTreeMap<i64, usize> = BTreeMap::new();
    for (label, _) in &members {
        *seen.entry(*label).or_default() += 1;
    }
    for (label, count) in seen.iter().filter(|(_, c)| **c > 1) {
        warn!(member = label, count, "duplicate member identifier");
    }

    let cube = stack_members(members, &config.member_dim, &config.member_attribute)?;
    info!(
        members = cube.dims()[0].len(),
        channels = cube.channels().len(),
        "ensemble loaded"
    );
    Ok(cube)
}

/// Stack member cubes along a new leading `member_dim`.
pub(crate) fn stack_members(
    members: Vec<(i64, Cube)>,
    member_dim: &str,
    member_attribute: &str,
) -> Result<EnsembleCube, IoError> {
    let Some((_, reference)) = members.first() else {
        return Err(IoError::NoValidFiles { attempted: 0 });
    };

    for (label, cube) in &members[1..] {
        check_compatible(reference, cube, *label)?;
    }

    let labels: Vec<i64> = members.iter().map(|(label, _)| *label).collect();
    let mut dims = vec![Dimension::new(member_dim, Coords::Int(labels))];
    dims.extend(reference.dims().iter().cloned());

    let mut stacked = Cube::new(dims)?;
    for name in reference.channel_names() {
        let views: Vec<ArrayViewD<'_, f64>> = members
            .iter()
            .filter_map(|(_, cube)| cube.channel(name))
            .map(|ch| ch.data().view())
            .collect();
        let array = ndarray::stack(Axis(0), &views).map_err(|e| IoError::Validation {
            count: 1,
            details: format!("cannot stack channel '{name}': {e}"),
        })?;
        stacked.add_channel(name, array)?;
    }

    let mut attrs = reference.attrs().clone();
    attrs.remove(member_attribute);
    stacked.set_attrs(attrs);
    Ok(stacked)
}

fn check_compatible(reference: &Cube, other: &Cube, label: i64) -> Result<(), IoError> {
    if reference.dim_names() != other.dim_names() {
        return Err(IoError::Validation {
            count: 1,
            details: format!(
                "member {label} has dimensions {:?}, expected {:?}",
                other.dim_names(),
                reference.dim_names()
            ),
        });
    }
    for (want, got) in reference.dims().iter().zip(other.dims()) {
        if want.len() != got.len() {
            return Err(IoError::DimensionMismatch {
                name: want.name().to_string(),
                expected: want.len(),
                got: got.len(),
            });
        }
        if want.coords() != got.coords() {
            return Err(IoError::Validation {
                count: 1,
                details: format!(
                    "member {label} has different '{}' labels",
                    want.name()
                ),
            });
        }
    }
    if reference.channel_names() != other.channel_names() {
        return Err(IoError::Validation {
            count: 1,
            details: format!(
                "member {label} has channels {:?}, expected {:?}",
                other.channel_names(),
                reference.channel_names()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn default_config_values() {
        let config = LoaderConfig::default();
        assert_eq!(config.pattern(), "troute_output_formulation_*.nc");
        assert_eq!(config.member_dim(), "Formulation_ID");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_collects_every_problem() {
        let config = LoaderConfig::default()
            .with_pattern("")
            .with_member_dim(" ")
            .with_variables(vec![String::new()]);
        match config.validate() {
            Err(IoError::Validation { count, .. }) => assert_eq!(count, 3),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_bad_glob() {
        let config = LoaderConfig::default().with_pattern("member_[.nc");
        assert!(matches!(config.validate(), Err(IoError::Validation { .. })));
    }

    #[test]
    fn member_label_prefers_attribute() {
        let attr = AttrValue::Int(42);
        assert_eq!(
            member_label(Some(&attr), "troute_output_formulation_7", 0),
            (42, MemberIdSource::Attribute)
        );
        let attr = AttrValue::Str(" 9 ".into());
        assert_eq!(member_label(Some(&attr), "x", 0).0, 9);
        let attr = AttrValue::Float(3.0);
        assert_eq!(member_label(Some(&attr), "x", 0).0, 3);
    }

    #[test]
    fn member_label_falls_back_to_file_stem() {
        assert_eq!(
            member_label(None, "troute_output_formulation_12", 0),
            (12, MemberIdSource::FileName)
        );
        assert_eq!(
            member_label(None, "run2_member_031", 5),
            (31, MemberIdSource::FileName)
        );
        let attr = AttrValue::Str("cfe".into());
        assert_eq!(
            member_label(Some(&attr), "formulation_4", 0),
            (4, MemberIdSource::FileName)
        );
    }

    #[test]
    fn member_label_falls_back_to_index() {
        assert_eq!(
            member_label(None, "ensemble_member", 3),
            (3, MemberIdSource::Index)
        );
    }

    #[test]
    fn last_digit_run_edges() {
        assert_eq!(last_digit_run("123"), Some(123));
        assert_eq!(last_digit_run("a1b22"), Some(22));
        assert_eq!(last_digit_run("a1b22c"), Some(22));
        assert_eq!(last_digit_run("abc"), None);
    }

    fn member(value: f64, features: Vec<i64>) -> Cube {
        let n = features.len();
        Cube::new(vec![
            Dimension::new("time", Coords::Range(2)),
            Dimension::new("feature_id", Coords::Int(features)),
        ])
        .unwrap()
        .with_channel("streamflow", ArrayD::from_elem(IxDyn(&[2, n]), value))
        .unwrap()
        .with_attr("Formulation_ID", value as i64)
        .with_attr("title", "t-route")
    }

    #[test]
    fn stack_adds_leading_member_axis() {
        let members = vec![(1, member(1.0, vec![10, 20])), (2, member(2.0, vec![10, 20]))];
        let cube = stack_members(members, "Formulation_ID", "Formulation_ID").unwrap();
        assert_eq!(cube.dim_names(), vec!["Formulation_ID", "time", "feature_id"]);
        assert_eq!(cube.shape(), vec![2, 2, 2]);
        assert_eq!(
            cube.dim("Formulation_ID").unwrap().coords(),
            &Coords::Int(vec![1, 2])
        );
        let data = cube.channel("streamflow").unwrap().data();
        assert_eq!(data[[0, 1, 1]], 1.0);
        assert_eq!(data[[1, 0, 0]], 2.0);
        assert!(cube.attrs().get("Formulation_ID").is_none());
        assert!(cube.attrs().contains_key("title"));
    }

    #[test]
    fn stack_rejects_length_mismatch() {
        let members = vec![(1, member(1.0, vec![10, 20])), (2, member(2.0, vec![10]))];
        let err = stack_members(members, "member", "Formulation_ID").unwrap_err();
        assert!(matches!(err, IoError::DimensionMismatch { .. }));
    }

    #[test]
    fn stack_rejects_label_mismatch() {
        let members = vec![(1, member(1.0, vec![10, 20])), (2, member(2.0, vec![10, 30]))];
        let err = stack_members(members, "member", "Formulation_ID").unwrap_err();
        assert!(matches!(err, IoError::Validation { .. }));
    }
}
