use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level teval configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TevalConfig {
    /// Input and output locations.
    #[serde(default)]
    pub io: IoToml,

    /// Time and feature subsetting.
    #[serde(default)]
    pub data: DataToml,

    /// Statistics and metrics settings.
    #[serde(default)]
    pub stats: StatsToml,

    /// Ensemble file loading settings.
    #[serde(default)]
    pub loader: LoaderToml,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IoToml {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_ensemble_pattern")]
    pub ensemble_pattern: String,
    /// Relative paths resolve against `output_dir`.
    #[serde(default = "default_stats_file")]
    pub stats_file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hydrofabric_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations_file: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub observations_in_cfs: bool,
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,
}

impl Default for IoToml {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            ensemble_pattern: default_ensemble_pattern(),
            stats_file: default_stats_file(),
            hydrofabric_path: None,
            observations_file: None,
            observations_in_cfs: true,
            compression_level: default_compression_level(),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_ensemble_pattern() -> String {
    "troute_output_formulation_*.nc".to_string()
}
fn default_stats_file() -> PathBuf {
    PathBuf::from("ensemble_stats.nc")
}
fn default_true() -> bool {
    true
}
fn default_compression_level() -> u8 {
    5
}

/// One end of a time slice: a position or an ISO date/datetime.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TimeBound {
    Index(usize),
    Date(String),
}

/// `"all"` or an explicit list of feature ids.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FeatureIdsToml {
    Keyword(String),
    Ids(Vec<i64>),
}

impl Default for FeatureIdsToml {
    fn default() -> Self {
        FeatureIdsToml::Keyword("all".to_string())
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DataToml {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slice: Option<Vec<TimeBound>>,
    #[serde(default)]
    pub feature_ids: FeatureIdsToml,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StatsToml {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_quantiles")]
    pub quantiles: Vec<f64>,
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,
    #[serde(default = "default_metric_variable")]
    pub metric_variable: String,
    /// Empty loads every numeric variable.
    #[serde(default)]
    pub variables: Vec<String>,
}

impl Default for StatsToml {
    fn default() -> Self {
        Self {
            enabled: true,
            quantiles: default_quantiles(),
            metrics: default_metrics(),
            metric_variable: default_metric_variable(),
            variables: Vec::new(),
        }
    }
}

fn default_quantiles() -> Vec<f64> {
    vec![0.05, 0.95]
}
fn default_metrics() -> Vec<String> {
    vec!["kge".to_string(), "nse".to_string(), "rmse".to_string()]
}
fn default_metric_variable() -> String {
    "streamflow_mean".to_string()
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderToml {
    #[serde(default = "default_member_name")]
    pub member_dim: String,
    #[serde(default = "default_member_name")]
    pub member_attribute: String,
}

impl Default for LoaderToml {
    fn default() -> Self {
        Self {
            member_dim: default_member_name(),
            member_attribute: default_member_name(),
        }
    }
}

fn default_member_name() -> String {
    "Formulation_ID".to_string()
}
