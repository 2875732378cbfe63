//! `init` and `config-help` commands.

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InitArgs;
use crate::config::TevalConfig;

/// Every option as `(table, key, description)`, in file order.
const FIELD_DOCS: &[(&str, &str, &str)] = &[
    ("io", "input_dir", "Directory holding ensemble member files and the hydrofabric"),
    ("io", "output_dir", "Directory for statistics and metrics output"),
    ("io", "ensemble_pattern", "Glob matched against member file names in input_dir"),
    ("io", "stats_file", "Statistics NetCDF file name, relative to output_dir"),
    ("io", "hydrofabric_path", "GeoPackage with the gage crosswalk; first *.gpkg in input_dir when unset"),
    ("io", "observations_file", "Wide CSV of gage observations; metrics are skipped when unset"),
    ("io", "observations_in_cfs", "Convert observations from cubic feet to cubic metres per second"),
    ("io", "compression_level", "Deflate level for the statistics file (0-9)"),
    ("data", "time_slice", "Two indices [start, end) or two ISO dates (inclusive); all times when unset"),
    ("data", "feature_ids", "\"all\" or a list of feature ids"),
    ("stats", "enabled", "Compute statistics; when false, read the cached stats_file"),
    ("stats", "quantiles", "Quantile fractions in [0, 1] reported alongside mean, median and std"),
    ("stats", "metrics", "Metrics to compute: any of nse, kge, rmse"),
    ("stats", "metric_variable", "Statistics channel scored against observations"),
    ("stats", "variables", "Member variables to summarize; every numeric variable when empty"),
    ("loader", "member_dim", "Name of the stacked member dimension"),
    ("loader", "member_attribute", "Global attribute holding each file's member id"),
];

/// Write the default configuration to `args.output`.
pub fn run_init(args: InitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.output.display()
        );
    }
    let text = default_toml()?;
    std::fs::write(&args.output, text)
        .with_context(|| format!("failed to write config: {}", args.output.display()))?;
    info!(path = %args.output.display(), "default configuration written");
    Ok(())
}

/// Print every option with its default and description.
pub fn run_config_help() -> Result<()> {
    print!("{}", config_help()?);
    Ok(())
}

fn default_toml() -> Result<String> {
    toml::to_string_pretty(&TevalConfig::default()).context("failed to serialize default config")
}

fn config_help() -> Result<String> {
    let defaults =
        toml::Value::try_from(TevalConfig::default()).context("failed to serialize default config")?;

    let mut out = String::new();
    let mut current = "";
    for &(table, key, description) in FIELD_DOCS {
        if table != current {
            if !current.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{table}]\n"));
            current = table;
        }
        let default = defaults
            .get(table)
            .and_then(|t| t.get(key))
            .map_or_else(|| "(unset)".to_string(), ToString::to_string);
        out.push_str(&format!("  {key} = {default}\n      {description}\n"));
    }
    Ok(out)
}
