//! Run command: ensemble statistics followed by gage scoring.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};

use teval_ensemble::{Coords, Cube, Ensembler, SimpleEnsembler, StatisticsCube};
use teval_io::{
    find_hydrofabric, load_ensemble, read_gage_crosswalk, read_observations, read_statistics,
    write_statistics,
};
use teval_io::{CrosswalkConfig, Observations};
use teval_metrics::{GageScore, Metric, MetricsReport, SkippedGage, TimeSeries, align, score_pair, to_json};

use crate::cli::RunArgs;
use crate::config::TevalConfig;
use crate::convert::{self, TimeSelection};

const TIME_DIM: &str = "time";
const FEATURE_DIM: &str = "feature_id";
const METRICS_FILE: &str = "metrics.json";

/// Run the full pipeline.
pub fn run(args: RunArgs) -> Result<()> {
    let _cmd = info_span!("run").entered();

    // 1. Load project TOML
    let toml_str = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read config file: {}", args.config.display()))?;
    let config: TevalConfig = toml::from_str(&toml_str).context("failed to parse TOML config")?;

    let time_sel = config
        .data
        .time_slice
        .as_deref()
        .map(convert::parse_time_slice)
        .transpose()?;
    let features = convert::parse_feature_selection(&config.data.feature_ids)?;
    let metrics = convert::parse_metrics(&config.stats.metrics)?;

    let output_dir = &config.io.output_dir;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    let stats_path = output_dir.join(&config.io.stats_file);

    // 2. Statistics: compute from the ensemble, or reuse a cached file
    let stats = if config.stats.enabled {
        compute_statistics(&config, time_sel.as_ref(), features.as_deref(), &stats_path)?
    } else {
        info!(path = %stats_path.display(), "statistics disabled, reading cached file");
        let cached = read_statistics(&stats_path)
            .with_context(|| format!("failed to read statistics: {}", stats_path.display()))?;
        let cube = subset(cached.into_cube(), time_sel.as_ref(), features.as_deref())?;
        StatisticsCube::from_cube(cube).context("cached statistics are not a statistics cube")?
    };

    let variable = &config.stats.metric_variable;
    if stats.cube().channel(variable).is_none() {
        bail!(
            "metric variable '{variable}' not in statistics (available: {:?})",
            stats.cube().channel_names()
        );
    }

    // 3. Observations and crosswalk
    let Some(obs_path) = config.io.observations_file.as_ref() else {
        info!("no [io].observations_file configured, skipping metrics");
        return Ok(());
    };
    let Some(gpkg) = hydrofabric_path(&config)? else {
        warn!(
            input_dir = %config.io.input_dir.display(),
            "no hydrofabric GeoPackage found, skipping metrics"
        );
        return Ok(());
    };

    let crosswalk = read_gage_crosswalk(&gpkg, &CrosswalkConfig::default())
        .with_context(|| format!("failed to read crosswalk: {}", gpkg.display()))?;
    let observations = read_observations(obs_path, &convert::build_observation_config(&config.io))
        .with_context(|| format!("failed to read observations: {}", obs_path.display()))?;
    info!(
        n_gages = crosswalk.len(),
        n_sites = observations.n_sites(),
        "observations loaded"
    );

    // 4. Score and write the report
    let report = score_gages(stats.cube(), variable, &crosswalk, &observations, &metrics)?;
    info!(
        n_scored = report.entries.len(),
        n_skipped = report.skipped.len(),
        "scoring complete"
    );

    let json = to_json(&report).context("failed to serialize metrics report")?;
    let metrics_path = output_dir.join(METRICS_FILE);
    std::fs::write(&metrics_path, &json)
        .with_context(|| format!("failed to write metrics: {}", metrics_path.display()))?;
    info!(path = %metrics_path.display(), "metrics written");

    Ok(())
}

fn compute_statistics(
    config: &TevalConfig,
    time_sel: Option<&TimeSelection>,
    features: Option<&[i64]>,
    stats_path: &Path,
) -> Result<StatisticsCube> {
    let _span = info_span!("statistics").entered();
    let loader = convert::build_loader_config(config)?;
    let quantiles = convert::build_quantiles(&config.stats)?;
    let writer = convert::build_writer_config(&config.io)?;

    let input_dir = &config.io.input_dir;
    info!(path = %input_dir.display(), pattern = loader.pattern(), "loading ensemble");
    let ensemble = load_ensemble(input_dir, &loader)
        .with_context(|| format!("failed to load ensemble from {}", input_dir.display()))?;
    let ensemble = subset(ensemble, time_sel, features)?;
    info!(shape = ?ensemble.shape(), "ensemble loaded");

    let ensembler = SimpleEnsembler::new(quantiles);
    let stats = ensembler
        .process(&ensemble)
        .with_context(|| format!("{} failed", ensembler.name()))?;

    write_statistics(&stats, stats_path, &writer)
        .with_context(|| format!("failed to write statistics: {}", stats_path.display()))?;
    info!(
        path = %stats_path.display(),
        n_channels = stats.cube().channels().len(),
        "statistics written"
    );
    Ok(stats)
}

/// Apply the configured time slice and feature selection.
fn subset(cube: Cube, time_sel: Option<&TimeSelection>, features: Option<&[i64]>) -> Result<Cube> {
    let cube = match time_sel {
        Some(TimeSelection::Indices(range)) => cube
            .slice_axis(TIME_DIM, range.clone())
            .context("failed to apply [data].time_slice")?,
        Some(TimeSelection::Dates(start, end)) => cube
            .select_time(TIME_DIM, *start, *end)
            .context("failed to apply [data].time_slice")?,
        None => cube,
    };
    let cube = match features {
        Some(ids) => cube
            .select_labels(FEATURE_DIM, ids)
            .context("failed to apply [data].feature_ids")?,
        None => cube,
    };
    if cube.shape().contains(&0) {
        bail!("selection left no data (shape {:?})", cube.shape());
    }
    Ok(cube)
}

/// `[io].hydrofabric_path`, or the first `.gpkg` in the input directory.
fn hydrofabric_path(config: &TevalConfig) -> Result<Option<PathBuf>> {
    if let Some(path) = &config.io.hydrofabric_path {
        return Ok(Some(path.clone()));
    }
    let dir = &config.io.input_dir;
    find_hydrofabric(dir)
        .with_context(|| format!("failed to search for hydrofabric in {}", dir.display()))
}

/// Score every gaged feature of `cube` on `variable`.
///
/// Features without a crosswalk entry are ignored; features whose gage has
/// no observations or no overlapping valid data are reported as skipped.
fn score_gages(
    cube: &Cube,
    variable: &str,
    crosswalk: &BTreeMap<i64, String>,
    observations: &Observations,
    metrics: &[Metric],
) -> Result<MetricsReport> {
    let Some(Coords::Int(feature_ids)) = cube.dim(FEATURE_DIM).map(|d| d.coords()) else {
        bail!("statistics need an integer-labelled '{FEATURE_DIM}' dimension");
    };
    let Some(Coords::Time(times)) = cube.dim(TIME_DIM).map(|d| d.coords()) else {
        bail!("statistics need a time-labelled '{TIME_DIM}' dimension to score");
    };

    let gaged: Vec<(i64, &str)> = feature_ids
        .iter()
        .filter_map(|fid| crosswalk.get(fid).map(|g| (*fid, g.as_str())))
        .collect();
    debug!(
        n_features = feature_ids.len(),
        n_gaged = gaged.len(),
        "matched features to gages"
    );

    let outcomes: Vec<Result<GageScore, SkippedGage>> = gaged
        .par_iter()
        .map(|&(fid, gage)| score_one(cube, variable, times, fid, gage, observations, metrics))
        .collect();

    let mut report = MetricsReport::new(variable);
    for outcome in outcomes {
        match outcome {
            Ok(score) => report.entries.push(score),
            Err(skip) => {
                warn!(
                    feature_id = skip.feature_id,
                    gage = %skip.gage_id,
                    reason = %skip.reason,
                    "gage skipped"
                );
                report.skipped.push(skip);
            }
        }
    }
    Ok(report)
}

fn score_one(
    cube: &Cube,
    variable: &str,
    times: &[DateTime<Utc>],
    feature_id: i64,
    gage: &str,
    observations: &Observations,
    metrics: &[Metric],
) -> Result<GageScore, SkippedGage> {
    let skip = |reason: String| SkippedGage {
        feature_id,
        gage_id: gage.to_string(),
        reason,
    };

    let obs = observations
        .site(gage)
        .ok_or_else(|| skip("no observations for gage".to_string()))?;
    let (_, values) = cube
        .series(variable, TIME_DIM, FEATURE_DIM, feature_id)
        .map_err(|e| skip(e.to_string()))?;
    let sim = TimeSeries::new(&feature_id.to_string(), times.to_vec(), values)
        .map_err(|e| skip(e.to_string()))?;
    let pair = align(&sim, obs).map_err(|e| skip(e.to_string()))?;

    Ok(GageScore {
        feature_id,
        gage_id: gage.to_string(),
        n_points: pair.len(),
        scores: score_pair(&pair, metrics),
    })
}
