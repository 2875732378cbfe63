//! Pure conversion functions: TOML config structs -> crate API config types.

use std::ops::Range;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use teval_ensemble::QuantileSet;
use teval_io::{LoaderConfig, ObservationConfig, WriterConfig};
use teval_metrics::Metric;

use crate::config::*;

/// Parsed `[data].time_slice`.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSelection {
    /// Positions along the time axis, end exclusive.
    Indices(Range<usize>),
    /// Inclusive UTC instant bounds.
    Dates(DateTime<Utc>, DateTime<Utc>),
}

/// Builds the ensemble [`LoaderConfig`] from the `[io]`, `[stats]` and
/// `[loader]` tables.
pub fn build_loader_config(config: &TevalConfig) -> Result<LoaderConfig> {
    let loader = LoaderConfig::default()
        .with_pattern(&config.io.ensemble_pattern)
        .with_member_dim(&config.loader.member_dim)
        .with_member_attribute(&config.loader.member_attribute)
        .with_variables(config.stats.variables.clone());
    loader.validate().context("invalid loader configuration")?;
    Ok(loader)
}

/// Validates `[stats].quantiles`.
pub fn build_quantiles(stats: &StatsToml) -> Result<QuantileSet> {
    QuantileSet::new(stats.quantiles.clone()).context("invalid [stats].quantiles")
}

/// Parses `[stats].metrics`, dropping repeats while keeping first-seen order.
pub fn parse_metrics(names: &[String]) -> Result<Vec<Metric>> {
    let mut metrics = Vec::with_capacity(names.len());
    for name in names {
        let metric: Metric = name.parse().context("invalid [stats].metrics")?;
        if !metrics.contains(&metric) {
            metrics.push(metric);
        }
    }
    if metrics.is_empty() {
        bail!("[stats].metrics must name at least one metric");
    }
    Ok(metrics)
}

/// Converts `[data].feature_ids`: `None` keeps every feature.
pub fn parse_feature_selection(ids: &FeatureIdsToml) -> Result<Option<Vec<i64>>> {
    match ids {
        FeatureIdsToml::Keyword(k) if k.eq_ignore_ascii_case("all") => Ok(None),
        FeatureIdsToml::Keyword(other) => {
            bail!("[data].feature_ids must be \"all\" or a list of ids, got {other:?}")
        }
        FeatureIdsToml::Ids(list) if list.is_empty() => {
            bail!("[data].feature_ids list is empty")
        }
        FeatureIdsToml::Ids(list) => Ok(Some(list.clone())),
    }
}

/// Converts `[data].time_slice`.
///
/// Two indices select positions `start..end`. Two dates select an inclusive
/// instant range; a date-only end covers that whole day.
pub fn parse_time_slice(bounds: &[TimeBound]) -> Result<TimeSelection> {
    match bounds {
        [TimeBound::Index(start), TimeBound::Index(end)] => {
            if start > end {
                bail!("[data].time_slice start {start} is after end {end}");
            }
            Ok(TimeSelection::Indices(*start..*end))
        }
        [TimeBound::Date(start), TimeBound::Date(end)] => {
            let start = parse_bound(start, false)?;
            let end = parse_bound(end, true)?;
            if start > end {
                bail!("[data].time_slice start {start} is after end {end}");
            }
            Ok(TimeSelection::Dates(start, end))
        }
        [_, _] => bail!("[data].time_slice bounds must both be indices or both be dates"),
        other => bail!(
            "[data].time_slice needs exactly two bounds, got {}",
            other.len()
        ),
    }
}

fn parse_bound(s: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("unrecognised [data].time_slice date {s:?}"))?;
    let time = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    match time {
        Some(t) => Ok(t.and_utc()),
        None => bail!("unrecognised [data].time_slice date {s:?}"),
    }
}

/// Builds the statistics [`WriterConfig`].
pub fn build_writer_config(io: &IoToml) -> Result<WriterConfig> {
    let writer = WriterConfig::default().with_compression_level(io.compression_level);
    writer.validate().context("invalid [io].compression_level")?;
    Ok(writer)
}

/// Builds the [`ObservationConfig`].
pub fn build_observation_config(io: &IoToml) -> ObservationConfig {
    ObservationConfig::default().with_cfs_to_cms(io.observations_in_cfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn quantiles_are_validated() {
        let mut stats = StatsToml::default();
        assert_eq!(build_quantiles(&stats).unwrap().values(), &[0.05, 0.95]);

        stats.quantiles = vec![0.5, 1.2];
        assert!(build_quantiles(&stats).is_err());

        stats.quantiles = vec![0.5, 0.5];
        assert!(build_quantiles(&stats).is_err());
    }

    #[test]
    fn metrics_parse_case_insensitively() {
        let names: Vec<String> = ["kge", "NSE", "Kge"].iter().map(|s| s.to_string()).collect();
        assert_eq!(parse_metrics(&names).unwrap(), vec![Metric::Kge, Metric::Nse]);

        assert!(parse_metrics(&["pbias".to_string()]).is_err());
        assert!(parse_metrics(&[]).is_err());
    }

    #[test]
    fn feature_selection() {
        assert_eq!(parse_feature_selection(&FeatureIdsToml::default()).unwrap(), None);
        assert_eq!(
            parse_feature_selection(&FeatureIdsToml::Ids(vec![3, 1])).unwrap(),
            Some(vec![3, 1])
        );
        assert!(parse_feature_selection(&FeatureIdsToml::Keyword("some".into())).is_err());
        assert!(parse_feature_selection(&FeatureIdsToml::Ids(vec![])).is_err());
    }

    #[test]
    fn index_time_slice() {
        let sel = parse_time_slice(&[TimeBound::Index(2), TimeBound::Index(10)]).unwrap();
        assert_eq!(sel, TimeSelection::Indices(2..10));
        assert!(parse_time_slice(&[TimeBound::Index(5), TimeBound::Index(1)]).is_err());
    }

    #[test]
    fn date_time_slice_covers_end_day() {
        let sel = parse_time_slice(&[
            TimeBound::Date("2023-01-01".into()),
            TimeBound::Date("2023-01-03".into()),
        ])
        .unwrap();
        let TimeSelection::Dates(start, end) = sel else {
            panic!("expected dates");
        };
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert!(end > Utc.with_ymd_and_hms(2023, 1, 3, 23, 0, 0).unwrap());
        assert!(end < Utc.with_ymd_and_hms(2023, 1, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn datetime_bounds_are_exact() {
        let sel = parse_time_slice(&[
            TimeBound::Date("2023-01-01T06:00:00Z".into()),
            TimeBound::Date("2023-01-01 12:00:00".into()),
        ])
        .unwrap();
        assert_eq!(
            sel,
            TimeSelection::Dates(
                Utc.with_ymd_and_hms(2023, 1, 1, 6, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap()
            )
        );
    }

    #[test]
    fn malformed_time_slices() {
        assert!(parse_time_slice(&[TimeBound::Index(0)]).is_err());
        assert!(parse_time_slice(&[TimeBound::Index(0), TimeBound::Date("2023-01-01".into())]).is_err());
        assert!(
            parse_time_slice(&[
                TimeBound::Date("yesterday".into()),
                TimeBound::Date("2023-01-01".into())
            ])
            .is_err()
        );
    }

    #[test]
    fn writer_rejects_bad_level() {
        let mut io = IoToml::default();
        assert!(build_writer_config(&io).is_ok());
        io.compression_level = 10;
        assert!(build_writer_config(&io).is_err());
    }

    #[test]
    fn loader_follows_config() {
        let mut config = TevalConfig::default();
        config.io.ensemble_pattern = "member_*.nc".into();
        let loader = build_loader_config(&config).unwrap();
        assert_eq!(loader.pattern(), "member_*.nc");
        assert_eq!(loader.member_dim(), "Formulation_ID");
    }
}
