//! Integration tests: alignment and scoring over UTC-indexed series.

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use teval_metrics::{Metric, MetricsError, TimeSeries, align, calculate, calculate_all};

fn hour(h: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap() + Duration::hours(h)
}

fn series(name: &str, hours: &[i64], values: &[f64]) -> TimeSeries<DateTime<Utc>> {
    TimeSeries::new(name, hours.iter().map(|&h| hour(h)).collect(), values.to_vec()).unwrap()
}

#[test]
fn perfect_match_scores() {
    let values = [3.0, 7.5, 12.0, 4.25, 9.0];
    let sim = series("sim", &[0, 1, 2, 3, 4], &values);
    let obs = series("obs", &[0, 1, 2, 3, 4], &values);

    let scores = calculate_all(&sim, &obs).unwrap();
    assert_eq!(scores.len(), 3);
    assert_relative_eq!(scores.get(Metric::Nse).unwrap(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(scores.get(Metric::Kge).unwrap(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(scores.get(Metric::Rmse).unwrap(), 0.0, epsilon = 1e-12);
}

#[test]
fn align_keeps_only_shared_valid_timestamps() {
    let sim = series("sim", &[1, 2, 3, 4], &[1.0, 2.0, 3.0, 4.0]);
    let obs = series("obs", &[2, 3, 5], &[2.0, f64::NAN, 5.0]);

    let pair = align(&sim, &obs).unwrap();
    assert_eq!(pair.index(), &[hour(2)]);
}

#[test]
fn disjoint_ranges_fail() {
    let sim = series("sim", &[0, 1, 2], &[1.0, 2.0, 3.0]);
    let obs = series("obs", &[10, 11], &[1.0, 2.0]);

    assert_eq!(align(&sim, &obs).unwrap_err(), MetricsError::NoOverlap);
    assert_eq!(calculate_all(&sim, &obs).unwrap_err(), MetricsError::NoOverlap);
}

#[test]
fn constant_observations_give_neg_infinity_nse() {
    let obs = series("obs", &[0, 1, 2, 3], &[5.0; 4]);
    for sim_values in [[1.0, 2.0, 3.0, 4.0], [5.0; 4], [0.0; 4]] {
        let sim = series("sim", &[0, 1, 2, 3], &sim_values);
        let scores = calculate(&sim, &obs, &[Metric::Nse]).unwrap();
        assert_eq!(scores.get(Metric::Nse), Some(f64::NEG_INFINITY));
    }
}

#[test]
fn inexact_constant_observations_give_neg_infinity_nse() {
    let sim = series("sim", &[0, 1, 2], &[1.0, 2.0, 3.0]);
    for level in [0.1, 0.3, 1.1, 2.7, 12.34] {
        let obs = series("obs", &[0, 1, 2], &[level; 3]);
        let scores = calculate_all(&sim, &obs).unwrap();
        assert_eq!(scores.get(Metric::Nse), Some(f64::NEG_INFINITY), "obs = {level}");
    }
}

#[test]
fn calculate_only_requested_metrics() {
    let sim = series("sim", &[0, 1, 2], &[1.0, 2.0, 3.0]);
    let obs = series("obs", &[0, 1, 2], &[1.0, 2.5, 2.5]);

    let scores = calculate(&sim, &obs, &[Metric::Rmse]).unwrap();
    assert_eq!(scores.len(), 1);
    assert!(scores.get(Metric::Nse).is_none());
}

#[test]
fn unsorted_inputs_align_by_timestamp() {
    let sim = series("sim", &[2, 0, 1], &[3.0, 1.0, 2.0]);
    let obs = series("obs", &[1, 2, 0], &[2.0, 3.0, 1.0]);

    let scores = calculate_all(&sim, &obs).unwrap();
    assert_relative_eq!(scores.get(Metric::Rmse).unwrap(), 0.0, epsilon = 1e-12);
}
