//! Deterministic goodness-of-fit scores over an aligned pair.
//!
//! Every function assumes `sim` and `obs` are already in the same physical
//! units and on the same time base. Non-empty input is guaranteed by
//! [`AlignedPair`].

use crate::series::AlignedPair;

/// Nash-Sutcliffe Efficiency: `1 - Σ(sim - obs)² / Σ(obs - mean(obs))²`.
///
/// A constant observed series scores `-inf`; constancy is checked on the
/// values rather than on the rounded denominator.
pub fn nse<K>(pair: &AlignedPair<K>) -> f64 {
    let (sim, obs) = (pair.sim(), pair.obs());
    if obs.iter().all(|o| *o == obs[0]) {
        return f64::NEG_INFINITY;
    }
    let obs_mean = teval_stats::mean(obs);

    let numerator: f64 = sim.iter().zip(obs).map(|(s, o)| (s - o).powi(2)).sum();
    let denominator: f64 = obs.iter().map(|o| (o - obs_mean).powi(2)).sum();
    1.0 - numerator / denominator
}

/// Kling-Gupta Efficiency: `1 - sqrt((r - 1)² + (α - 1)² + (β - 1)²)`.
///
/// `r` is the Pearson correlation, `α = std(sim) / std(obs)` (population)
/// and `β = mean(sim) / mean(obs)`. An undefined correlation (fewer than two
/// points, or a constant series) makes the score NaN. A zero observed mean
/// or std is not guarded and yields a non-finite score.
pub fn kge<K>(pair: &AlignedPair<K>) -> f64 {
    let (sim, obs) = (pair.sim(), pair.obs());

    let r = teval_stats::pearson_correlation(sim, obs).unwrap_or(f64::NAN);
    let alpha = teval_stats::population_std(sim) / teval_stats::population_std(obs);
    let beta = teval_stats::mean(sim) / teval_stats::mean(obs);

    1.0 - ((r - 1.0).powi(2) + (alpha - 1.0).powi(2) + (beta - 1.0).powi(2)).sqrt()
}

/// Root mean squared error: `sqrt(mean((sim - obs)²))`.
pub fn rmse<K>(pair: &AlignedPair<K>) -> f64 {
    let squared: Vec<f64> = pair
        .sim()
        .iter()
        .zip(pair.obs())
        .map(|(s, o)| (s - o).powi(2))
        .collect();
    teval_stats::mean(&squared).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{TimeSeries, align};
    use approx::assert_relative_eq;

    fn pair(sim: Vec<f64>, obs: Vec<f64>) -> AlignedPair<usize> {
        let index: Vec<usize> = (0..sim.len()).collect();
        let sim = TimeSeries::new("sim", index.clone(), sim).unwrap();
        let obs = TimeSeries::new("obs", index, obs).unwrap();
        align(&sim, &obs).unwrap()
    }

    #[test]
    fn nse_known_value() {
        // obs mean 2, Σ(obs - mean)² = 2, Σ(sim - obs)² = 0.5
        let p = pair(vec![1.5, 2.0, 3.5], vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(nse(&p), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn nse_constant_obs_is_neg_infinity() {
        let p = pair(vec![1.0, 5.0, 9.0], vec![4.0, 4.0, 4.0]);
        assert_eq!(nse(&p), f64::NEG_INFINITY);
        let p = pair(vec![4.0, 4.0, 4.0], vec![4.0, 4.0, 4.0]);
        assert_eq!(nse(&p), f64::NEG_INFINITY);
    }

    #[test]
    fn nse_inexact_constant_obs_is_neg_infinity() {
        // mean(0.1, 0.1, 0.1) rounds to 0.10000000000000002
        let p = pair(vec![1.0, 2.0, 3.0], vec![0.1, 0.1, 0.1]);
        assert_eq!(nse(&p), f64::NEG_INFINITY);
        let p = pair(vec![0.5; 7], vec![0.7; 7]);
        assert_eq!(nse(&p), f64::NEG_INFINITY);
    }

    #[test]
    fn nse_of_mean_prediction_is_zero() {
        let p = pair(vec![2.0, 2.0, 2.0], vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(nse(&p), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn kge_scaled_simulation() {
        // sim = 2 * obs: r = 1, α = 2, β = 2, KGE = 1 - sqrt(2)
        let p = pair(vec![2.0, 4.0, 6.0], vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(kge(&p), 1.0 - 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn kge_single_point_is_nan() {
        let p = pair(vec![2.0], vec![1.0]);
        assert!(kge(&p).is_nan());
    }

    #[test]
    fn kge_zero_obs_mean_is_non_finite() {
        let p = pair(vec![1.0, 2.0, 4.0], vec![-1.0, 0.0, 1.0]);
        assert!(!kge(&p).is_finite());
    }

    #[test]
    fn rmse_known_value() {
        let p = pair(vec![1.0, 2.0, 3.0, 4.0], vec![2.0, 2.0, 1.0, 4.0]);
        // squared errors 1, 0, 4, 0
        assert_relative_eq!(rmse(&p), (5.0_f64 / 4.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn rmse_is_non_negative() {
        let p = pair(vec![-3.0, 7.0], vec![3.0, -7.0]);
        assert!(rmse(&p) >= 0.0);
    }
}
