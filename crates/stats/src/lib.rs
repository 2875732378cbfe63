//! Statistical helper functions shared by the teval ensemble and metric crates.
//!
//! Everything here operates on plain `&[f64]` slices. Callers decide how
//! missing values are handled; none of these functions filter NaN except
//! [`finite_sorted`] and [`pearson_correlation`].

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    match data.len() {
        0 => f64::NAN,
        n => data.iter().sum::<f64>() / n as f64,
    }
}

/// Population variance (divides by N, numpy's `ddof=0`). NaN for an empty
/// slice.
pub fn population_variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let m = mean(data);
    data.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}

/// Population standard deviation. NaN for an empty slice.
pub fn population_std(data: &[f64]) -> f64 {
    population_variance(data).sqrt()
}

/// Quantile `p` of ascending `sorted` by linear interpolation at rank
/// `p * (n - 1)` (numpy `linear`, R type 7).
///
/// # Panics
///
/// Panics if `sorted` is empty.
pub fn quantile_linear(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "quantile_linear: empty input");
    let last = sorted.len() - 1;
    let rank = p * last as f64;
    let below = (rank.floor() as usize).min(last);
    let above = (below + 1).min(last);
    let weight = rank - rank.floor();
    sorted[below] + weight * (sorted[above] - sorted[below])
}

/// Median of ascending `sorted`; the mean of the two middle values for an
/// even count.
///
/// # Panics
///
/// Panics if `sorted` is empty.
pub fn median(sorted: &[f64]) -> f64 {
    assert!(!sorted.is_empty(), "median: empty input");
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Copy the non-NaN values of `data` and sort them ascending.
pub fn finite_sorted<'a>(data: impl IntoIterator<Item = &'a f64>) -> Vec<f64> {
    let mut out: Vec<f64> = data.into_iter().copied().filter(|v| !v.is_nan()).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Pearson correlation over the positions where neither `x` nor `y` is NaN.
///
/// `None` when fewer than two such positions remain or either side is
/// constant there. Infinite values are kept and make the result NaN.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .unzip();
    if xs.len() < 2 {
        return None;
    }

    let (mx, my) = (mean(&xs), mean(&ys));
    let (cov, var_x, var_y) = xs.iter().zip(&ys).fold((0.0, 0.0, 0.0), |(c, vx, vy), (a, b)| {
        let (da, db) = (a - mx, b - my);
        (c + da * db, vx + da * da, vy + db * db)
    });

    let scale = (var_x * var_y).sqrt();
    (scale != 0.0).then(|| cov / scale)
}
