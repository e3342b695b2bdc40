//! Goodness-of-fit statistics for scoring predictions against observations.
//!
//! Pairs where either value is missing (non-finite) are skipped, so a model
//! that returns `NaN` for some cells is scored on the remaining ones.

/// Nash-Sutcliffe Efficiency. Range: (-inf, 1], 1 = perfect.
///
/// `NaN` when no pair is finite, `-inf` when the observations are constant.
pub fn nse(observed: &[f64], simulated: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = observed
        .iter()
        .zip(simulated)
        .filter(|(o, s)| o.is_finite() && s.is_finite())
        .map(|(&o, &s)| (o, s))
        .collect();
    if pairs.is_empty() {
        return f64::NAN;
    }
    let mean_obs = pairs.iter().map(|(o, _)| o).sum::<f64>() / pairs.len() as f64;
    let numerator: f64 = pairs.iter().map(|(o, s)| (o - s).powi(2)).sum();
    let denominator: f64 = pairs.iter().map(|(o, _)| (o - mean_obs).powi(2)).sum();
    if denominator == 0.0 {
        return f64::NEG_INFINITY;
    }
    1.0 - numerator / denominator
}

/// Normalized NSE, `1 / (2 - NSE)`. Range: [0, 1], 1 = perfect, 0.5 = mean.
pub fn normalized_nse(observed: &[f64], simulated: &[f64]) -> f64 {
    normalize_nse(nse(observed, simulated))
}

/// Map an efficiency in (-inf, 1] onto (0, 1]
pub fn normalize_nse(efficiency: f64) -> f64 {
    1.0 / (2.0 - efficiency)
}

/// Number of pairs that enter the statistics above
pub fn finite_pairs(observed: &[f64], simulated: &[f64]) -> usize {
    observed
        .iter()
        .zip(simulated)
        .filter(|(o, s)| o.is_finite() && s.is_finite())
        .count()
}
