//! Inverse-variance regression weights.
//!
//! Reported standard errors are untrustworthy at the extremes: a missing one
//! means the source gave no uncertainty at all, and a reported zero would
//! produce an infinite weight. The rules, in order:
//!
//! 1. a missing (or unusable) standard error resolves to `MIN_STANDARD_ERROR`
//! 2. the group's floor is the 5th percentile of the resolved errors,
//!    never below `MIN_STANDARD_ERROR`
//! 3. every error is clipped to the floor; weight = `1 / se^2`
//!
//! Guarantee: every weight is strictly positive and finite, and no single
//! observation can dominate arbitrarily off a reported-zero error.

use crate::domain::Observation;
use crate::math::stats::quantile;

/// Stand-in standard error for observations that report none.
///
/// Near-zero error, i.e. maximal trust, before the group floor applies.
pub const MIN_STANDARD_ERROR: f64 = 1e-6;

/// Quantile of the group's standard errors used as the clipping floor.
pub const SE_FLOOR_QUANTILE: f64 = 0.05;

/// Resolve one reported standard error to a usable value.
///
/// Missing, non-finite, and negative entries all resolve to
/// [`MIN_STANDARD_ERROR`]; a reported zero is kept (the group floor clips it).
pub fn resolve_standard_error(std_err: Option<f64>) -> f64 {
    match std_err {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => MIN_STANDARD_ERROR,
    }
}

/// Inverse-variance weights for one group, aligned with `observations`.
pub fn regression_weights(observations: &[Observation]) -> Vec<f64> {
    let resolved: Vec<f64> = observations
        .iter()
        .map(|o| resolve_standard_error(o.std_err))
        .collect();

    let floor = quantile(&resolved, SE_FLOOR_QUANTILE)
        .unwrap_or(MIN_STANDARD_ERROR)
        .max(MIN_STANDARD_ERROR);

    resolved
        .iter()
        .map(|&se| {
            let clipped = se.max(floor);
            1.0 / (clipped * clipped)
        })
        .collect()
}
