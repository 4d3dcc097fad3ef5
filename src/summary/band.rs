//! Confidence band construction and transform post-processing.
//!
//! Steps, in order, for every query age:
//!
//! 1. `lower = fit - 1.96 se`, `upper = fit + 1.96 se` on the fitting scale
//! 2. ceiling clamp of fit, lower, upper (policy per scale)
//! 3. back-transform all three (exponentiation for ratio groups)
//! 4. flag the point as extrapolated when the age exceeds the observed max
//!
//! Bound ordering survives because the clamp and the back-transform are both
//! monotone and applied identically to all three series.

use crate::domain::{CeilingPolicy, PredictionPoint};
use crate::fit::fitter::FittedCurve;

/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.96;

/// Evaluate the curve at one query age, through clamp and back-transform.
pub fn point_at(curve: &FittedCurve, policy: &CeilingPolicy, age: f64) -> PredictionPoint {
    let (fit, se) = curve.predict_at(age);
    let ceiling = curve.scale.ceiling(policy);

    let lower = (fit - Z_95 * se).min(ceiling);
    let upper = (fit + Z_95 * se).min(ceiling);
    let fit = fit.min(ceiling);

    PredictionPoint {
        age,
        fit: curve.scale.from_fitting_scale(fit),
        lower: curve.scale.from_fitting_scale(lower),
        upper: curve.scale.from_fitting_scale(upper),
        extrapolated: age > curve.age_max,
    }
}

/// Dense prediction grid over `[age_min, min(age_max + extend_years, age_cap)]`.
pub fn prediction_band(
    curve: &FittedCurve,
    policy: &CeilingPolicy,
    extend_years: f64,
    age_cap: f64,
    points: usize,
) -> Vec<PredictionPoint> {
    let start = curve.age_min;
    let end = (curve.age_max + extend_years).min(age_cap).max(start);
    let n = points.max(2);

    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            point_at(curve, policy, start + u * (end - start))
        })
        .collect()
}
