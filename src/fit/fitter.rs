//! Low-level fitting for a single (group, complexity) pair.
//!
//! Given:
//! - ages `a_i`
//! - effects `y_i` (transformed per the group's scale)
//! - weights `w_i`
//! - a smoothing-complexity integer bounding the basis dimension
//!
//! we build a spline design matrix and solve one weighted least-squares
//! problem. The result is a [`FittedCurve`]: an immutable smooth function of
//! age that yields point + standard-error predictions at arbitrary query
//! ages, including beyond the training range.
//!
//! Any failure here (non-finite inputs, an unloggable ratio effect, an
//! ill-conditioned design) is an error for this group and this complexity
//! only; the orchestrator records it and moves on.

use nalgebra::{DMatrix, DVector};

use crate::domain::{EffectScale, Observation};
use crate::error::AppError;
use crate::math::basis::SplineBasis;
use crate::math::wls::{WlsFit, solve_weighted_least_squares};

/// A fitted age-trend curve for one condition group.
///
/// Immutable after creation: queried for predictions, never refit.
#[derive(Debug, Clone)]
pub struct FittedCurve {
    basis: SplineBasis,
    wls: WlsFit,
    /// Response scale the group was fit on.
    pub scale: EffectScale,
    /// Minimum observed age in the group.
    pub age_min: f64,
    /// Maximum observed age; queries past it are extrapolation.
    pub age_max: f64,
    /// The supplied smoothing-complexity value (export label).
    pub df_used: usize,
}

impl FittedCurve {
    /// Point estimate and standard error at `age`, on the fitting scale.
    pub fn predict_at(&self, age: f64) -> (f64, f64) {
        let row = self.basis.row(age);
        self.wls.predict(&row)
    }
}

/// Fit one weighted spline curve.
///
/// `complexity` bounds the number of basis columns; the effective dimension
/// is additionally capped so the curve never has more parameters than the
/// data supports (distinct ages, and at least one residual degree of
/// freedom).
pub fn fit_group_curve(
    observations: &[Observation],
    weights: &[f64],
    scale: EffectScale,
    complexity: usize,
) -> Result<FittedCurve, AppError> {
    if observations.is_empty() {
        return Err(AppError::new(4, "No observations to fit."));
    }
    if weights.len() != observations.len() {
        return Err(AppError::new(4, "Weight vector length mismatch."));
    }

    let ages: Vec<f64> = observations.iter().map(|o| o.age).collect();
    if ages.iter().any(|a| !a.is_finite()) {
        return Err(AppError::new(4, "Non-finite age in group."));
    }

    if scale == EffectScale::Ratio {
        if let Some(bad) = observations.iter().find(|o| !(o.effect > 0.0)) {
            return Err(AppError::new(
                4,
                format!(
                    "Ratio effect {} at age {} is not positive; cannot log-transform group.",
                    bad.effect, bad.age
                ),
            ));
        }
    }

    let y: Vec<f64> = observations
        .iter()
        .map(|o| scale.to_fitting_scale(o.effect))
        .collect();
    if y.iter().any(|v| !v.is_finite()) {
        return Err(AppError::new(4, "Non-finite response after transform."));
    }

    let n = ages.len();
    let mut distinct = ages.clone();
    distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    distinct.dedup();

    // Keep at least one residual degree of freedom for the variance estimate.
    let max_dim = complexity.min(distinct.len()).min(n.saturating_sub(1));
    if max_dim < 2 {
        return Err(AppError::new(
            4,
            format!("Too little data for complexity {complexity} (n={n})."),
        ));
    }

    let basis = SplineBasis::from_ages(&ages, max_dim)
        .ok_or_else(|| AppError::new(4, "Could not build a spline basis for group."))?;

    let p = basis.dim();
    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for (i, &age) in ages.iter().enumerate() {
        basis.fill_row(age, &mut row);
        for j in 0..p {
            x[(i, j)] = row[j];
        }
    }
    let y = DVector::from_vec(y);

    let wls = solve_weighted_least_squares(&x, &y, weights).ok_or_else(|| {
        AppError::new(
            4,
            format!("Ill-conditioned design for complexity {complexity}; fit abandoned."),
        )
    })?;

    let age_min = distinct[0];
    let age_max = distinct[distinct.len() - 1];
    Ok(FittedCurve {
        basis,
        wls,
        scale,
        age_min,
        age_max,
        df_used: complexity,
    })
}
