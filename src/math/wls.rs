//! Weighted least squares with a coefficient covariance.
//!
//! We repeatedly solve small linear regression problems of the form:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - Rows are scaled by `sqrt(w_i)` and the problem is solved as ordinary
//!   least squares via SVD, which handles tall design matrices robustly.
//! - Predictions need standard errors, so alongside `β` we form the
//!   coefficient covariance `σ̂² (X_w^T X_w)^{-1} = σ̂² V Σ^{-2} V^T` from the
//!   same decomposition, with `σ̂²` the weighted residual mean square.
//! - A rank-deficient design (smallest singular value negligible against the
//!   largest) is reported as `None` rather than pseudo-inverted: a curve
//!   whose covariance blows up is a fit failure, not an answer.

use nalgebra::{DMatrix, DVector};

/// Relative singular-value cutoff below which the design counts as singular.
const RANK_TOL: f64 = 1e-10;

/// A solved weighted least-squares problem.
#[derive(Debug, Clone)]
pub struct WlsFit {
    pub beta: DVector<f64>,
    /// Coefficient covariance on the fitting scale.
    cov: DMatrix<f64>,
}

impl WlsFit {
    /// Point estimate and standard error for one design row.
    pub fn predict(&self, row: &DVector<f64>) -> (f64, f64) {
        let fit = self.beta.dot(row);
        let var = (&self.cov * row).dot(row);
        (fit, var.max(0.0).sqrt())
    }
}

/// Solve a weighted least-squares problem.
///
/// Requires `n > p` so the residual variance is identified. Returns `None`
/// when inputs are degenerate or the system is too ill-conditioned to solve
/// robustly.
pub fn solve_weighted_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    w: &[f64],
) -> Option<WlsFit> {
    let n = x.nrows();
    let p = x.ncols();
    if n <= p || p == 0 || y.len() != n || w.len() != n {
        return None;
    }
    if y.iter().any(|v| !v.is_finite()) {
        return None;
    }
    if w.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return None;
    }

    // Scale rows by sqrt(w) and solve the equivalent OLS problem.
    let mut xw = x.clone();
    let mut yw = y.clone();
    for i in 0..n {
        let sw = w[i].sqrt();
        for j in 0..p {
            xw[(i, j)] *= sw;
        }
        yw[i] *= sw;
    }

    let svd = xw.svd(true, true);
    let sv = &svd.singular_values;
    let max_sv = sv.iter().copied().fold(0.0_f64, f64::max);
    if !(max_sv.is_finite() && max_sv > 0.0) {
        return None;
    }
    let min_sv = sv.iter().copied().fold(f64::INFINITY, f64::min);
    if min_sv <= max_sv * RANK_TOL {
        return None;
    }

    let beta = svd.solve(&yw, max_sv * RANK_TOL).ok()?;
    if beta.iter().any(|v| !v.is_finite()) {
        return None;
    }

    // Weighted residual mean square on the original rows.
    let fitted = x * &beta;
    let mut sse = 0.0;
    for i in 0..n {
        let r = y[i] - fitted[i];
        sse += w[i] * r * r;
    }
    if !sse.is_finite() {
        return None;
    }
    let sigma2 = sse / (n - p) as f64;

    // Covariance: σ̂² V Σ^{-2} V^T.
    let v_t = svd.v_t.as_ref()?;
    let mut cov = DMatrix::<f64>::zeros(p, p);
    for k in 0..p {
        let inv_s2 = 1.0 / (sv[k] * sv[k]);
        for i in 0..p {
            let vki = v_t[(k, i)];
            for j in 0..p {
                cov[(i, j)] += inv_s2 * vki * v_t[(k, j)];
            }
        }
    }
    cov *= sigma2;

    Some(WlsFit { beta, cov })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_exact_line_with_zero_standard_error() {
        // Fit y = 2 + 3x on x = [0, 1, 2] with uniform weights.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
        let w = [1.0, 1.0, 1.0];

        let fit = solve_weighted_least_squares(&x, &y, &w).unwrap();
        assert!((fit.beta[0] - 2.0).abs() < 1e-10);
        assert!((fit.beta[1] - 3.0).abs() < 1e-10);

        let (pred, se) = fit.predict(&DVector::from_row_slice(&[1.0, 5.0]));
        assert!((pred - 17.0).abs() < 1e-9);
        assert!(se.abs() < 1e-9, "exact fit should have ~zero se, got {se}");
    }

    #[test]
    fn noisy_fit_reports_positive_standard_error() {
        let x = DMatrix::from_row_slice(
            5,
            2,
            &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0],
        );
        let y = DVector::from_row_slice(&[0.1, 0.9, 2.2, 2.8, 4.1]);
        let w = [1.0; 5];

        let fit = solve_weighted_least_squares(&x, &y, &w).unwrap();
        let (_, se) = fit.predict(&DVector::from_row_slice(&[1.0, 2.0]));
        assert!(se > 0.0 && se.is_finite());

        // Standard errors grow away from the data's center.
        let (_, se_far) = fit.predict(&DVector::from_row_slice(&[1.0, 10.0]));
        assert!(se_far > se);
    }

    #[test]
    fn higher_weight_pulls_the_fit() {
        // Two observations at x=1 disagree; the heavier one wins.
        let x = DMatrix::from_row_slice(3, 1, &[1.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[0.0, 10.0, 0.0]);

        let balanced = solve_weighted_least_squares(&x, &y, &[1.0, 1.0, 1.0]).unwrap();
        let skewed = solve_weighted_least_squares(&x, &y, &[1.0, 100.0, 1.0]).unwrap();
        assert!(skewed.beta[0] > balanced.beta[0]);
    }

    #[test]
    fn rank_deficient_design_is_rejected() {
        // Second column duplicates the first.
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert!(solve_weighted_least_squares(&x, &y, &[1.0; 4]).is_none());
    }

    #[test]
    fn underdetermined_and_invalid_inputs_are_rejected() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0]);
        assert!(solve_weighted_least_squares(&x, &y, &[1.0, 1.0]).is_none());

        let x = DMatrix::from_row_slice(3, 1, &[1.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_weighted_least_squares(&x, &y, &[1.0, 0.0, 1.0]).is_none());
        assert!(solve_weighted_least_squares(&x, &y, &[1.0, f64::NAN, 1.0]).is_none());
    }
}
