//! Cubic regression-spline basis in truncated-power form.
//!
//! For a basis dimension `p` the columns are:
//!
//! - `1, z, z^2, z^3` (cubic polynomial, truncated to `p` columns when `p < 4`)
//! - `(z - k_j)_+^3` for each interior knot `k_j` when `p > 4`
//!
//! where `z` is the age standardized onto `[0, 1]` over the observed span.
//!
//! Numerical notes:
//! - Standardizing before taking powers keeps the design well conditioned;
//!   raw ages up to 80 cubed would dwarf the intercept column.
//! - Interior knots sit at interpolated quantiles of the *distinct* observed
//!   ages, so repeated measurements at one age do not drag knots around.
//! - Every column is a polynomial piece, so the basis evaluates at any query
//!   age, including ages past the observed span. Extrapolated values grow
//!   cubically; bounding them is the caller's clamp policy, not the basis'.

use nalgebra::DVector;

use crate::math::stats::quantile;

/// A fixed spline basis over one group's observed ages.
///
/// Immutable after construction; the fitted curve owns one of these for the
/// lifetime of the group's processing.
#[derive(Debug, Clone)]
pub struct SplineBasis {
    /// Minimum observed age (standardization offset).
    offset: f64,
    /// Observed age span (standardization scale, strictly positive).
    scale: f64,
    /// Interior knots in standardized units, strictly increasing.
    knots: Vec<f64>,
    /// Total number of basis columns, including the intercept.
    dim: usize,
}

impl SplineBasis {
    /// Build a basis of at most `max_dim` columns over `ages`.
    ///
    /// The dimension is reduced when the distinct ages cannot support it
    /// (coincident quantile knots are deduplicated). Returns `None` when the
    /// ages span no range or fewer than 2 columns remain.
    pub fn from_ages(ages: &[f64], max_dim: usize) -> Option<Self> {
        let mut distinct: Vec<f64> = ages.iter().copied().filter(|a| a.is_finite()).collect();
        distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        distinct.dedup();
        if distinct.len() < 2 {
            return None;
        }

        let offset = distinct[0];
        let scale = distinct[distinct.len() - 1] - offset;
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }

        let dim = max_dim.min(distinct.len());
        if dim < 2 {
            return None;
        }

        let standardized: Vec<f64> = distinct.iter().map(|a| (a - offset) / scale).collect();

        let mut knots = Vec::new();
        if dim > 4 {
            let wanted = dim - 4;
            for j in 1..=wanted {
                let p = j as f64 / (wanted as f64 + 1.0);
                if let Some(k) = quantile(&standardized, p) {
                    knots.push(k);
                }
            }
            knots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            knots.dedup();
            // Knots at the boundary contribute a column collinear with the
            // cubic terms or identically zero on the data; drop them.
            knots.retain(|&k| k > 0.0 && k < 1.0);
        }

        let dim = dim.min(4 + knots.len());
        Some(Self {
            offset,
            scale,
            knots,
            dim,
        })
    }

    /// Number of basis columns.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Fill one design row for `age`.
    ///
    /// # Panics
    /// Panics if `out` does not have length `self.dim()`. Callers should size
    /// the row correctly.
    pub fn fill_row(&self, age: f64, out: &mut [f64]) {
        assert_eq!(out.len(), self.dim);
        let z = (age - self.offset) / self.scale;

        out[0] = 1.0;
        if self.dim > 1 {
            out[1] = z;
        }
        if self.dim > 2 {
            out[2] = z * z;
        }
        if self.dim > 3 {
            out[3] = z * z * z;
        }
        for (j, &k) in self.knots.iter().take(self.dim.saturating_sub(4)).enumerate() {
            let d = z - k;
            out[4 + j] = if d > 0.0 { d * d * d } else { 0.0 };
        }
    }

    /// Design row for `age` as a vector.
    pub fn row(&self, age: f64) -> DVector<f64> {
        let mut out = vec![0.0; self.dim];
        self.fill_row(age, &mut out);
        DVector::from_vec(out)
    }
}
