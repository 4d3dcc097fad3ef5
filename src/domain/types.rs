//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to CSV/JSON
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One effect-size observation belonging to a condition group.
///
/// `std_err`, `case_n` and `total_n` are optional because published effect
/// sizes frequently omit them; the Weight Calculator resolves a missing
/// standard error, and the sample counts are only used to size scatter marks.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Age assigned to the observation (years).
    pub age: f64,
    /// Reported effect size on its natural scale.
    pub effect: f64,
    /// Reported standard error of the effect, if any.
    pub std_err: Option<f64>,
    /// Case-group sample size (display sizing only).
    pub case_n: Option<f64>,
    /// Total sample size (display sizing only).
    pub total_n: Option<f64>,
    /// Raw effect-type label from the input (`"ratio"` or other).
    pub effect_label: String,
    /// Opaque figure-merge identifier copied through to the curve export.
    pub merge_figure: Option<String>,
}

/// Response scale of a condition group.
///
/// Ratio-type effects (relative risks and friends) are fit in log space and
/// exponentiated back for reporting; their no-effect value is 1.0. Absolute
/// and difference-type effects are fit as-is with a no-effect value of 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectScale {
    Ratio,
    Absolute,
}

impl EffectScale {
    /// Resolve the scale from the input's effect-type label (case-insensitive).
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("ratio") {
            EffectScale::Ratio
        } else {
            EffectScale::Absolute
        }
    }

    /// Map a reported effect onto the fitting scale.
    ///
    /// For ratio effects this is `ln`; the caller must reject non-positive
    /// values first (see the fitter), since `ln` is undefined there.
    pub fn to_fitting_scale(self, effect: f64) -> f64 {
        match self {
            EffectScale::Ratio => effect.ln(),
            EffectScale::Absolute => effect,
        }
    }

    /// Map a fitted value back onto the reporting scale.
    pub fn from_fitting_scale(self, value: f64) -> f64 {
        match self {
            EffectScale::Ratio => value.exp(),
            EffectScale::Absolute => value,
        }
    }

    /// Upper ceiling applied on the fitting scale before back-transform.
    pub fn ceiling(self, policy: &CeilingPolicy) -> f64 {
        match self {
            EffectScale::Ratio => policy.ratio,
            EffectScale::Absolute => policy.absolute,
        }
    }

    /// No-effect reference value on the reporting scale.
    pub fn null_value(self) -> f64 {
        match self {
            EffectScale::Ratio => 1.0,
            EffectScale::Absolute => 0.0,
        }
    }
}

/// Ceilings applied to predictions on the fitting scale.
///
/// These bound implausible extrapolated values before any exponentiation.
/// They are policy constants supplied by configuration, not derived from the
/// data.
#[derive(Debug, Clone, Copy)]
pub struct CeilingPolicy {
    /// Ceiling for log-scale predictions of ratio groups.
    pub ratio: f64,
    /// Ceiling for predictions of absolute/difference groups.
    pub absolute: f64,
}

impl Default for CeilingPolicy {
    fn default() -> Self {
        Self {
            ratio: 3.0,
            absolute: 5.0,
        }
    }
}

/// One evaluated query age, on the reporting scale.
#[derive(Debug, Clone, Copy)]
pub struct PredictionPoint {
    pub age: f64,
    pub fit: f64,
    pub lower: f64,
    pub upper: f64,
    /// True when the query age exceeds the group's maximum observed age.
    pub extrapolated: bool,
}

/// Numeric summary of one decade bucket, before any string formatting.
#[derive(Debug, Clone, Copy)]
pub struct BucketSummary {
    pub lower_edge: u32,
    pub upper_edge: u32,
    pub midpoint: u32,
    /// Integer age whose estimate sits closest to the bucket median.
    pub representative_age: u32,
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
    /// True when the whole bucket lies past the observed age range.
    pub extrapolated: bool,
}

/// One row of the dense-grid curve export table.
#[derive(Debug, Clone)]
pub struct CurveRow {
    pub merge_figure: String,
    pub effect_type: String,
    pub age: f64,
    pub fit: f64,
    pub se_fit: f64,
    pub label: String,
    pub df_used: usize,
}

/// One row of the bucket summary export table.
#[derive(Debug, Clone)]
pub struct BucketRow {
    pub condition: String,
    pub df_used: usize,
    pub age_group: String,
    pub midpoint: u32,
    pub median_age: u32,
    pub ci: String,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    /// Condition columns to group by, swept in order.
    pub conditions: Vec<String>,
    /// Smoothing-complexity values to sweep (basis dimension bound).
    pub complexities: Vec<usize>,
    pub ceilings: CeilingPolicy,
    /// Years of deliberate extrapolation past the observed maximum age.
    pub extend_years: f64,
    /// Hard upper age for any query grid.
    pub age_cap: f64,
    /// Number of evenly spaced ages in the dense query grid.
    pub grid_points: usize,
    pub plots: bool,
}

/// A run-summary file (JSON).
///
/// This is the diagnostic artifact that keeps skipped groups observable:
/// every group that contributed zero rows appears here with its reason.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummaryFile {
    pub tool: String,
    pub input: String,
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: usize,
    pub sweeps: Vec<SweepSummary>,
}

/// Diagnostics for one (condition column, complexity) tuple.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub condition: String,
    pub df_used: usize,
    pub groups_total: usize,
    pub groups_fitted: usize,
    pub skipped: Vec<SkippedGroup>,
    pub curve_rows: usize,
    pub bucket_rows: usize,
}

/// One skipped group and why it emitted no rows.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedGroup {
    pub group: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_resolution_is_case_insensitive() {
        assert_eq!(EffectScale::from_label("ratio"), EffectScale::Ratio);
        assert_eq!(EffectScale::from_label(" Ratio "), EffectScale::Ratio);
        assert_eq!(EffectScale::from_label("RATIO"), EffectScale::Ratio);
        assert_eq!(EffectScale::from_label("absolute"), EffectScale::Absolute);
        assert_eq!(EffectScale::from_label("difference"), EffectScale::Absolute);
        assert_eq!(EffectScale::from_label(""), EffectScale::Absolute);
    }

    #[test]
    fn ratio_round_trips_through_fitting_scale() {
        let scale = EffectScale::Ratio;
        let v = scale.to_fitting_scale(2.0);
        assert!((v - 2.0_f64.ln()).abs() < 1e-12);
        assert!((scale.from_fitting_scale(v) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn null_values_per_scale() {
        assert_eq!(EffectScale::Ratio.null_value(), 1.0);
        assert_eq!(EffectScale::Absolute.null_value(), 0.0);
    }

    #[test]
    fn default_ceilings() {
        let policy = CeilingPolicy::default();
        assert_eq!(EffectScale::Ratio.ceiling(&policy), 3.0);
        assert_eq!(EffectScale::Absolute.ceiling(&policy), 5.0);
    }
}
