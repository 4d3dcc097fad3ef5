//! Reporting utilities: CI strings and the terminal run summary.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized
//!
//! Formatting is strictly a presentation step: it runs after all numeric
//! results are finalized and nothing downstream parses these strings back.

use crate::domain::{BucketRow, BucketSummary, RunSummaryFile};

/// Suffix marking a bucket that lies entirely past the observed age range.
pub const EXTRAPOLATION_MARKER: &str = "*";

/// Render a 95% interval as `"estimate (lower to upper)"`, with the
/// extrapolation marker appended when requested.
pub fn format_ci(estimate: f64, lower: f64, upper: f64, extrapolated: bool) -> String {
    let marker = if extrapolated { EXTRAPOLATION_MARKER } else { "" };
    format!("{estimate:.2} ({lower:.2} to {upper:.2}){marker}")
}

/// Turn one numeric bucket summary into its export row.
pub fn bucket_row(condition: &str, df_used: usize, bucket: &BucketSummary) -> BucketRow {
    BucketRow {
        condition: condition.to_string(),
        df_used,
        age_group: format!("{}-{}", bucket.lower_edge, bucket.upper_edge),
        midpoint: bucket.midpoint,
        median_age: bucket.representative_age,
        ci: format_ci(bucket.estimate, bucket.lower, bucket.upper, bucket.extrapolated),
    }
}

/// Format the full run summary (ingest stats + per-tuple diagnostics).
pub fn format_run_summary(summary: &RunSummaryFile) -> String {
    let mut out = String::new();

    out.push_str("=== mrc - age-trend meta-regression ===\n");
    out.push_str(&format!("Input: {}\n", summary.input));
    out.push_str(&format!(
        "Rows: read={} used={} errors={}\n",
        summary.rows_read, summary.rows_used, summary.row_errors
    ));

    for sweep in &summary.sweeps {
        out.push_str(&format!(
            "\n[{} | k={}] groups={} fitted={} curve_rows={} bucket_rows={}\n",
            sweep.condition,
            sweep.df_used,
            sweep.groups_total,
            sweep.groups_fitted,
            sweep.curve_rows,
            sweep.bucket_rows
        ));
        for skip in &sweep.skipped {
            out.push_str(&format!("  (skipped {}) {}\n", skip.group, skip.reason));
        }
    }

    out
}
