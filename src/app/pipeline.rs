//! Shared "sweep pipeline" logic.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> group -> fit/summarize per (condition, complexity) tuple ->
//! exports/charts. The CLI stays focused on argument handling.

use std::fs::create_dir_all;
use std::path::PathBuf;

use crate::domain::{
    BucketRow, CurveRow, RunConfig, RunSummaryFile, SkippedGroup, SweepSummary,
};
use crate::error::AppError;
use crate::fit::groups::{group_observations, run_groups, GroupFit};
use crate::io::export::{write_bucket_csv, write_curve_csv, write_run_summary_json};
use crate::io::ingest::load_observations;
use crate::summary::band::Z_95;

/// All computed outputs of a single `mrc fit` run.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub summary: RunSummaryFile,
    pub curve_rows: Vec<CurveRow>,
    pub bucket_rows: Vec<BucketRow>,
}

/// Execute the full sweep and write every artifact.
pub fn run_sweeps(config: &RunConfig) -> Result<SweepOutcome, AppError> {
    let ingest = load_observations(&config.input, &config.conditions)?;
    for err in &ingest.row_errors {
        log::debug!("row {}: {}", err.line, err.message);
    }
    if ingest.observations.is_empty() {
        return Err(AppError::new(
            3,
            format!("No usable rows in '{}'.", config.input.display()),
        ));
    }

    create_dir_all(&config.out_dir).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create '{}': {e}", config.out_dir.display()),
        )
    })?;
    let charts_dir = config.out_dir.join("charts");
    if config.plots {
        create_dir_all(&charts_dir).map_err(|e| {
            AppError::new(
                4,
                format!("Failed to create '{}': {e}", charts_dir.display()),
            )
        })?;
    }

    let mut curve_rows: Vec<CurveRow> = Vec::new();
    let mut bucket_rows: Vec<BucketRow> = Vec::new();
    let mut sweeps: Vec<SweepSummary> = Vec::new();

    for condition in &config.conditions {
        let labels = ingest
            .condition_values
            .get(condition)
            .ok_or_else(|| AppError::new(4, format!("Missing condition values for '{condition}'.")))?;
        let groups = group_observations(&ingest.observations, labels);

        for &complexity in &config.complexities {
            log::info!(
                "fitting {} group(s) of '{condition}' at k={complexity}",
                groups.len()
            );
            let run = run_groups(
                &groups,
                complexity,
                &config.ceilings,
                config.extend_years,
                config.age_cap,
                config.grid_points,
            );

            let mut sweep_curve_rows = 0usize;
            let mut sweep_bucket_rows = 0usize;
            for fit in &run.fits {
                sweep_curve_rows += fit.band.len();
                curve_rows.extend(fit.band.iter().map(|p| CurveRow {
                    merge_figure: fit.merge_figure.clone(),
                    effect_type: fit.effect_label.clone(),
                    age: p.age,
                    fit: p.fit,
                    se_fit: (p.upper - p.lower) / (2.0 * Z_95),
                    label: fit.label.clone(),
                    df_used: fit.df_used,
                }));

                sweep_bucket_rows += fit.buckets.len();
                bucket_rows.extend(
                    fit.buckets
                        .iter()
                        .map(|b| crate::report::bucket_row(&fit.label, fit.df_used, b)),
                );

                if config.plots {
                    let path = chart_path(&charts_dir, condition, fit);
                    crate::plot::render_group_chart(&path, fit)?;
                }
            }

            sweeps.push(SweepSummary {
                condition: condition.clone(),
                df_used: complexity,
                groups_total: run.groups_total,
                groups_fitted: run.fits.len(),
                skipped: run
                    .skipped
                    .iter()
                    .map(|(group, reason)| SkippedGroup {
                        group: group.clone(),
                        reason: reason.clone(),
                    })
                    .collect(),
                curve_rows: sweep_curve_rows,
                bucket_rows: sweep_bucket_rows,
            });
        }
    }

    let summary = RunSummaryFile {
        tool: "mrc".to_string(),
        input: config.input.display().to_string(),
        rows_read: ingest.rows_read,
        rows_used: ingest.observations.len(),
        row_errors: ingest.row_errors.len(),
        sweeps,
    };

    write_curve_csv(&config.out_dir.join("curve_table.csv"), &curve_rows)?;
    write_bucket_csv(&config.out_dir.join("bucket_table.csv"), &bucket_rows)?;
    write_run_summary_json(&config.out_dir.join("run_summary.json"), &summary)?;

    Ok(SweepOutcome {
        summary,
        curve_rows,
        bucket_rows,
    })
}

fn chart_path(charts_dir: &std::path::Path, condition: &str, fit: &GroupFit) -> PathBuf {
    charts_dir.join(format!(
        "{}_{}_k{}.svg",
        sanitize(condition),
        sanitize(&fit.label),
        fit.df_used
    ))
}

/// Make an arbitrary label safe as a file-name fragment.
fn sanitize(label: &str) -> String {
    let mut out: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.is_empty() {
        out.push('_');
    }
    out
}
