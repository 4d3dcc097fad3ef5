//! Export the two result tables and the run-summary JSON.
//!
//! The CSV exports are meant to be easy to consume in spreadsheets or
//! downstream scripts; the JSON carries the diagnostics (skipped groups and
//! reasons) that the tables deliberately omit.

use std::fs::File;
use std::path::Path;

use crate::domain::{BucketRow, CurveRow, RunSummaryFile};
use crate::error::AppError;

/// Write the dense-grid curve table.
pub fn write_curve_csv(path: &Path, rows: &[CurveRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(4, format!("Failed to create '{}': {e}", path.display()))
    })?;

    writer
        .write_record(["merge.figure", "type", "Age", "fit", "se.fit", "label", "df_used"])
        .map_err(|e| AppError::new(4, format!("Failed to write curve header: {e}")))?;

    for row in rows {
        writer
            .write_record([
                row.merge_figure.as_str(),
                row.effect_type.as_str(),
                &format!("{:.4}", row.age),
                &format!("{:.6}", row.fit),
                &format!("{:.6}", row.se_fit),
                row.label.as_str(),
                &row.df_used.to_string(),
            ])
            .map_err(|e| AppError::new(4, format!("Failed to write curve row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush '{}': {e}", path.display())))
}

/// Write the bucket summary table.
pub fn write_bucket_csv(path: &Path, rows: &[BucketRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(4, format!("Failed to create '{}': {e}", path.display()))
    })?;

    writer
        .write_record([
            "Condition",
            "df_used",
            "AgeGroup",
            "Midpoint",
            "Median_age",
            "95% CI (median)",
        ])
        .map_err(|e| AppError::new(4, format!("Failed to write bucket header: {e}")))?;

    for row in rows {
        writer
            .write_record([
                row.condition.as_str(),
                &row.df_used.to_string(),
                row.age_group.as_str(),
                &row.midpoint.to_string(),
                &row.median_age.to_string(),
                row.ci.as_str(),
            ])
            .map_err(|e| AppError::new(4, format!("Failed to write bucket row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush '{}': {e}", path.display())))
}

/// Write the run-summary JSON.
pub fn write_run_summary_json(path: &Path, summary: &RunSummaryFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(4, format!("Failed to create '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::new(4, format!("Failed to write run summary: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_csv_round_trips_through_a_reader() {
        let dir = std::env::temp_dir().join("mr-curves-export-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("curve.csv");

        let rows = vec![CurveRow {
            merge_figure: "f1".to_string(),
            effect_type: "ratio".to_string(),
            age: 12.25,
            fit: 1.5,
            se_fit: 0.125,
            label: "male".to_string(),
            df_used: 4,
        }];
        write_curve_csv(&path, &rows).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            rdr.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["merge.figure", "type", "Age", "fit", "se.fit", "label", "df_used"]
        );
        let record = rdr.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "f1");
        assert_eq!(&record[2], "12.2500");
        assert_eq!(&record[6], "4");
    }
}
