//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - validates them into a `RunConfig`
//! - runs the sweep pipeline
//! - prints the run summary

use clap::Parser;

use crate::cli::{Cli, Command, FitArgs, SchemaArgs};
use crate::domain::{CeilingPolicy, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `mrc` binary.
pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .ok();

    let cli = Cli::parse();
    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Schema(args) => handle_schema(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let outcome = pipeline::run_sweeps(&config)?;
    println!("{}", crate::report::format_run_summary(&outcome.summary));
    Ok(())
}

fn handle_schema(args: SchemaArgs) -> Result<(), AppError> {
    let header = crate::io::ingest::read_header(&args.input)?;
    println!("Columns in '{}':", args.input.display());
    for name in &header {
        println!("  {name}");
    }

    println!("\nRequired columns:");
    for name in crate::io::ingest::REQUIRED_COLUMNS {
        let mark = if header.iter().any(|h| h == name) { "ok" } else { "MISSING" };
        println!("  {name:<14} {mark}");
    }
    Ok(())
}

/// Validate CLI flags into a `RunConfig`.
pub fn run_config_from_args(args: &FitArgs) -> Result<RunConfig, AppError> {
    if args.conditions.is_empty() {
        return Err(AppError::new(2, "At least one --condition column is required."));
    }
    let mut conditions: Vec<String> = Vec::new();
    for name in &args.conditions {
        if !conditions.contains(name) {
            conditions.push(name.clone());
        }
    }
    if args.complexities.is_empty() {
        return Err(AppError::new(2, "At least one --df value is required."));
    }
    if let Some(&bad) = args.complexities.iter().find(|&&k| k < 2) {
        return Err(AppError::new(
            2,
            format!("Smoothing complexity must be >= 2 (got {bad})."),
        ));
    }
    if !(args.ratio_ceiling.is_finite() && args.absolute_ceiling.is_finite()) {
        return Err(AppError::new(2, "Prediction ceilings must be finite."));
    }
    if !(args.extend_years.is_finite() && args.extend_years >= 0.0) {
        return Err(AppError::new(2, "Extrapolation years must be finite and >= 0."));
    }
    if !(args.age_cap.is_finite() && args.age_cap > 0.0) {
        return Err(AppError::new(2, "Age cap must be finite and positive."));
    }
    if args.grid_points < 2 {
        return Err(AppError::new(2, "Grid must have at least 2 points."));
    }

    Ok(RunConfig {
        input: args.input.clone(),
        out_dir: args.out_dir.clone(),
        conditions,
        complexities: args.complexities.clone(),
        ceilings: CeilingPolicy {
            ratio: args.ratio_ceiling,
            absolute: args.absolute_ceiling,
        },
        extend_years: args.extend_years,
        age_cap: args.age_cap,
        grid_points: args.grid_points,
        plots: !args.no_plots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn base_args() -> FitArgs {
        FitArgs {
            input: PathBuf::from("data.csv"),
            out_dir: PathBuf::from("out"),
            conditions: vec!["Sex".to_string()],
            complexities: vec![3, 4, 5],
            ratio_ceiling: 3.0,
            absolute_ceiling: 5.0,
            extend_years: 10.0,
            age_cap: 80.0,
            grid_points: 400,
            no_plots: false,
        }
    }

    #[test]
    fn valid_args_build_a_config() {
        let config = run_config_from_args(&base_args()).unwrap();
        assert_eq!(config.complexities, vec![3, 4, 5]);
        assert_eq!(config.ceilings.ratio, 3.0);
        assert!(config.plots);
    }

    #[test]
    fn degenerate_complexity_is_rejected() {
        let mut args = base_args();
        args.complexities = vec![3, 1];
        let err = run_config_from_args(&args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn negative_extension_is_rejected() {
        let mut args = base_args();
        args.extend_years = -1.0;
        assert_eq!(run_config_from_args(&args).unwrap_err().exit_code(), 2);
    }
}
