//! Command-line parsing for the meta-regression curve fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "mrc", version, about = "Weighted age-trend meta-regression curves")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit age-trend curves per condition group and export tables/charts.
    Fit(FitArgs),
    /// Print the detected CSV header and which required columns are present.
    Schema(SchemaArgs),
}

/// Options for a fit run.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Input CSV of effect-size observations.
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Output directory for tables, charts, and the run summary.
    #[arg(short = 'o', long, default_value = "out")]
    pub out_dir: PathBuf,

    /// Condition column to group by (repeat for several columns).
    #[arg(short = 'c', long = "condition", required = true)]
    pub conditions: Vec<String>,

    /// Smoothing complexity values to sweep (basis dimension bound, >= 2).
    #[arg(long = "df", default_values_t = [3usize, 4, 5])]
    pub complexities: Vec<usize>,

    /// Pre-exponentiation ceiling for ratio-group predictions.
    #[arg(long, default_value_t = 3.0)]
    pub ratio_ceiling: f64,

    /// Prediction ceiling for absolute/difference groups.
    #[arg(long, default_value_t = 5.0)]
    pub absolute_ceiling: f64,

    /// Years of deliberate extrapolation past the observed maximum age.
    #[arg(long, default_value_t = 10.0)]
    pub extend_years: f64,

    /// Hard upper age for any query grid.
    #[arg(long, default_value_t = 80.0)]
    pub age_cap: f64,

    /// Number of evenly spaced ages in the dense query grid.
    #[arg(long, default_value_t = 400)]
    pub grid_points: usize,

    /// Skip chart rendering.
    #[arg(long)]
    pub no_plots: bool,
}

/// Options for schema inspection.
#[derive(Debug, Parser)]
pub struct SchemaArgs {
    /// Input CSV to inspect.
    #[arg(short = 'i', long)]
    pub input: PathBuf,
}
