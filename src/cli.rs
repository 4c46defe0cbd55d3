use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stclock")]
#[command(about = "Imports legacy Big5-encoded time-clock (.st) files into a local attendance database")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import the configured date range, then clean up invalid records
    Run {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Import the configured date range only
    Import {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Remove records whose timestamp is the unset/invalid sentinel
    Cleanup {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
}

/// Flags shared by every subcommand; each one overrides the config file
/// or environment value of the same name.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Path to a JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SQLite database file path
    #[arg(short, long)]
    pub database: Option<String>,

    /// Destination table for attendance records
    #[arg(long)]
    pub collection: Option<String>,

    /// Root folder containing <YYYYMM>/<YYYYMMDD>.st files
    #[arg(short, long)]
    pub folder: Option<PathBuf>,

    /// First day to import (YYYYMMDD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day to import, inclusive (YYYYMMDD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Trailing digits of the employee-ID field to keep
    #[arg(long)]
    pub employee_id_digits: Option<usize>,

    /// Ingestion worker count (defaults to available CPU parallelism)
    #[arg(short, long)]
    pub workers: Option<usize>,
}
