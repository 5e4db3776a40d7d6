use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "revcheck")]
#[command(about = "Review machine-revised conversation transcripts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// SQLite database holding the batch under review (overrides config).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import an Excel (.xlsx, .xls) or CSV sheet, replacing the current batch.
    Import { file: PathBuf },

    /// Print session counts per conversation type.
    Stats,

    /// Write the reviewed batch to a sheet.
    Export {
        /// Output directory (defaults to config `export_dir`).
        #[arg(long)]
        out: Option<PathBuf>,

        /// Sheet format (defaults to config `export_format`).
        #[arg(long, value_parser = ["xlsx", "csv"])]
        format: Option<String>,
    },

    /// Open the interactive review UI (default).
    Review,
}
