//! CLI argument definitions using clap
//!
//! Commands:
//! - aeroscan scan --table <path> --plan <path> [--params <json>] [--config <path>]
//! - aeroscan validate --table <path> --plan <path> [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aeroscan - suspendable index scans over an in-memory table
#[derive(Parser, Debug)]
#[command(name = "aeroscan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a scan plan to completion, one JSON line per invocation
    Scan {
        /// Table file: columns, rows and indexes
        #[arg(long)]
        table: PathBuf,

        /// Index scan plan file
        #[arg(long)]
        plan: PathBuf,

        /// Statement parameters as a JSON array
        #[arg(long, default_value = "[]")]
        params: String,

        /// Scan configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a plan against a table without scanning
    Validate {
        /// Table file: columns, rows and indexes
        #[arg(long)]
        table: PathBuf,

        /// Index scan plan file
        #[arg(long)]
        plan: PathBuf,

        /// Scan configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
