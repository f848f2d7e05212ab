//! CLI module for aeroscan
//!
//! Provides command-line interface for:
//! - scan: Run an index scan plan over a table file
//! - validate: Initialize the executor for a plan without scanning

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    parse_params, run, run_command, scan, scan_invocations, validate, Catalog, IndexDef, TableFile,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_json_file, write_line, write_response};
