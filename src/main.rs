//! aeroscan CLI entry point
//!
//! Parses arguments, dispatches to the CLI commands and exits non-zero on
//! failure. All logic lives in the CLI module.

use aeroscan::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
