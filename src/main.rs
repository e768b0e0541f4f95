//! # Project Integrity Command-Line Entry Point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Install tracing subscriber
//!   └─> Execute command
//!         ├─> clean / success      -> exit 0
//!         ├─> differences found    -> exit 1
//!         └─> error                -> exit 2
//! ```
//!
//! Precondition failures (missing source file, missing snapshot, changed
//! content keys) are reported as setup problems; differences are a report to
//! review, not an error.

#![warn(clippy::all, rust_2018_idioms)]

mod cli;

use clap::Parser as _;
use project_integrity::error::IntegrityError;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    if let Err(e) = project_integrity::logging::init(cli.verbose, cli.log_file) {
        eprintln!("Warning: logging unavailable: {e:#}");
    }

    match cli::run_command(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            match e.downcast_ref::<IntegrityError>() {
                Some(err) if err.is_precondition() => eprintln!("Setup problem: {err}"),
                _ => eprintln!("Error: {e:#}"),
            }
            ExitCode::from(2)
        }
    }
}
