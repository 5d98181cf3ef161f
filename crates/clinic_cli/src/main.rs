//! Registry command-line entry point.
//!
//! # Responsibility
//! - Provision the initial tenant on fresh deployments.
//! - Offer a quick CPF check for support staff.

use clap::Parser;
use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::Cli::parse().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
