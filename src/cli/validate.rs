//! Validate command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::error::{ArbiterError, Result};
use crate::output::{display_path, Printer};
use crate::validation::{print_report, validate_project};

/// Validate the project configuration
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Project root (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub fn run(args: ValidateArgs, printer: &Printer) -> Result<()> {
    printer.status("Validating", &display_path(&args.path));
    let report = validate_project(&args.path);
    print_report(&report, printer);

    if report.is_success() {
        Ok(())
    } else {
        Err(ArbiterError::Config {
            message: "project configuration is invalid".to_string(),
            help: Some("Fix the errors above and run validate again".to_string()),
        })
    }
}
