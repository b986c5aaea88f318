//! Package command implementation.
//!
//! Validates the project, then writes the source archive to disk.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::error::{ArbiterError, Result};
use crate::output::{display_path, Printer};
use crate::package::export_project;
use crate::project::Project;
use crate::validation::print_report;

/// Validate, then package the project sources into a zip archive
#[derive(Args, Debug)]
pub struct PackageArgs {
    /// Project root (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Archive to write
    #[arg(long, short, default_value = "export.zip")]
    pub output: PathBuf,
}

pub fn run(args: PackageArgs, printer: &Printer) -> Result<()> {
    let project = Project::open(&args.path)?;

    printer.status("Validating", &display_path(&project.root));
    let report = export_project(&project)?;
    print_report(&report, printer);

    let Some(archive) = report.archive() else {
        return Err(ArbiterError::Export {
            message: "validation failed, nothing packaged".to_string(),
            help: Some("Run `arbiter validate` for details".to_string()),
        });
    };

    fs::write(&args.output, archive)
        .map_err(|e| ArbiterError::io(&args.output, "Failed to write archive", e))?;

    printer.success(
        "Packaged",
        &format!("{} ({} bytes)", display_path(&args.output), archive.len()),
    );
    Ok(())
}
