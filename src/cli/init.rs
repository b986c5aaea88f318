//! Init command implementation.
//!
//! Creates `config/config.ini` if needed and merges `key=value` pairs into it.

use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::output::{display_path, plural, Printer};
use crate::project::Project;

/// Create or update config/config.ini from key=value pairs
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project root
    #[arg(long, short, default_value = ".")]
    pub path: PathBuf,

    /// Properties to set, e.g. `title=Duel min_players=2`
    #[arg(value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got `{}`", raw)),
    }
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let project = Project::open(&args.path)?;
    let count = args.params.len();
    let path = project.merge_config(args.params)?;

    printer.success(
        "Updated",
        &format!(
            "{} ({} set)",
            display_path(&path),
            plural(count, "property", "properties")
        ),
    );
    Ok(())
}
