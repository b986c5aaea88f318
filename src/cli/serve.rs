//! Serve command implementation.
//!
//! Prepares the preview scratch tree, then runs the preview server until
//! interrupted.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::error::{ArbiterError, Result};
use crate::output::{display_path, plural, Printer};
use crate::project::Project;
use crate::server::{self, AppState};
use crate::view::ViewExporter;

/// Prepare the preview and serve it locally
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Project root (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Port to listen on (overrides arbiter.yaml)
    #[arg(long)]
    pub port: Option<u16>,

    /// Game-state JSON to preview
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Public base URL for assets; enables content hashing
    #[arg(long)]
    pub assets_base_url: Option<String>,
}

pub fn run(args: ServeArgs, printer: &Printer) -> Result<()> {
    let mut project = Project::open(&args.path)?;
    if let Some(port) = args.port {
        project.settings.port = port;
    }
    if let Some(url) = args.assets_base_url {
        project.settings.assets_base_url = Some(url);
    }

    let game_state = args
        .replay
        .as_ref()
        .map(|path| {
            fs::read_to_string(path).map_err(|e| ArbiterError::io(path, "Failed to read replay", e))
        })
        .transpose()?;

    let exporter = ViewExporter::for_project(&project);
    printer.status("Preparing", &display_path(exporter.scratch_dir()));
    let roots = exporter.prepare(
        game_state.as_deref(),
        project.settings.assets_base_url.as_deref(),
    )?;
    printer.info("Serving", &plural(roots.len(), "root", "roots"));

    let port = project.settings.port;
    printer.success(
        "Listening",
        &printer.cyan(&format!("http://127.0.0.1:{}/", port)),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ArbiterError::IoError)?;
    runtime.block_on(server::serve(AppState::new(project, roots, exporter), port))
}
