pub mod init;
pub mod package;
pub mod serve;
pub mod validate;

use clap::{Parser, Subcommand};

/// arbiter - Authoring tool for game projects: validate, preview and export
#[derive(Parser, Debug)]
#[command(name = "arbiter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare the preview and serve it locally
    Serve(serve::ServeArgs),

    /// Validate the project configuration
    Validate(validate::ValidateArgs),

    /// Validate, then package the project sources into a zip archive
    Package(package::PackageArgs),

    /// Create or update config/config.ini from key=value pairs
    Init(init::InitArgs),
}
