use clap::Parser;
use miette::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use arbiter::cli::{Cli, Commands};
use arbiter::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let printer = Printer::new();
    match cli.command {
        Commands::Serve(args) => arbiter::cli::serve::run(args, &printer)?,
        Commands::Validate(args) => arbiter::cli::validate::run(args, &printer)?,
        Commands::Package(args) => arbiter::cli::package::run(args, &printer)?,
        Commands::Init(args) => arbiter::cli::init::run(args, &printer)?,
    }

    Ok(())
}
