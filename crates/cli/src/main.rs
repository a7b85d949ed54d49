//! `relmodel` - normalize nested relational JSON against a schema and print
//! projections or pool statistics.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    let catalog = commands::load_catalog(cli.schema.as_deref())?;

    let output = match &cli.command {
        Commands::Project {
            input,
            include,
            pretty,
        } => commands::project(&catalog, input, include.as_deref(), *pretty)?,
        Commands::Inspect { input } => commands::inspect(&catalog, input)?,
        Commands::Check => commands::check(&catalog),
    };
    println!("{output}");
    Ok(())
}
