use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "relmodel",
    version,
    about = "Normalize nested relational JSON and project it back"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Schema file (.toml or .json)")]
    pub schema: Option<PathBuf>,
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity"
    )]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Group, link and print the projected root
    Project {
        #[command(flatten)]
        input: InputArgs,
        #[arg(
            long,
            help = "Include spec as JSON, e.g. '{\"assigns\": [\"department\"]}'"
        )]
        include: Option<String>,
        #[arg(long, default_value_t = false, help = "Indent the output")]
        pretty: bool,
    },
    /// Group, link and print pool statistics
    Inspect {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Validate the schema and list its types
    Check,
}

#[derive(Args, Debug)]
pub struct InputArgs {
    #[arg(long = "type", help = "Entity type of the root record")]
    pub type_name: String,
    #[arg(long, help = "Input JSON file; stdin when omitted")]
    pub input: Option<PathBuf>,
}
