use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fcf",
    about = "File command facility: read and write JSON command streams",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with stream settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute commands from a location until it is exhausted
    Run(RunArgs),
    /// Write JSON objects to a location
    Emit(EmitArgs),
    /// Show how a location resolves
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// e.g. `cmds.json`, `file:///tmp/cmds.fifo?fmt=jstream`
    pub location: String,
    /// Stop after this many commands
    #[arg(long)]
    pub max: Option<usize>,
}

#[derive(Args)]
pub struct EmitArgs {
    pub location: String,
    /// JSON objects to write; read a JSON stream from stdin when omitted
    pub records: Vec<String>,
}

#[derive(Args)]
pub struct InspectArgs {
    pub location: String,
}
