//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::line::LineCommands;

#[derive(Parser, Debug)]
#[command(
    name = "kit",
    version,
    about = "Keep kit order lines exploded into their component lines"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Log debug output to stderr (overridden by KIT_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a kit workspace in the current directory
    Init,

    /// Validate the unit and kit catalog
    Check,

    /// Create, change, delete and inspect lines
    #[command(subcommand)]
    Line(LineCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for command results
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for lists, YAML for single lines
    #[default]
    Auto,
    Yaml,
    Json,
    Tsv,
    Csv,
    /// Line ids only
    Id,
}
