//! `kit completions` command - shell completion scripts

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::Result;

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "kit", &mut std::io::stdout());
    Ok(())
}
