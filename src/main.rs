use clap::Parser;
use kitting::cli::{commands, Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    kitting::logging::init(cli.global.verbose);

    match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Check => commands::check::run(),
        Commands::Line(cmd) => commands::line::run(cmd, &cli.global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
