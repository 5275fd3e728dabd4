//! `kit init` command - create a workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::project::Project;

pub fn run() -> Result<()> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let project = Project::init(&cwd).map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Initialized kit workspace in {}",
        style("✓").green(),
        style(project.kit_dir().display()).cyan()
    );
    println!("  Edit {} to define units and kits", style(".kit/catalog.yaml").yellow());
    Ok(())
}
