//! `kit check` command - validate the catalog

use console::style;
use miette::Result;

use crate::cli::workspace::load_catalog;
use crate::core::config::Config;
use crate::core::project::Project;

pub fn run() -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load(&project.config_path())?;
    let catalog = load_catalog(&project, &config)?;

    catalog.validate().map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Catalog is valid: {} units, {} kits",
        style("✓").green(),
        catalog.units.len(),
        catalog.kits.len()
    );
    Ok(())
}
