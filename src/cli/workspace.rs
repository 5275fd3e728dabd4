//! Opening the kit workspace a command runs against

use miette::Result;

use crate::core::config::Config;
use crate::core::kits::{Catalog, KitCatalog};
use crate::core::manager::KitTreeManager;
use crate::core::project::Project;
use crate::core::store::SqliteStore;
use crate::core::units::UnitTable;

/// Manager over the workspace database and catalog
pub type WorkspaceManager = KitTreeManager<SqliteStore, UnitTable, KitCatalog>;

/// A discovered workspace, ready to run kit operations
pub struct Workspace {
    pub manager: WorkspaceManager,
}

impl Workspace {
    /// Discover the workspace from the current directory and open it
    pub fn open() -> Result<Self> {
        let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
        Self::open_project(project)
    }

    pub fn open_project(project: Project) -> Result<Self> {
        let config = Config::load(&project.config_path())?;
        let catalog = load_catalog(&project, &config)?;

        let store = SqliteStore::open(&project.database_path(&config))
            .map_err(|e| miette::miette!("{}", e))?;
        let manager = KitTreeManager::new(
            store,
            catalog.unit_table(),
            catalog.kit_catalog(),
            config.kit.clone(),
        );

        Ok(Self { manager })
    }
}

/// Load the workspace catalog file
pub fn load_catalog(project: &Project, config: &Config) -> Result<Catalog> {
    let path = project.catalog_path(config);
    if !path.exists() {
        return Ok(Catalog::default());
    }
    Catalog::load(&path).map_err(|e| match e {
        crate::core::kits::CatalogError::Yaml(yaml) => miette::Report::new(yaml),
        other => miette::miette!("{}", other),
    })
}
