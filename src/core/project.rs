//! Workspace discovery - the `.kit` directory and the files in it

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::config::Config;
use crate::core::kits::EXAMPLE_CATALOG;
use crate::core::store::{SqliteStore, StoreError};

/// Directory marking a kit workspace
pub const KIT_DIR: &str = ".kit";

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not a kit workspace (no {KIT_DIR} directory in {0} or any parent). Run 'kit init' first")]
    NotFound(PathBuf),

    #[error("Workspace already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write config: {0}")]
    Config(#[from] serde_yml::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A directory containing `.kit/`
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Create `.kit/` with a default config, the example catalog and an
    /// empty database
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let project = Self {
            root: path.to_path_buf(),
        };
        if project.kit_dir().exists() {
            return Err(ProjectError::AlreadyInitialized(project.kit_dir()));
        }

        fs::create_dir_all(project.kit_dir())?;
        let config = Config::default();
        fs::write(project.config_path(), config.to_yaml()?)?;
        fs::write(project.kit_dir().join(&config.catalog), EXAMPLE_CATALOG)?;
        SqliteStore::open(&project.kit_dir().join(&config.database))?;

        Ok(project)
    }

    /// Find the workspace containing the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    /// Find the workspace containing `start`
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        start
            .ancestors()
            .find(|dir| dir.join(KIT_DIR).is_dir())
            .map(|dir| Self {
                root: dir.to_path_buf(),
            })
            .ok_or_else(|| ProjectError::NotFound(start.to_path_buf()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kit_dir(&self) -> PathBuf {
        self.root.join(KIT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.kit_dir().join(CONFIG_FILE)
    }

    pub fn catalog_path(&self, config: &Config) -> PathBuf {
        self.kit_dir().join(&config.catalog)
    }

    pub fn database_path(&self, config: &Config) -> PathBuf {
        self.kit_dir().join(&config.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_files() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let config = Config::default();

        assert!(project.config_path().is_file());
        assert!(project.catalog_path(&config).is_file());
        assert!(project.database_path(&config).is_file());
        assert_eq!(Config::load(&project.config_path()).unwrap(), config);
    }

    #[test]
    fn test_init_twice_fails() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();
        assert!(matches!(
            Project::init(tmp.path()),
            Err(ProjectError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();
        let nested = tmp.path().join("orders").join("2024");
        fs::create_dir_all(&nested).unwrap();

        let project = Project::discover_from(&nested).unwrap();
        assert_eq!(project.root(), tmp.path());
    }

    #[test]
    fn test_discover_outside_workspace() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            Project::discover_from(tmp.path()),
            Err(ProjectError::NotFound(_))
        ));
    }
}
