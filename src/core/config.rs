//! Runtime configuration from `.kit/config.yaml`

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::yaml::{parse_yaml_file, YamlError};

/// What to do when a caller deletes a component line directly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentDeletePolicy {
    /// Refuse the delete
    #[default]
    Reject,
    /// Delete the whole tree the component belongs to
    Cascade,
    /// Delete the component and its own descendants only
    Detach,
}

impl std::fmt::Display for ComponentDeletePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentDeletePolicy::Reject => write!(f, "reject"),
            ComponentDeletePolicy::Cascade => write!(f, "cascade"),
            ComponentDeletePolicy::Detach => write!(f, "detach"),
        }
    }
}

impl std::str::FromStr for ComponentDeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(ComponentDeletePolicy::Reject),
            "cascade" => Ok(ComponentDeletePolicy::Cascade),
            "detach" => Ok(ComponentDeletePolicy::Detach),
            _ => Err(format!(
                "Invalid component delete policy: {}. Use reject, cascade, or detach",
                s
            )),
        }
    }
}

/// Settings the kit tree manager runs with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitConfig {
    /// Deepest kit nesting an explosion may reach
    pub max_depth: u32,

    pub component_delete: ComponentDeletePolicy,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            component_delete: ComponentDeletePolicy::Reject,
        }
    }
}

const CONFIG_HEADER: &str = "# max_depth: deepest kit nesting an explosion may reach\n\
# component_delete: deleting a component line directly: reject, cascade, or detach\n";

/// Workspace configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub kit: KitConfig,

    /// Database file, relative to the `.kit` directory
    pub database: String,

    /// Catalog file, relative to the `.kit` directory
    pub catalog: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kit: KitConfig::default(),
            database: "lines.db".to_string(),
            catalog: "catalog.yaml".to_string(),
        }
    }
}

impl Config {
    /// Load configuration, falling back to defaults if the file is absent
    pub fn load(path: &Path) -> Result<Self, YamlError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        parse_yaml_file(path)
    }

    /// Render as YAML for writing a fresh config file
    pub fn to_yaml(&self) -> Result<String, serde_yml::Error> {
        let body = serde_yml::to_string(self)?;
        Ok(format!("{}{}", CONFIG_HEADER, body))
    }
}
