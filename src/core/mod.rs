//! Core module - kit tree types, storage and the manager

pub mod config;
pub mod error;
pub mod identity;
pub mod kits;
pub mod line;
pub mod manager;
pub mod project;
pub mod store;
pub mod units;

pub use config::{ComponentDeletePolicy, Config, KitConfig};
pub use error::KitError;
pub use identity::{CompanyId, IdParseError, LineId, LocationId, ProductId, ShipmentId, UnitId};
pub use kits::{Catalog, CatalogError, KitCatalog, KitComponent, KitDefinitionSource};
pub use line::{ExpansionState, Line, LineChanges, NewLine, ShipmentRefs};
pub use manager::KitTreeManager;
pub use project::{Project, ProjectError};
pub use store::{LineFilter, LineStore, MemoryStore, SqliteStore, StoreError};
pub use units::{ConversionError, Unit, UnitConverter, UnitTable};
