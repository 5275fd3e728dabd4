//! Line storage
//!
//! The kit tree manager is written against [`LineStore`]. Two stores are
//! provided: an in-memory arena and a SQLite database. Both keep a
//! parent-to-children index and refuse deletes that would leave a line
//! pointing at a missing kit parent.

mod memory;
mod serialize;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::core::identity::{LineId, LocationId, ProductId, ShipmentId};
use crate::core::line::Line;

/// Errors raised by a line store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Line {0} already exists")]
    Duplicate(LineId),

    #[error("Line {0} does not exist")]
    Missing(LineId),

    #[error("Kit parent {parent} of line {line} does not exist")]
    MissingParent { line: LineId, parent: LineId },

    #[error("Deleting line {parent} would orphan its component line {child}")]
    WouldOrphan { parent: LineId, child: LineId },

    #[error("A transaction is already active")]
    TransactionActive,

    #[error("No transaction is active")]
    NoTransaction,

    #[error("Corrupt line record: {0}")]
    Corrupt(String),
}

/// Selects lines for listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFilter {
    /// Only lines without a kit parent
    pub roots_only: bool,
    pub product: Option<ProductId>,
    pub from_location: Option<LocationId>,
    pub to_location: Option<LocationId>,
    /// Lines attached to this shipment through any of their references
    pub shipment: Option<ShipmentId>,
}

impl LineFilter {
    /// Root lines only, the view shipment documents show
    pub fn roots() -> Self {
        Self {
            roots_only: true,
            ..Default::default()
        }
    }

    pub fn matches(&self, line: &Line) -> bool {
        if self.roots_only && line.is_component() {
            return false;
        }
        if self.product.as_ref().is_some_and(|p| *p != line.product) {
            return false;
        }
        if self
            .from_location
            .as_ref()
            .is_some_and(|l| *l != line.from_location)
        {
            return false;
        }
        if self
            .to_location
            .as_ref()
            .is_some_and(|l| *l != line.to_location)
        {
            return false;
        }
        if let Some(shipment) = &self.shipment {
            if !line.shipments.contains(shipment) {
                return false;
            }
        }
        true
    }
}

/// Durable create/read/update/delete of line records
///
/// Mutations between `begin` and `commit` are atomic: `rollback` discards
/// all of them.
pub trait LineStore {
    /// Store a new line. Its kit parent, if any, must already exist.
    fn insert(&mut self, line: &Line) -> Result<(), StoreError>;

    fn get(&self, id: &LineId) -> Result<Option<Line>, StoreError>;

    /// Overwrite an existing line
    fn update(&mut self, line: &Line) -> Result<(), StoreError>;

    /// Delete a batch of lines, returning how many were removed
    ///
    /// Fails with [`StoreError::WouldOrphan`] if a remaining line would
    /// still point at one of the deleted lines.
    fn delete(&mut self, ids: &[LineId]) -> Result<usize, StoreError>;

    /// Direct kit children of a line, ordered by sequence
    fn children(&self, id: &LineId) -> Result<Vec<LineId>, StoreError>;

    /// Lines matching a filter, ordered by sequence
    fn find(&self, filter: &LineFilter) -> Result<Vec<Line>, StoreError>;

    fn begin(&mut self) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;
}
