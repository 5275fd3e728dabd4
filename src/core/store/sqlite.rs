//! SQLite-backed line store

use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use super::{LineFilter, LineStore, StoreError};
use crate::core::identity::LineId;
use crate::core::line::{Line, ShipmentRefs};

/// Default busy_timeout in milliseconds
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS lines (
    id                  TEXT PRIMARY KEY,
    sequence            INTEGER NOT NULL DEFAULT 0,
    product             TEXT NOT NULL,
    quantity            TEXT NOT NULL,
    unit                TEXT NOT NULL,
    from_location       TEXT NOT NULL,
    to_location         TEXT NOT NULL,
    unit_price          TEXT,
    company             TEXT NOT NULL,
    planned_date        TEXT,
    shipment_out        TEXT,
    shipment_in         TEXT,
    shipment_out_return TEXT,
    shipment_in_return  TEXT,
    shipment_internal   TEXT,
    kit_depth           INTEGER NOT NULL DEFAULT 0,
    kit_parent_line     TEXT REFERENCES lines(id),
    expansion           TEXT NOT NULL DEFAULT 'unexpanded'
);
CREATE INDEX IF NOT EXISTS idx_lines_kit_parent ON lines(kit_parent_line, sequence);
"#;

const COLUMNS: &str = "id, sequence, product, quantity, unit, from_location, to_location, \
     unit_price, company, planned_date, shipment_out, shipment_in, shipment_out_return, \
     shipment_in_return, shipment_internal, kit_depth, kit_parent_line, expansion";

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        Decimal::from_str(&t)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn row_to_line(row: &Row<'_>) -> rusqlite::Result<Line> {
    Ok(Line {
        id: row.get(0)?,
        sequence: row.get(1)?,
        product: row.get(2)?,
        quantity: decimal_column(row, 3)?,
        unit: row.get(4)?,
        from_location: row.get(5)?,
        to_location: row.get(6)?,
        unit_price: optional_decimal_column(row, 7)?,
        company: row.get(8)?,
        planned_date: row.get(9)?,
        shipments: ShipmentRefs {
            outgoing: row.get(10)?,
            incoming: row.get(11)?,
            outgoing_return: row.get(12)?,
            incoming_return: row.get(13)?,
            internal: row.get(14)?,
        },
        kit_depth: row.get(15)?,
        kit_parent_line: row.get(16)?,
        expansion: row.get(17)?,
    })
}

/// Line store persisted in a SQLite database
pub struct SqliteStore {
    conn: Connection,
    in_transaction: bool,
}

impl SqliteStore {
    /// Open (creating if needed) a database file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    /// Total number of stored lines
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM lines", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| StoreError::Corrupt(format!("line count {}", count)))
    }

    fn exists(&self, id: &LineId) -> Result<bool, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT 1 FROM lines WHERE id = ?1", [id], |_| Ok(()))
            .optional()?
            .is_some())
    }
}

impl LineStore for SqliteStore {
    fn insert(&mut self, line: &Line) -> Result<(), StoreError> {
        if self.exists(&line.id)? {
            return Err(StoreError::Duplicate(line.id.clone()));
        }
        if let Some(parent) = &line.kit_parent_line {
            if !self.exists(parent)? {
                return Err(StoreError::MissingParent {
                    line: line.id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        let sql = format!(
            "INSERT INTO lines ({}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            COLUMNS
        );
        self.conn.prepare_cached(&sql)?.execute(params![
            line.id,
            line.sequence,
            line.product,
            line.quantity.to_string(),
            line.unit,
            line.from_location,
            line.to_location,
            line.unit_price.map(|p| p.to_string()),
            line.company,
            line.planned_date,
            line.shipments.outgoing,
            line.shipments.incoming,
            line.shipments.outgoing_return,
            line.shipments.incoming_return,
            line.shipments.internal,
            line.kit_depth,
            line.kit_parent_line,
            line.expansion,
        ])?;
        Ok(())
    }

    fn get(&self, id: &LineId) -> Result<Option<Line>, StoreError> {
        let sql = format!("SELECT {} FROM lines WHERE id = ?1", COLUMNS);
        Ok(self
            .conn
            .prepare_cached(&sql)?
            .query_row([id], row_to_line)
            .optional()?)
    }

    fn update(&mut self, line: &Line) -> Result<(), StoreError> {
        let changed = self
            .conn
            .prepare_cached(
                "UPDATE lines SET sequence = ?2, product = ?3, quantity = ?4, unit = ?5, \
                 from_location = ?6, to_location = ?7, unit_price = ?8, company = ?9, \
                 planned_date = ?10, shipment_out = ?11, shipment_in = ?12, \
                 shipment_out_return = ?13, shipment_in_return = ?14, shipment_internal = ?15, \
                 kit_depth = ?16, kit_parent_line = ?17, expansion = ?18 \
                 WHERE id = ?1",
            )?
            .execute(params![
                line.id,
                line.sequence,
                line.product,
                line.quantity.to_string(),
                line.unit,
                line.from_location,
                line.to_location,
                line.unit_price.map(|p| p.to_string()),
                line.company,
                line.planned_date,
                line.shipments.outgoing,
                line.shipments.incoming,
                line.shipments.outgoing_return,
                line.shipments.incoming_return,
                line.shipments.internal,
                line.kit_depth,
                line.kit_parent_line,
                line.expansion,
            ])?;

        if changed == 0 {
            return Err(StoreError::Missing(line.id.clone()));
        }
        Ok(())
    }

    fn delete(&mut self, ids: &[LineId]) -> Result<usize, StoreError> {
        let doomed: HashSet<&LineId> = ids.iter().collect();
        let mut ordered: Vec<(u32, &LineId)> = Vec::with_capacity(doomed.len());

        {
            let mut depth_stmt = self
                .conn
                .prepare_cached("SELECT kit_depth FROM lines WHERE id = ?1")?;
            let mut child_stmt = self
                .conn
                .prepare_cached("SELECT id FROM lines WHERE kit_parent_line = ?1")?;

            for id in &doomed {
                let depth: Option<u32> = depth_stmt
                    .query_row([*id], |row| row.get(0))
                    .optional()?;
                let Some(depth) = depth else {
                    continue;
                };

                let children = child_stmt
                    .query_map([*id], |row| row.get::<_, LineId>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(child) = children.into_iter().find(|c| !doomed.contains(&c)) {
                    return Err(StoreError::WouldOrphan {
                        parent: (*id).clone(),
                        child,
                    });
                }
                ordered.push((depth, *id));
            }
        }

        // Deepest first so no statement leaves a dangling kit parent
        ordered.sort_by(|a, b| b.0.cmp(&a.0));

        let mut stmt = self.conn.prepare_cached("DELETE FROM lines WHERE id = ?1")?;
        let mut removed = 0;
        for (_, id) in ordered {
            removed += stmt.execute([id])?;
        }
        debug!(removed, "deleted lines from sqlite store");
        Ok(removed)
    }

    fn children(&self, id: &LineId) -> Result<Vec<LineId>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id FROM lines WHERE kit_parent_line = ?1 ORDER BY sequence, id",
        )?;
        let children = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<LineId>, _>>()?;
        Ok(children)
    }

    fn find(&self, filter: &LineFilter) -> Result<Vec<Line>, StoreError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<&dyn ToSql> = Vec::new();

        if filter.roots_only {
            clauses.push("kit_parent_line IS NULL".to_string());
        }
        if let Some(product) = &filter.product {
            values.push(product);
            clauses.push(format!("product = ?{}", values.len()));
        }
        if let Some(from) = &filter.from_location {
            values.push(from);
            clauses.push(format!("from_location = ?{}", values.len()));
        }
        if let Some(to) = &filter.to_location {
            values.push(to);
            clauses.push(format!("to_location = ?{}", values.len()));
        }
        if let Some(shipment) = &filter.shipment {
            values.push(shipment);
            clauses.push(format!(
                "?{} IN (shipment_out, shipment_in, shipment_out_return, \
                 shipment_in_return, shipment_internal)",
                values.len()
            ));
        }

        let mut sql = format!("SELECT {} FROM lines", COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY sequence, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let lines = stmt
            .query_map(values.as_slice(), row_to_line)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            return Err(StoreError::TransactionActive);
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoTransaction);
        }
        self.conn.execute_batch("COMMIT")?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoTransaction);
        }
        self.in_transaction = false;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
