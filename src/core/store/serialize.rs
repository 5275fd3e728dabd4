//! SQLite serialization for identifiers and typed enums
//!
//! Implements ToSql and FromSql so ids and expansion state can be bound
//! and read directly.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::core::identity::{CompanyId, LineId, LocationId, ProductId, ShipmentId, UnitId};
use crate::core::line::ExpansionState;

fn invalid_data(message: String) -> FromSqlError {
    FromSqlError::Other(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

// =========================================================================
// LineId - ToSql/FromSql
// =========================================================================

impl ToSql for LineId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for LineId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse::<LineId>()
            .map_err(|e| invalid_data(e.to_string()))
    }
}

// =========================================================================
// Reference ids - ToSql/FromSql
// =========================================================================

macro_rules! sql_reference_id {
    ($($name:ident),+) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    Ok($name::new(value.as_str()?))
                }
            }
        )+
    };
}

sql_reference_id!(ProductId, UnitId, LocationId, CompanyId, ShipmentId);

// =========================================================================
// ExpansionState - ToSql/FromSql
// =========================================================================

impl ToSql for ExpansionState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for ExpansionState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse().map_err(invalid_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_expansion_state_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE test (expansion TEXT)", []).unwrap();

        for state in [ExpansionState::Unexpanded, ExpansionState::Expanded] {
            conn.execute("DELETE FROM test", []).unwrap();
            conn.execute("INSERT INTO test VALUES (?1)", [&state]).unwrap();

            let retrieved: ExpansionState = conn
                .query_row("SELECT expansion FROM test", [], |row| row.get(0))
                .unwrap();

            assert_eq!(state, retrieved);
        }
    }

    #[test]
    fn test_line_id_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE test (id TEXT)", []).unwrap();

        let id = LineId::new();
        conn.execute("INSERT INTO test VALUES (?1)", [&id]).unwrap();
        let retrieved: LineId = conn
            .query_row("SELECT id FROM test", [], |row| row.get(0))
            .unwrap();
        assert_eq!(id, retrieved);
    }

    #[test]
    fn test_malformed_line_id_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE test (id TEXT)", []).unwrap();
        conn.execute("INSERT INTO test VALUES ('garbage')", []).unwrap();

        let result: rusqlite::Result<LineId> =
            conn.query_row("SELECT id FROM test", [], |row| row.get(0));
        assert!(result.is_err());
    }
}
