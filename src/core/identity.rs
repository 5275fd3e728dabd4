//! Identifiers for lines and the catalog records they reference
//!
//! Line ids are generated (`LINE-<ULID>`). Everything else is a reference
//! into an external catalog and is carried as an opaque string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Prefix carried by every line id
pub const LINE_PREFIX: &str = "LINE";

/// Errors produced when parsing a line id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("line id must start with '{LINE_PREFIX}-': {0}")]
    MissingPrefix(String),

    #[error("invalid ULID in line id '{id}': {reason}")]
    InvalidUlid { id: String, reason: String },
}

/// Unique, immutable identity of a line
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineId(Ulid);

impl LineId {
    /// Generate a fresh line id
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// The ULID portion of the id
    pub fn ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", LINE_PREFIX, self.0)
    }
}

impl FromStr for LineId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = s
            .strip_prefix(LINE_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or_else(|| IdParseError::MissingPrefix(s.to_string()))?;
        Ulid::from_string(ulid)
            .map(Self)
            .map_err(|e| IdParseError::InvalidUlid {
                id: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl TryFrom<String> for LineId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LineId> for String {
    fn from(id: LineId) -> Self {
        id.to_string()
    }
}

/// Declare a string-backed reference type
macro_rules! reference_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }
    };
}

reference_id!(
    /// Reference to a product definition
    ProductId
);
reference_id!(
    /// Reference to a unit of measure
    UnitId
);
reference_id!(
    /// Reference to an inventory location
    LocationId
);
reference_id!(
    /// Reference to the owning company
    CompanyId
);
reference_id!(
    /// Reference to a shipment document
    ShipmentId
);
