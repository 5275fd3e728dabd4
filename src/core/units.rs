//! Unit of measure conversion
//!
//! Units belong to a category (count, mass, length, ...) and carry a rate
//! relative to the reference unit of that category. Converting between two
//! units of the same category is `qty * from.rate / to.rate`, optionally
//! rounded to the target unit's rounding step.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::core::identity::UnitId;

/// Errors raised by a unit converter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("unknown unit of measure: {0}")]
    UnknownUnit(UnitId),

    #[error("cannot convert {from} ({from_category}) to {to} ({to_category})")]
    IncompatibleUnits {
        from: UnitId,
        to: UnitId,
        from_category: String,
        to_category: String,
    },

    #[error("quantity overflow converting {from} to {to}")]
    Overflow { from: UnitId, to: UnitId },
}

/// Converts quantities between units of measure
pub trait UnitConverter {
    /// Express `quantity` of `from` in `to`
    fn convert(&self, from: &UnitId, quantity: Decimal, to: &UnitId)
        -> Result<Decimal, ConversionError>;
}

/// A unit of measure definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,

    /// Units only convert within the same category
    pub category: String,

    /// How many reference units one of this unit represents
    pub rate: Decimal,

    /// Round converted quantities to a multiple of this step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounding: Option<Decimal>,
}

impl Unit {
    pub fn new(id: impl Into<UnitId>, category: impl Into<String>, rate: Decimal) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            rate,
            rounding: None,
        }
    }

    pub fn with_rounding(mut self, rounding: Decimal) -> Self {
        self.rounding = Some(rounding);
        self
    }

    fn round(&self, quantity: Decimal) -> Option<Decimal> {
        match self.rounding {
            Some(step) if !step.is_zero() => {
                let steps = quantity.checked_div(step)?;
                steps
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .checked_mul(step)
            }
            _ => Some(quantity),
        }
    }
}

/// Table of known units
#[derive(Debug, Clone, Default)]
pub struct UnitTable {
    units: HashMap<UnitId, Unit>,
}

impl UnitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from unit definitions; later duplicates win
    pub fn from_units(units: impl IntoIterator<Item = Unit>) -> Self {
        let mut table = Self::new();
        for unit in units {
            table.insert(unit);
        }
        table
    }

    pub fn insert(&mut self, unit: Unit) {
        self.units.insert(unit.id.clone(), unit);
    }

    pub fn contains(&self, id: &UnitId) -> bool {
        self.units.contains_key(id)
    }

    fn lookup(&self, id: &UnitId) -> Result<&Unit, ConversionError> {
        self.units
            .get(id)
            .ok_or_else(|| ConversionError::UnknownUnit(id.clone()))
    }
}

impl UnitConverter for UnitTable {
    fn convert(
        &self,
        from: &UnitId,
        quantity: Decimal,
        to: &UnitId,
    ) -> Result<Decimal, ConversionError> {
        let source = self.lookup(from)?;
        let target = self.lookup(to)?;

        if from == to {
            return Ok(quantity);
        }

        if source.category != target.category {
            return Err(ConversionError::IncompatibleUnits {
                from: from.clone(),
                to: to.clone(),
                from_category: source.category.clone(),
                to_category: target.category.clone(),
            });
        }

        let overflow = || ConversionError::Overflow {
            from: from.clone(),
            to: to.clone(),
        };

        let converted = quantity
            .checked_mul(source.rate)
            .and_then(|q| q.checked_div(target.rate))
            .ok_or_else(overflow)?;

        target.round(converted).ok_or_else(overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> UnitTable {
        UnitTable::from_units([
            Unit::new("unit", "count", Decimal::ONE).with_rounding(Decimal::ONE),
            Unit::new("dozen", "count", Decimal::from(12)),
            Unit::new("g", "mass", Decimal::new(1, 3)),
            Unit::new("kg", "mass", Decimal::ONE).with_rounding(Decimal::new(1, 2)),
        ])
    }

    #[test]
    fn test_same_unit_is_identity() {
        let units = table();
        let qty = Decimal::new(35, 1);
        assert_eq!(
            units.convert(&"dozen".into(), qty, &"dozen".into()).unwrap(),
            qty
        );
    }

    #[test]
    fn test_convert_dozen_to_unit() {
        let units = table();
        let qty = units
            .convert(&"dozen".into(), Decimal::from(2), &"unit".into())
            .unwrap();
        assert_eq!(qty, Decimal::from(24));
    }

    #[test]
    fn test_convert_unit_to_dozen_unrounded() {
        let units = table();
        let qty = units
            .convert(&"unit".into(), Decimal::from(6), &"dozen".into())
            .unwrap();
        assert_eq!(qty, Decimal::new(5, 1));
    }

    #[test]
    fn test_rounding_to_target_step() {
        let units = table();
        // 1234.5 g = 1.2345 kg, rounded to 0.01
        let qty = units
            .convert(&"g".into(), Decimal::new(12345, 1), &"kg".into())
            .unwrap();
        assert_eq!(qty, Decimal::new(123, 2));

        // 0.125 dozen = 1.5 units, rounded half away from zero
        let qty = units
            .convert(&"dozen".into(), Decimal::new(125, 3), &"unit".into())
            .unwrap();
        assert_eq!(qty, Decimal::from(2));
    }

    #[test]
    fn test_incompatible_categories() {
        let units = table();
        let err = units
            .convert(&"kg".into(), Decimal::ONE, &"unit".into())
            .unwrap_err();
        assert!(matches!(err, ConversionError::IncompatibleUnits { .. }));
    }

    #[test]
    fn test_unknown_unit() {
        let units = table();
        let err = units
            .convert(&"furlong".into(), Decimal::ONE, &"unit".into())
            .unwrap_err();
        assert_eq!(err, ConversionError::UnknownUnit("furlong".into()));
    }
}
