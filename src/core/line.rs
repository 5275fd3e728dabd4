//! Line records - the nodes of a kit tree

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::identity::{CompanyId, LineId, LocationId, ProductId, ShipmentId, UnitId};

/// Whether a line's kit definition has been materialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionState {
    #[default]
    Unexpanded,
    Expanded,
}

impl std::fmt::Display for ExpansionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpansionState::Unexpanded => write!(f, "unexpanded"),
            ExpansionState::Expanded => write!(f, "expanded"),
        }
    }
}

impl std::str::FromStr for ExpansionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unexpanded" => Ok(ExpansionState::Unexpanded),
            "expanded" => Ok(ExpansionState::Expanded),
            _ => Err(format!(
                "Invalid expansion state: {}. Use 'unexpanded' or 'expanded'",
                s
            )),
        }
    }
}

/// Shipment documents a line belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<ShipmentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming: Option<ShipmentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_return: Option<ShipmentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_return: Option<ShipmentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<ShipmentId>,
}

impl ShipmentRefs {
    /// Iterate over the shipments that are set
    pub fn iter(&self) -> impl Iterator<Item = &ShipmentId> {
        [
            &self.outgoing,
            &self.incoming,
            &self.outgoing_return,
            &self.incoming_return,
            &self.internal,
        ]
        .into_iter()
        .flatten()
    }

    /// True if any of the references points at `shipment`
    pub fn contains(&self, shipment: &ShipmentId) -> bool {
        self.iter().any(|s| s == shipment)
    }
}

/// A movement line, either a root order line or a synthesized kit component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,

    /// Ordering hint. Caller supplied for roots, a per-tree counter for components.
    pub sequence: i64,

    pub product: ProductId,

    /// Amount expressed in `unit`
    pub quantity: Decimal,

    pub unit: UnitId,

    pub from_location: LocationId,

    pub to_location: LocationId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,

    pub company: CompanyId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_date: Option<NaiveDate>,

    #[serde(default)]
    pub shipments: ShipmentRefs,

    /// 0 for lines not produced by explosion
    #[serde(default)]
    pub kit_depth: u32,

    /// Line whose explosion produced this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_parent_line: Option<LineId>,

    #[serde(default)]
    pub expansion: ExpansionState,
}

impl Line {
    /// Build an unexpanded root line from caller input
    pub fn root(new: NewLine) -> Self {
        Self {
            id: LineId::new(),
            sequence: new.sequence.unwrap_or(0),
            product: new.product,
            quantity: new.quantity,
            unit: new.unit,
            from_location: new.from_location,
            to_location: new.to_location,
            unit_price: new.unit_price,
            company: new.company,
            planned_date: new.planned_date,
            shipments: new.shipments,
            kit_depth: 0,
            kit_parent_line: None,
            expansion: ExpansionState::Unexpanded,
        }
    }

    /// Build a component line of `self`
    ///
    /// Everything except product, quantity, depth and sequence is copied
    /// verbatim from the parent. Components never carry a planned date.
    pub fn component(&self, product: ProductId, quantity: Decimal, sequence: i64) -> Self {
        Self {
            id: LineId::new(),
            sequence,
            product,
            quantity,
            unit: self.unit.clone(),
            from_location: self.from_location.clone(),
            to_location: self.to_location.clone(),
            unit_price: self.unit_price,
            company: self.company.clone(),
            planned_date: None,
            shipments: self.shipments.clone(),
            kit_depth: self.kit_depth + 1,
            kit_parent_line: Some(self.id.clone()),
            expansion: ExpansionState::Unexpanded,
        }
    }

    /// True for lines produced by explosion
    pub fn is_component(&self) -> bool {
        self.kit_parent_line.is_some()
    }

    pub fn is_expanded(&self) -> bool {
        self.expansion == ExpansionState::Expanded
    }
}

/// Input for creating a root line
///
/// There is no way to set a kit parent or depth here: component lines are
/// only ever produced by explosion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLine {
    pub product: ProductId,
    pub quantity: Decimal,
    pub unit: UnitId,
    pub from_location: LocationId,
    pub to_location: LocationId,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    pub company: CompanyId,
    #[serde(default)]
    pub sequence: Option<i64>,
    #[serde(default)]
    pub planned_date: Option<NaiveDate>,
    #[serde(default)]
    pub shipments: ShipmentRefs,
}

impl NewLine {
    pub fn new(
        product: impl Into<ProductId>,
        quantity: Decimal,
        unit: impl Into<UnitId>,
    ) -> Self {
        Self {
            product: product.into(),
            quantity,
            unit: unit.into(),
            from_location: LocationId::new("storage"),
            to_location: LocationId::new("customer"),
            unit_price: None,
            company: CompanyId::new("main"),
            sequence: None,
            planned_date: None,
            shipments: ShipmentRefs::default(),
        }
    }

    pub fn with_locations(
        mut self,
        from: impl Into<LocationId>,
        to: impl Into<LocationId>,
    ) -> Self {
        self.from_location = from.into();
        self.to_location = to.into();
        self
    }

    pub fn with_company(mut self, company: impl Into<CompanyId>) -> Self {
        self.company = company.into();
        self
    }

    pub fn with_unit_price(mut self, price: Decimal) -> Self {
        self.unit_price = Some(price);
        self
    }

    pub fn with_shipments(mut self, shipments: ShipmentRefs) -> Self {
        self.shipments = shipments;
        self
    }
}

/// Attribute changes applied by an update
///
/// `None` leaves the attribute untouched. Optional attributes use a nested
/// option so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_location: Option<LocationId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_location: Option<LocationId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Option<Decimal>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_date: Option<Option<NaiveDate>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipments: Option<ShipmentRefs>,
}

impl LineChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product(mut self, product: impl Into<ProductId>) -> Self {
        self.product = Some(product.into());
        self
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn unit(mut self, unit: impl Into<UnitId>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn locations(mut self, from: impl Into<LocationId>, to: impl Into<LocationId>) -> Self {
        self.from_location = Some(from.into());
        self.to_location = Some(to.into());
        self
    }

    pub fn shipments(mut self, shipments: ShipmentRefs) -> Self {
        self.shipments = Some(shipments);
        self
    }

    /// True if product, quantity or unit is present at all
    pub fn touches_kit(&self) -> bool {
        self.product.is_some() || self.quantity.is_some() || self.unit.is_some()
    }

    /// True if applying these changes would alter the line's product,
    /// quantity or unit value
    pub fn alters_kit(&self, line: &Line) -> bool {
        self.product.as_ref().is_some_and(|p| *p != line.product)
            || self.quantity.is_some_and(|q| q != line.quantity)
            || self.unit.as_ref().is_some_and(|u| *u != line.unit)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write the changes onto `line`
    pub fn apply_to(&self, line: &mut Line) {
        if let Some(product) = &self.product {
            line.product = product.clone();
        }
        if let Some(quantity) = self.quantity {
            line.quantity = quantity;
        }
        if let Some(unit) = &self.unit {
            line.unit = unit.clone();
        }
        if let Some(from) = &self.from_location {
            line.from_location = from.clone();
        }
        if let Some(to) = &self.to_location {
            line.to_location = to.clone();
        }
        if let Some(price) = self.unit_price {
            line.unit_price = price;
        }
        if let Some(company) = &self.company {
            line.company = company.clone();
        }
        if let Some(sequence) = self.sequence {
            line.sequence = sequence;
        }
        if let Some(date) = self.planned_date {
            line.planned_date = date;
        }
        if let Some(shipments) = &self.shipments {
            line.shipments = shipments.clone();
        }
    }
}
