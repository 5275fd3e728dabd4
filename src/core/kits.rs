//! Kit definitions and the catalog file they are loaded from

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::core::identity::{ProductId, UnitId};
use crate::core::units::{Unit, UnitTable};
use crate::yaml::{parse_yaml, parse_yaml_file, YamlError};

/// One component of a kit: `quantity` of `product` in `unit`, per kit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitComponent {
    pub product: ProductId,
    pub quantity: Decimal,
    pub unit: UnitId,
}

impl KitComponent {
    pub fn new(product: impl Into<ProductId>, quantity: Decimal, unit: impl Into<UnitId>) -> Self {
        Self {
            product: product.into(),
            quantity,
            unit: unit.into(),
        }
    }
}

/// Read-only source of kit definitions
pub trait KitDefinitionSource {
    /// Ordered components of `product`; empty if the product is not a kit
    fn kit_lines_of(&self, product: &ProductId) -> Vec<KitComponent>;
}

/// In-memory kit definitions keyed by product
#[derive(Debug, Clone, Default)]
pub struct KitCatalog {
    kits: HashMap<ProductId, Vec<KitComponent>>,
}

impl KitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or replace) the kit for `product`
    pub fn define(&mut self, product: impl Into<ProductId>, components: Vec<KitComponent>) {
        self.kits.insert(product.into(), components);
    }

    pub fn with_kit(mut self, product: impl Into<ProductId>, components: Vec<KitComponent>) -> Self {
        self.define(product, components);
        self
    }

    pub fn is_kit(&self, product: &ProductId) -> bool {
        self.kits.get(product).is_some_and(|c| !c.is_empty())
    }

    /// Find a kit definition that reaches back to one of its ancestors
    ///
    /// Returns the product path of the first cycle found, starting and
    /// ending with the same product.
    pub fn find_cycle(&self) -> Option<Vec<ProductId>> {
        let mut done: HashSet<&ProductId> = HashSet::new();
        let mut products: Vec<&ProductId> = self.kits.keys().collect();
        products.sort();

        for start in products {
            if done.contains(start) {
                continue;
            }
            let mut path = vec![start];
            if let Some(cycle) = self.walk(start, &mut path, &mut done) {
                return Some(cycle);
            }
        }
        None
    }

    fn walk<'a>(
        &'a self,
        product: &'a ProductId,
        path: &mut Vec<&'a ProductId>,
        done: &mut HashSet<&'a ProductId>,
    ) -> Option<Vec<ProductId>> {
        for component in self.kits.get(product).into_iter().flatten() {
            let next = &component.product;
            if let Some(pos) = path.iter().position(|p| *p == next) {
                let mut cycle: Vec<ProductId> = path[pos..].iter().map(|p| (*p).clone()).collect();
                cycle.push(next.clone());
                return Some(cycle);
            }
            if done.contains(next) {
                continue;
            }
            path.push(next);
            if let Some(cycle) = self.walk(next, path, done) {
                return Some(cycle);
            }
            path.pop();
        }
        done.insert(product);
        None
    }
}

impl KitDefinitionSource for KitCatalog {
    fn kit_lines_of(&self, product: &ProductId) -> Vec<KitComponent> {
        self.kits.get(product).cloned().unwrap_or_default()
    }
}

/// A kit as written in the catalog file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitDef {
    pub product: ProductId,
    #[serde(default)]
    pub components: Vec<KitComponent>,
}

/// Errors loading or validating a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Yaml(#[from] YamlError),

    #[error("Catalog is invalid:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),
}

/// Units and kit definitions, as stored in `.kit/catalog.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub units: Vec<Unit>,
    pub kits: Vec<KitDef>,
}

impl Catalog {
    /// Parse catalog YAML
    pub fn parse(content: &str, filename: &str) -> Result<Self, CatalogError> {
        Ok(parse_yaml(content, filename)?)
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        Ok(parse_yaml_file(path)?)
    }

    /// Load and validate a catalog file
    pub fn load_validated(path: &Path) -> Result<Self, CatalogError> {
        let catalog = Self::load(path)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn unit_table(&self) -> UnitTable {
        UnitTable::from_units(self.units.iter().cloned())
    }

    pub fn kit_catalog(&self) -> KitCatalog {
        let mut kits = KitCatalog::new();
        for kit in &self.kits {
            kits.define(kit.product.clone(), kit.components.clone());
        }
        kits
    }

    /// Check the catalog for problems, reporting all of them
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut problems = Vec::new();
        let mut seen_units = HashSet::new();

        for unit in &self.units {
            if !seen_units.insert(&unit.id) {
                problems.push(format!("unit '{}' is defined more than once", unit.id));
            }
            if unit.rate <= Decimal::ZERO {
                problems.push(format!("unit '{}' must have a positive rate", unit.id));
            }
            if unit.rounding.is_some_and(|r| r < Decimal::ZERO) {
                problems.push(format!("unit '{}' has a negative rounding", unit.id));
            }
        }

        let mut seen_kits = HashSet::new();
        for kit in &self.kits {
            if !seen_kits.insert(&kit.product) {
                problems.push(format!("kit '{}' is defined more than once", kit.product));
            }
            for component in &kit.components {
                if !seen_units.contains(&component.unit) {
                    problems.push(format!(
                        "kit '{}' uses unknown unit '{}' for '{}'",
                        kit.product, component.unit, component.product
                    ));
                }
                if component.quantity <= Decimal::ZERO {
                    problems.push(format!(
                        "kit '{}' needs a positive quantity of '{}'",
                        kit.product, component.product
                    ));
                }
            }
        }

        if let Some(cycle) = self.kit_catalog().find_cycle() {
            let path: Vec<String> = cycle.iter().map(|p| p.to_string()).collect();
            problems.push(format!("kit definition cycle: {}", path.join(" -> ")));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Invalid(problems))
        }
    }
}

/// Catalog written by `kit init`
pub const EXAMPLE_CATALOG: &str = r#"# Units of measure. Units convert within a category: qty * from.rate / to.rate
units:
  - id: unit
    category: count
    rate: 1
    rounding: 1
  - id: dozen
    category: count
    rate: 12

# Kit definitions: component quantities are per one unit of the kit product
kits:
  - product: desk-kit
    components:
      - product: desk-top
        quantity: 1
        unit: unit
      - product: leg-set
        quantity: 1
        unit: unit
      - product: screw
        quantity: 2
        unit: dozen
  - product: leg-set
    components:
      - product: leg
        quantity: 4
        unit: unit
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_kit_yields_empty() {
        let kits = KitCatalog::new().with_kit(
            "kit",
            vec![KitComponent::new("part", Decimal::ONE, "unit")],
        );
        assert!(kits.kit_lines_of(&"part".into()).is_empty());
        assert_eq!(kits.kit_lines_of(&"kit".into()).len(), 1);
        assert!(kits.is_kit(&"kit".into()));
        assert!(!kits.is_kit(&"part".into()));
    }

    #[test]
    fn test_components_keep_order() {
        let kits = KitCatalog::new().with_kit(
            "kit",
            vec![
                KitComponent::new("c", Decimal::ONE, "unit"),
                KitComponent::new("a", Decimal::ONE, "unit"),
                KitComponent::new("b", Decimal::ONE, "unit"),
            ],
        );
        let names: Vec<String> = kits
            .kit_lines_of(&"kit".into())
            .into_iter()
            .map(|c| c.product.to_string())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_find_cycle_direct() {
        let kits = KitCatalog::new().with_kit(
            "a",
            vec![KitComponent::new("a", Decimal::ONE, "unit")],
        );
        let cycle = kits.find_cycle().unwrap();
        assert_eq!(cycle, vec![ProductId::new("a"), ProductId::new("a")]);
    }

    #[test]
    fn test_find_cycle_transitive() {
        let kits = KitCatalog::new()
            .with_kit("a", vec![KitComponent::new("b", Decimal::ONE, "unit")])
            .with_kit("b", vec![KitComponent::new("c", Decimal::ONE, "unit")])
            .with_kit("c", vec![KitComponent::new("a", Decimal::ONE, "unit")]);
        let cycle = kits.find_cycle().unwrap();
        assert_eq!(cycle.len(), 4);
        assert_eq!(cycle.first(), cycle.last());
    }

    #[test]
    fn test_shared_component_is_not_a_cycle() {
        // Diamond: a -> b -> d, a -> c -> d
        let kits = KitCatalog::new()
            .with_kit(
                "a",
                vec![
                    KitComponent::new("b", Decimal::ONE, "unit"),
                    KitComponent::new("c", Decimal::ONE, "unit"),
                ],
            )
            .with_kit("b", vec![KitComponent::new("d", Decimal::ONE, "unit")])
            .with_kit("c", vec![KitComponent::new("d", Decimal::ONE, "unit")]);
        assert!(kits.find_cycle().is_none());
    }

    #[test]
    fn test_example_catalog_is_valid() {
        let catalog = Catalog::parse(EXAMPLE_CATALOG, "catalog.yaml").unwrap();
        catalog.validate().unwrap();
        assert_eq!(catalog.units.len(), 2);
        assert!(catalog.kit_catalog().is_kit(&"desk-kit".into()));
        assert!(catalog.unit_table().contains(&"dozen".into()));
    }

    #[test]
    fn test_validate_reports_all_problems() {
        let yaml = r#"
units:
  - id: unit
    category: count
    rate: 0
kits:
  - product: a
    components:
      - product: a
        quantity: -1
        unit: box
"#;
        let catalog = Catalog::parse(yaml, "catalog.yaml").unwrap();
        let err = catalog.validate().unwrap_err();
        let CatalogError::Invalid(problems) = err else {
            panic!("expected validation problems");
        };
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.contains("positive rate")));
        assert!(problems.iter().any(|p| p.contains("unknown unit 'box'")));
        assert!(problems.iter().any(|p| p.contains("positive quantity")));
        assert!(problems.iter().any(|p| p.contains("cycle: a -> a")));
    }

    #[test]
    fn test_parse_error_is_yaml_error() {
        let result = Catalog::parse("units: [", "catalog.yaml");
        assert!(matches!(result, Err(CatalogError::Yaml(_))));
    }
}
