//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use rust_decimal::Decimal;
use tempfile::TempDir;

use kitting::core::{
    KitCatalog, KitComponent, KitConfig, KitTreeManager, LineId, LineStore, ProductId, Unit,
    UnitTable,
};

pub type Manager<S> = KitTreeManager<S, UnitTable, KitCatalog>;

/// Helper to get a kit command
pub fn kit() -> Command {
    Command::new(cargo::cargo_bin!("kit"))
}

/// Helper to create a workspace in a temp directory
pub fn setup_test_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    kit().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Helper to create a line through the CLI and return its id
pub fn create_test_line(tmp: &TempDir, product: &str, quantity: &str) -> String {
    let output = kit()
        .current_dir(tmp.path())
        .args([
            "line",
            "new",
            "--product",
            product,
            "--quantity",
            quantity,
            "--format",
            "id",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "line new failed: {:?}", output);

    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn units() -> UnitTable {
    UnitTable::from_units([
        Unit::new("unit", "count", Decimal::ONE),
        Unit::new("dozen", "count", Decimal::from(12)),
        Unit::new("kg", "mass", Decimal::ONE),
        Unit::new("g", "mass", dec("0.001")),
    ])
}

fn c(product: &str, quantity: &str, unit: &str) -> KitComponent {
    KitComponent::new(product, dec(quantity), unit)
}

/// Kit definitions used across tests
///
/// - `bundle`: 3 components, two of them kits with 2 + 3 components
/// - `desk-kit`: desk-top, leg-set (a kit of legs), screws by the dozen
/// - `loop-a` / `loop-b`: a transitive cycle; `self-kit` contains itself
/// - `heavy-kit`: a component measured in kg, not convertible to unit
pub fn catalog() -> KitCatalog {
    KitCatalog::new()
        .with_kit(
            "bundle",
            vec![c("pack-a", "1", "unit"), c("pack-b", "2", "unit"), c("manual", "1", "unit")],
        )
        .with_kit("pack-a", vec![c("widget", "2", "unit"), c("gadget", "1", "unit")])
        .with_kit(
            "pack-b",
            vec![c("bolt", "4", "unit"), c("nut", "4", "unit"), c("washer", "8", "unit")],
        )
        .with_kit(
            "desk-kit",
            vec![c("desk-top", "1", "unit"), c("leg-set", "1", "unit"), c("screw", "2", "dozen")],
        )
        .with_kit("leg-set", vec![c("leg", "4", "unit")])
        .with_kit("loop-a", vec![c("loop-b", "1", "unit")])
        .with_kit("loop-b", vec![c("rivet", "1", "unit"), c("loop-a", "1", "unit")])
        .with_kit("self-kit", vec![c("self-kit", "1", "unit")])
        .with_kit("heavy-kit", vec![c("sand", "5", "kg")])
}

pub fn manager<S: LineStore>(store: S) -> Manager<S> {
    KitTreeManager::new(store, units(), catalog(), KitConfig::default())
}

pub fn manager_with<S: LineStore>(store: S, config: KitConfig) -> Manager<S> {
    KitTreeManager::new(store, units(), catalog(), config)
}

/// Products of the descendants of `id`, in walk order
pub fn descendant_products<S: LineStore>(m: &Manager<S>, id: &LineId) -> Vec<ProductId> {
    m.list_descendants(id)
        .unwrap()
        .iter()
        .map(|d| m.get_line(d).unwrap().product)
        .collect()
}
