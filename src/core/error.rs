//! Errors raised by the kit tree manager

use miette::Diagnostic;
use thiserror::Error;

use crate::core::identity::{LineId, ProductId};
use crate::core::store::StoreError;
use crate::core::units::ConversionError;

/// Errors from kit tree operations
///
/// Any of these aborts the whole triggering mutation; the store transaction
/// is rolled back before the error reaches the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum KitError {
    #[error("Line not found: {0}")]
    #[diagnostic(code(kit::not_found))]
    NotFound(LineId),

    #[error("Kit definition of '{product}' is cyclic: {}", display_path(.path))]
    #[diagnostic(
        code(kit::cyclic_definition),
        help("remove '{product}' from its own component list, directly or through a sub-kit")
    )]
    CyclicKitDefinition {
        product: ProductId,
        path: Vec<ProductId>,
    },

    #[error("Kit explosion of '{product}' exceeds the maximum depth of {max_depth}")]
    #[diagnostic(
        code(kit::max_depth),
        help("raise max_depth in .kit/config.yaml if the nesting is intended")
    )]
    MaxDepthExceeded { max_depth: u32, product: ProductId },

    #[error(transparent)]
    #[diagnostic(code(kit::conversion))]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    #[diagnostic(code(kit::store))]
    Store(#[from] StoreError),

    #[error("Line {id} is a kit component and cannot be {operation} directly")]
    #[diagnostic(
        code(kit::component_line),
        help("change or delete the root line of its kit instead")
    )]
    ComponentLine { id: LineId, operation: &'static str },
}

fn display_path(path: &[ProductId]) -> String {
    path.iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
