//! Kitting: kit explosion for order lines
//!
//! Keeps composite-product lines ("kits") decomposed into a tree of
//! component lines, and keeps that tree in step as the top-level line is
//! created, edited, or deleted.

pub mod cli;
pub mod core;
pub mod logging;
pub mod yaml;
