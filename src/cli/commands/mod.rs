//! CLI command implementations

pub mod check;
pub mod completions;
pub mod init;
pub mod line;
