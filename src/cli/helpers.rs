//! Shared helper functions for CLI commands

use miette::Result;
use std::io::{self, BufRead, IsTerminal};

use crate::core::identity::LineId;

/// Format a LineId for display, truncating if too long
///
/// Line ids are 31 characters; tables show the first 13 with a "..." suffix.
pub fn format_short_id(id: &LineId) -> String {
    truncate_str(&id.to_string(), 16)
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// Read line ids from stdin if it is piped
///
/// Returns `None` when stdin is a terminal. This enables pipelines like:
/// ```bash
/// kit line list --product desk-kit --format id | kit line rm
/// ```
pub fn read_ids_from_stdin() -> Option<Vec<String>> {
    let stdin = io::stdin();

    if stdin.is_terminal() {
        return None;
    }

    let ids: Vec<String> = stdin
        .lock()
        .lines()
        .map_while(|line| line.ok())
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}

/// Parse line ids given on the command line, falling back to stdin
pub fn collect_line_ids(args: &[String]) -> Result<Vec<LineId>> {
    let raw = if args.is_empty() {
        read_ids_from_stdin().unwrap_or_default()
    } else {
        args.to_vec()
    };

    if raw.is_empty() {
        return Err(miette::miette!("No line ids given"));
    }

    raw.iter()
        .map(|s| s.parse::<LineId>().map_err(|e| miette::miette!("{}", e)))
        .collect()
}
