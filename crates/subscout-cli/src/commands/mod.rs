//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (settings, statement loading, output formats)
//! - `categorize` - Per-transaction categories
//! - `detect` - Recurring-charge detection
//! - `summary` - Totals, savings rate and tips
//! - `categories` - Effective category table

pub mod categories;
pub mod categorize;
pub mod core;
pub mod detect;
pub mod summary;

// Re-export command functions for main.rs
pub use categories::*;
pub use categorize::*;
pub use core::*;
pub use detect::*;
pub use summary::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
