//! Output writers for reconstruction reports.
//!
//! This module handles rendering results in various formats:
//! - JSON transaction group reports
//! - Tab-separated concurrency windows
//! - Text summaries of tags, fingerprints and transactions

pub mod json;
pub mod text;

// Re-export main functions
pub use json::{report_to_string, write_report};
pub use text::{concurrency_tsv, format_counts, format_elapsed, transaction_report};
