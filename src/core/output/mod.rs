//! Output system for simulation runs.
//!
//! This module provides lifecycle events and formatters for the supported
//! output formats (text, JSON, NDJSON).

mod events;
mod format;

pub use events::{LifecycleEvent, SummaryCounts, SummaryInfo};
pub use format::{OutputFormatter, OutputWriter};
