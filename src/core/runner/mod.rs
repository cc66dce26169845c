//! Runner for viewport simulations.
//!
//! - `traits.rs` - Run configuration, option rules and results
//! - `simulation.rs` - Drives a state manager and reports lifecycle events

pub mod simulation;
pub mod traits;

pub use simulation::SimulationRunner;
pub use traits::{OptionRule, RunResult, SimulationConfig};

// Re-export OutputFormat from models for convenience
pub use crate::models::OutputFormat;
