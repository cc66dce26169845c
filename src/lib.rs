//! # Responsive States
//!
//! Tracks which responsive "states" (named breakpoints backed by media
//! queries) are active and runs their lifecycle callbacks as the viewport
//! changes:
//!
//! - enter, leave and first-run callbacks when a state's query flips
//! - debounced resize callbacks for the active states
//! - config options that gate construction, entering and resizing
//! - a simulated viewport and a CLI that drives it
//!
//! ## Quick Start
//!
//! ```rust
//! use responsive_states::{SimulatedViewport, StateManager, StateOptions};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> responsive_states::Result<()> {
//! let viewport = Arc::new(SimulatedViewport::new(1024, 768));
//! let manager = StateManager::new(viewport.clone(), viewport.clone())?;
//!
//! manager.add_state(
//!     StateOptions::new()
//!         .id("desktop")
//!         .width_range(Some(992), None)
//!         .on_enter(|| println!("desktop layout"))
//!         .on_leave(|| println!("leaving desktop layout")),
//! );
//!
//! assert!(manager.is_active("desktop"));
//! viewport.resize(600, 768);
//! assert!(!manager.is_active("desktop"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod models;
pub mod parsed_property;
pub mod utils;
pub mod viewport;

// Re-export commonly used types for convenience
pub use config::Config;
pub use crate::core::config_option::{ConfigOption, ConfigOptionRegistry, Phase};
pub use crate::core::media::{MediaQueryEvaluator, ResizeSource, SubscriptionToken};
pub use crate::core::state::{ManagerSettings, State, StateManager, StateOptions};
pub use error::{ResponsiveError, StateError};
pub use viewport::SimulatedViewport;

/// Core result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
