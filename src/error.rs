//! Unified error handling for the responsive-states library.
//!
//! Errors are grouped by the layer that raises them and collected into
//! [`ResponsiveError`] through `From` conversions.
//!
//! ## Error Categories
//!
//! - [`StateError`]: Errors from the state manager and its collaborators
//! - [`QueryError`]: Errors from parsing media query strings
//! - [`ConfigError`]: Errors from configuration and state definition loading
//!
//! A state that fails a `once` config option is *not* an error: it is
//! reported through [`State::is_valid`](crate::core::state::State::is_valid).
//! Lookups for unknown ids return `None`/`false` instead of failing.
//!
//! ## Example
//!
//! ```rust
//! use responsive_states::error::{ResponsiveError, StateError};
//!
//! fn example() -> Result<(), ResponsiveError> {
//!     Err(StateError::InvalidCallback)?;
//!     Ok(())
//! }
//!
//! assert!(example().is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the responsive-states library.
#[derive(Error, Debug)]
pub enum ResponsiveError {
    /// An error raised by the state manager.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// A media query could not be parsed.
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// An error occurred while loading configuration or state definitions.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A generic error for cases not covered by specific error types.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Errors raised by [`StateManager`](crate::core::state::StateManager) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// `state_change` was given something that cannot be called.
    #[error("Not a function: state change notifier must be a callback")]
    InvalidCallback,

    /// The resize debouncer needs a tokio runtime to schedule its timer.
    #[error("No tokio runtime available for the resize debouncer: {message}")]
    NoRuntime {
        /// Message from the runtime lookup.
        message: String,
    },
}

/// Errors produced while parsing a media query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The query (or one of its comma separated parts) was empty.
    #[error("Empty media query")]
    Empty,

    /// The media type is not one of the supported types.
    #[error("Unsupported media type '{media_type}'")]
    UnsupportedMediaType {
        /// The rejected media type.
        media_type: String,
    },

    /// A feature expression was malformed or names an unsupported feature.
    #[error("Invalid media feature '{feature}'")]
    InvalidFeature {
        /// The rejected feature expression.
        feature: String,
    },

    /// A length value could not be parsed.
    #[error("Invalid length '{value}' for {feature}")]
    InvalidLength {
        /// The feature the length belongs to.
        feature: String,
        /// The rejected length text.
        value: String,
    },
}

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration or state definitions file.
    #[error("Failed to read {path}: {message}")]
    FileReadError {
        /// Path to the file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to parse a configuration or state definitions file.
    #[error("Failed to parse {path}: {message}")]
    ParseError {
        /// Path to the file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// An invalid value was provided for a configuration field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Name of the field with invalid value.
        field: String,
        /// Description of why the value is invalid.
        message: String,
    },
}

/// Type alias for Results using ResponsiveError.
pub type ResponsiveResult<T> = std::result::Result<T, ResponsiveError>;
