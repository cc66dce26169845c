//! Loading state definitions from TOML or JSON files.
//!
//! A definitions file lists states as `[[state]]` tables (TOML) or as an
//! array, optionally wrapped in `{"state": [...]}` (JSON):
//!
//! ```toml
//! [[state]]
//! id = "xs"
//! max_width = 767
//! colorbox = false
//!
//! [[state]]
//! id = "print"
//! query = "print"
//! ```
//!
//! `query` wins over the width bounds. Every other key is kept as an extra
//! option that config options can key on.

use crate::core::state::{StateOptions, width_query};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// One state as written in a definitions file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StateDefinition {
    /// The query this definition resolves to, if any.
    pub fn resolved_query(&self) -> Option<String> {
        self.query
            .clone()
            .or_else(|| width_query(self.min_width, self.max_width))
    }

    /// Converts the definition into state options without callbacks.
    ///
    /// Width bounds are carried over as extra fields as well.
    pub fn to_options(&self) -> StateOptions {
        let mut options = StateOptions {
            id: self.id.clone(),
            query: self.resolved_query(),
            extra: self.extra.clone(),
            ..StateOptions::default()
        };
        options.insert_width_bounds(self.min_width, self.max_width);
        options
    }
}

#[derive(Deserialize)]
struct DefinitionsFile {
    #[serde(default)]
    state: Vec<StateDefinition>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDefinitions {
    List(Vec<StateDefinition>),
    Table(DefinitionsFile),
}

/// Parses definitions from TOML text.
pub fn parse_toml(content: &str) -> Result<Vec<StateDefinition>, String> {
    toml::from_str::<DefinitionsFile>(content)
        .map(|file| file.state)
        .map_err(|e| e.to_string())
}

/// Parses definitions from JSON text.
pub fn parse_json(content: &str) -> Result<Vec<StateDefinition>, String> {
    match serde_json::from_str::<JsonDefinitions>(content).map_err(|e| e.to_string())? {
        JsonDefinitions::List(states) => Ok(states),
        JsonDefinitions::Table(file) => Ok(file.state),
    }
}

/// Loads state definitions from `path`.
///
/// Files ending in `.json` are read as JSON, everything else as TOML.
pub fn load_definitions(path: &Path) -> Result<Vec<StateDefinition>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        parse_json(&content)
    } else {
        parse_toml(&content)
    };

    let definitions = parsed.map_err(|message| ConfigError::ParseError {
        path: path.to_path_buf(),
        message,
    })?;
    tracing::debug!(path = %path.display(), count = definitions.len(), "loaded state definitions");
    Ok(definitions)
}

/// The four width breakpoints used when no definitions file is given.
///
/// `xs` and `sm` opt out of the `colorbox` option.
pub fn default_definitions() -> Vec<StateDefinition> {
    let breakpoint = |id: &str, min: Option<u32>, max: Option<u32>, colorbox: Option<bool>| {
        let mut extra = Map::new();
        if let Some(enabled) = colorbox {
            extra.insert("colorbox".to_string(), Value::Bool(enabled));
        }
        StateDefinition {
            id: Some(id.to_string()),
            query: None,
            min_width: min,
            max_width: max,
            extra,
        }
    };

    vec![
        breakpoint("xs", None, Some(767), Some(false)),
        breakpoint("sm", Some(768), Some(991), Some(false)),
        breakpoint("md", Some(992), Some(1199), None),
        breakpoint("lg", Some(1200), None, None),
    ]
}
