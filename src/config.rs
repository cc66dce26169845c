//! Configuration management for responsive-states.
//!
//! Settings are resolved from, in increasing precedence:
//! - built-in defaults
//! - a TOML file in the XDG config directory
//!   (`$XDG_CONFIG_HOME/responsive-states/config.toml`)
//! - `RESPONSIVE_STATES_*` environment variables
//! - command line arguments
//!
//! ## Example
//!
//! ```rust,no_run
//! use responsive_states::Config;
//!
//! let config = Config::load_from_file()
//!     .unwrap()
//!     .merge(Config::load_from_env());
//! println!("debounce: {}ms", config.resize_debounce_ms());
//! ```

use crate::{
    core::definitions::{StateDefinition, default_definitions, load_definitions},
    models::SimulateArgs,
    parsed_property::ParsedProperty,
    utils::debounce::DEFAULT_WAIT,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_INITIAL_WIDTH: u32 = 1280;
const DEFAULT_INITIAL_HEIGHT: u32 = 800;

/// Raw shape of the TOML configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    pub resize_debounce_ms: Option<u64>,
    pub initial_width: Option<u32>,
    pub initial_height: Option<u32>,
    pub states_file: Option<String>,
}

/// Settings assembled from CLI arguments, environment variables, config file, and defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Quiet period before a burst of resize signals reaches the states.
    pub resize_debounce_ms: Option<ParsedProperty<u64>>,
    /// Width of the simulated viewport before any step.
    pub initial_width: Option<ParsedProperty<u32>>,
    /// Height of the simulated viewport, also used by steps without one.
    pub initial_height: Option<ParsedProperty<u32>>,
    /// State definitions file; the built-in breakpoints are used without one.
    pub states_file: Option<ParsedProperty<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resize_debounce_ms: Some(ParsedProperty::Default(DEFAULT_WAIT.as_millis() as u64)),
            initial_width: Some(ParsedProperty::Default(DEFAULT_INITIAL_WIDTH)),
            initial_height: Some(ParsedProperty::Default(DEFAULT_INITIAL_HEIGHT)),
            states_file: None,
        }
    }
}

impl Config {
    /// A config with no value from any source.
    pub fn empty() -> Self {
        Self {
            resize_debounce_ms: None,
            initial_width: None,
            initial_height: None,
            states_file: None,
        }
    }

    /// Load configuration from the XDG config directory.
    ///
    /// A missing file yields the defaults.
    #[must_use = "this returns the loaded configuration which should be used"]
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Ok(Self::default().merge(Self::load_from_path(&config_path)?))
    }

    /// Load only the values present in the TOML file at `config_path`.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config_file: ConfigFile = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        let path = config_path.to_path_buf();
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(Self {
            resize_debounce_ms: config_file
                .resize_debounce_ms
                .map(|v| ParsedProperty::File(v, path.clone(), v.to_string())),
            initial_width: config_file
                .initial_width
                .map(|v| ParsedProperty::File(v, path.clone(), v.to_string())),
            initial_height: config_file
                .initial_height
                .map(|v| ParsedProperty::File(v, path.clone(), v.to_string())),
            states_file: config_file
                .states_file
                .map(|v| ParsedProperty::File(v.clone(), path.clone(), v)),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn load_from_env() -> Self {
        Self {
            resize_debounce_ms: env_number("RESPONSIVE_STATES_RESIZE_DEBOUNCE_MS"),
            initial_width: env_number("RESPONSIVE_STATES_INITIAL_WIDTH"),
            initial_height: env_number("RESPONSIVE_STATES_INITIAL_HEIGHT"),
            states_file: std::env::var("RESPONSIVE_STATES_STATES_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| ParsedProperty::Env(v.clone(), v)),
        }
    }

    /// Build a Config from `simulate` arguments.
    pub fn from_simulate_args(args: &SimulateArgs) -> Self {
        Self {
            resize_debounce_ms: args
                .debounce_ms
                .map(|v| ParsedProperty::Cli(v, v.to_string())),
            initial_width: args
                .initial_width
                .map(|v| ParsedProperty::Cli(v, v.to_string())),
            initial_height: args.height.map(|v| ParsedProperty::Cli(v, v.to_string())),
            states_file: args
                .states
                .as_ref()
                .map(|v| ParsedProperty::Cli(v.clone(), v.clone())),
        }
    }

    /// Resolve configuration from every source, CLI arguments last.
    pub fn resolve(cli: Self) -> Result<Self> {
        Ok(Self::load_from_file()?
            .merge(Self::load_from_env())
            .merge(cli))
    }

    /// Get the XDG config file path, creating its directory if needed.
    pub fn get_config_path() -> Result<PathBuf> {
        // Use XDG_CONFIG_HOME if set, otherwise ~/.config
        let config_dir = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config"),
        };

        let app_config_dir = config_dir.join("responsive-states");
        if !app_config_dir.exists() {
            fs::create_dir_all(&app_config_dir).with_context(|| {
                format!(
                    "Failed to create config directory: {}",
                    app_config_dir.display()
                )
            })?;
        }

        Ok(app_config_dir.join("config.toml"))
    }

    /// Merge this config with another, preferring values from other when they exist
    pub fn merge(self, other: Self) -> Self {
        Self {
            resize_debounce_ms: other.resize_debounce_ms.or(self.resize_debounce_ms),
            initial_width: other.initial_width.or(self.initial_width),
            initial_height: other.initial_height.or(self.initial_height),
            states_file: other.states_file.or(self.states_file),
        }
    }

    pub fn resize_debounce_ms(&self) -> u64 {
        self.resize_debounce_ms
            .as_deref()
            .copied()
            .unwrap_or(DEFAULT_WAIT.as_millis() as u64)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms())
    }

    pub fn initial_width(&self) -> u32 {
        self.initial_width
            .as_deref()
            .copied()
            .unwrap_or(DEFAULT_INITIAL_WIDTH)
    }

    pub fn initial_height(&self) -> u32 {
        self.initial_height
            .as_deref()
            .copied()
            .unwrap_or(DEFAULT_INITIAL_HEIGHT)
    }

    /// Load the configured state definitions, or the built-in breakpoints.
    ///
    /// A relative `states_file` from the config file is resolved against the
    /// config file's directory.
    pub fn load_definitions(&self) -> Result<Vec<StateDefinition>> {
        let Some(states_file) = &self.states_file else {
            return Ok(default_definitions());
        };

        let path = match states_file {
            ParsedProperty::File(value, config_path, _) if Path::new(value).is_relative() => {
                config_path
                    .parent()
                    .map(|dir| dir.join(value))
                    .unwrap_or_else(|| PathBuf::from(value))
            }
            other => PathBuf::from(other.value()),
        };

        load_definitions(&path).with_context(|| {
            format!(
                "Failed to load state definitions ({})",
                states_file.describe_source()
            )
        })
    }

    /// Create a sample config file for user reference.
    ///
    /// An existing file is left untouched. Returns the file's path.
    #[must_use = "this operation can fail and the result should be checked"]
    pub fn create_sample_config() -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;

        // Don't overwrite existing config
        if config_path.exists() {
            return Ok(config_path);
        }

        let sample_config = r#"# responsive-states configuration file
# Location: $XDG_CONFIG_HOME/responsive-states/config.toml (defaults to ~/.config)
# Every value can be overridden with a RESPONSIVE_STATES_* environment variable
# or a command line flag.

# Quiet period in milliseconds before a burst of resizes reaches the states
resize_debounce_ms = 25

# Simulated viewport size before the first resize step
initial_width = 1280
initial_height = 800

# State definitions (.toml or .json), relative to this file.
# Without it the xs/sm/md/lg breakpoints are used.
# states_file = "states.toml"
"#;

        fs::write(&config_path, sample_config).with_context(|| {
            format!(
                "Failed to write sample config to: {}",
                config_path.display()
            )
        })?;

        tracing::info!(path = %config_path.display(), "sample config created");
        Ok(config_path)
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<ParsedProperty<T>> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(ParsedProperty::Env(value, raw)),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring non-numeric environment value");
            None
        }
    }
}
