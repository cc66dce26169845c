//! Configuration and result types for simulation runs.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;

use crate::core::ExitCode;
use crate::core::config_option::{ConfigOption, Phase};
use crate::core::definitions::StateDefinition;
use crate::models::OutputFormat;
use crate::viewport::Viewport;

/// A config option requested on the command line as `NAME[=PHASE]`.
///
/// The generated predicate passes when the state's option value is truthy:
/// anything except `false`, `null`, `0` and the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRule {
    pub name: String,
    pub when: Phase,
}

impl OptionRule {
    pub fn new(name: impl Into<String>, when: Phase) -> Self {
        Self {
            name: name.into(),
            when,
        }
    }

    /// Builds the config option enforcing this rule.
    pub fn to_config_option(&self) -> ConfigOption {
        let name = self.name.clone();
        ConfigOption::new(self.name.clone(), self.when, move |state| {
            state.option(&name).is_some_and(is_truthy)
        })
    }
}

impl FromStr for OptionRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, phase) = match s.split_once('=') {
            Some((name, phase)) => (name.trim(), phase.trim().parse()?),
            None => (s.trim(), Phase::default()),
        };
        if name.is_empty() {
            return Err(format!("missing option name in '{}'", s));
        }
        Ok(Self::new(name, phase))
    }
}

impl fmt::Display for OptionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.when)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// States to register, in definition order.
    pub definitions: Vec<StateDefinition>,
    /// Config options registered before any state.
    pub rules: Vec<OptionRule>,
    /// Viewport the states are registered against.
    pub initial: Viewport,
    /// Viewports to resize to, in order.
    pub steps: Vec<Viewport>,
    /// Quiet period of the manager's resize debouncer.
    pub resize_debounce: Duration,
    /// Output format (text, json, ndjson).
    pub output_format: OutputFormat,
    /// Whether to suppress resize notifications in text output.
    pub quiet: bool,
}

/// Result of a simulation run.
#[derive(Debug)]
pub struct RunResult {
    /// Exit code for the run.
    pub exit_code: ExitCode,
    /// Optional message to display.
    pub message: Option<String>,
}

impl RunResult {
    pub fn success() -> Self {
        Self {
            exit_code: ExitCode::Success,
            message: None,
        }
    }

    pub fn error(code: ExitCode, message: impl Into<String>) -> Self {
        Self {
            exit_code: code,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.exit_code, ExitCode::Success)
    }
}
