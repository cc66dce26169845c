//! Pluggable validation predicates shared by every state of a manager.
//!
//! A [`ConfigOption`] names a field that states may carry in their options
//! (for example `colorbox`). A state that defines a field with that name opts
//! into the rule, and the predicate then gates one [`Phase`] of the state's
//! lifecycle:
//!
//! - [`Phase::Once`]: checked at construction, a failure makes the state
//!   permanently invalid
//! - [`Phase::Match`]: checked every time the query starts matching, a failure
//!   keeps the state from entering
//! - [`Phase::Resize`]: checked on every dispatched resize, a failure skips the
//!   resize callbacks
//!
//! ## Example
//!
//! ```rust
//! use responsive_states::core::config_option::{ConfigOption, ConfigOptionRegistry, Phase};
//!
//! let registry = ConfigOptionRegistry::new();
//! let accepted = registry.add(ConfigOption::new("colorbox", Phase::Match, |state| {
//!     state.option("colorbox").and_then(|v| v.as_bool()).unwrap_or(true)
//! }));
//! assert!(accepted);
//! assert!(registry.get("colorbox").is_some());
//! ```

use crate::core::state::State;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

/// Predicate run against a state to decide whether a transition is allowed.
pub type Predicate = Arc<dyn Fn(&State) -> bool + Send + Sync>;

/// Lifecycle phase gated by a config option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Checked once at construction; gates validity.
    Once,
    /// Checked whenever the query starts matching; gates entering.
    Match,
    /// Checked on every dispatched resize; gates the resize callbacks.
    #[default]
    Resize,
}

impl Phase {
    /// Returns the lowercase name used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Once => "once",
            Phase::Match => "match",
            Phase::Resize => "resize",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "once" => Ok(Phase::Once),
            "match" => Ok(Phase::Match),
            "resize" => Ok(Phase::Resize),
            other => Err(format!(
                "unknown phase '{}', expected once, match or resize",
                other
            )),
        }
    }
}

/// A named predicate gating one lifecycle phase.
#[derive(Clone, Default)]
pub struct ConfigOption {
    /// Name of the state option field that opts a state into this rule.
    pub name: String,
    /// The predicate. Options without one are rejected by the registry.
    pub test: Option<Predicate>,
    /// The phase this option gates.
    pub when: Phase,
}

impl ConfigOption {
    /// Creates a config option with a predicate.
    pub fn new<F>(name: impl Into<String>, when: Phase, test: F) -> Self
    where
        F: Fn(&State) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            test: Some(Arc::new(test)),
            when,
        }
    }

    /// Returns whether the registry would accept this option.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && self.test.is_some()
    }
}

impl fmt::Debug for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOption")
            .field("name", &self.name)
            .field("when", &self.when)
            .field("has_test", &self.test.is_some())
            .finish()
    }
}

/// Ordered table of config options shared by a manager and all its states.
///
/// Cloning the registry yields another handle onto the same table.
#[derive(Clone, Default)]
pub struct ConfigOptionRegistry {
    options: Arc<RwLock<Vec<ConfigOption>>>,
}

impl ConfigOptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `option`.
    ///
    /// Options with an empty name or no predicate are ignored; the return
    /// value tells whether the option was stored.
    pub fn add(&self, option: ConfigOption) -> bool {
        if !option.is_complete() {
            tracing::debug!(name = %option.name, "ignoring incomplete config option");
            return false;
        }

        tracing::debug!(name = %option.name, when = %option.when, "adding config option");
        self.options
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(option);
        true
    }

    /// Removes every option called `name`, returning how many were removed.
    pub fn remove(&self, name: &str) -> usize {
        let mut options = self.options.write().unwrap_or_else(PoisonError::into_inner);
        let before = options.len();
        options.retain(|option| option.name != name);
        before - options.len()
    }

    /// Returns the most recently added option called `name`.
    pub fn get(&self, name: &str) -> Option<ConfigOption> {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|option| option.name == name)
            .cloned()
    }

    /// Returns a snapshot of every option in registration order.
    pub fn all(&self) -> Vec<ConfigOption> {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every `phase` predicate that applies to `state`.
    ///
    /// An option applies when the state's options contain a field with the
    /// option's name. The first failing predicate short-circuits to `false`;
    /// with no applicable option the phase passes.
    pub fn evaluate(&self, phase: Phase, state: &State) -> bool {
        // Predicates run without the lock so they may inspect the registry.
        let applicable: Vec<(String, Predicate)> = self
            .options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|option| option.when == phase && state.has_option(&option.name))
            .filter_map(|option| {
                option
                    .test
                    .as_ref()
                    .map(|test| (option.name.clone(), Arc::clone(test)))
            })
            .collect();

        for (name, test) in applicable {
            if !test(state) {
                tracing::trace!(state = %state.id(), option = %name, %phase, "config option failed");
                return false;
            }
        }
        true
    }
}

impl fmt::Debug for ConfigOptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.all()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{ChangeNotifier, StateOptions};
    use crate::viewport::SimulatedViewport;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn build_state(registry: &ConfigOptionRegistry, options: StateOptions) -> State {
        let viewport = Arc::new(SimulatedViewport::new(1024, 768));
        State::new(options, registry.clone(), ChangeNotifier::default(), viewport)
    }

    /// # Incomplete Options Are Ignored
    ///
    /// ## Expected Outcome
    /// - Empty names and missing predicates are rejected without error
    #[test]
    fn test_add_rejects_incomplete_options() {
        let registry = ConfigOptionRegistry::new();

        assert!(!registry.add(ConfigOption::new("", Phase::Match, |_| true)));
        assert!(!registry.add(ConfigOption {
            name: "colorbox".to_string(),
            test: None,
            when: Phase::Match,
        }));
        assert!(registry.is_empty());

        assert!(registry.add(ConfigOption::new("colorbox", Phase::Match, |_| true)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_drops_every_entry_with_name() {
        let registry = ConfigOptionRegistry::new();
        registry.add(ConfigOption::new("a", Phase::Once, |_| true));
        registry.add(ConfigOption::new("b", Phase::Match, |_| true));
        registry.add(ConfigOption::new("a", Phase::Resize, |_| true));

        assert_eq!(registry.remove("a"), 2);
        assert_eq!(registry.remove("missing"), 0);
        let names: Vec<_> = registry.all().into_iter().map(|o| o.name).collect();
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn test_get_returns_last_registered() {
        let registry = ConfigOptionRegistry::new();
        registry.add(ConfigOption::new("a", Phase::Once, |_| true));
        registry.add(ConfigOption::new("a", Phase::Resize, |_| true));

        assert_eq!(registry.get("a").map(|o| o.when), Some(Phase::Resize));
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn test_clones_share_the_table() {
        let registry = ConfigOptionRegistry::new();
        let handle = registry.clone();
        handle.add(ConfigOption::new("shared", Phase::Match, |_| true));
        assert_eq!(registry.len(), 1);
    }

    /// # Evaluation Only Runs Applicable Predicates
    ///
    /// ## Test Scenario
    /// - Registers failing predicates for a field the state lacks and for
    ///   another phase
    ///
    /// ## Expected Outcome
    /// - Neither affects the phase under evaluation
    /// - A predicate for a present field runs and decides the outcome
    #[test]
    fn test_evaluate_matches_field_and_phase() {
        let registry = ConfigOptionRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        registry.add(ConfigOption::new("absent", Phase::Match, |_| false));
        registry.add(ConfigOption::new("colorbox", Phase::Resize, |_| false));
        let counter = Arc::clone(&calls);
        registry.add(ConfigOption::new("colorbox", Phase::Match, move |state| {
            counter.fetch_add(1, Ordering::SeqCst);
            state.option("colorbox") == Some(&json!(true))
        }));

        let enabled = build_state(
            &registry,
            StateOptions::new().id("on").option("colorbox", true),
        );
        let disabled = build_state(
            &registry,
            StateOptions::new().id("off").option("colorbox", false),
        );
        let plain = build_state(&registry, StateOptions::new().id("plain"));
        calls.store(0, Ordering::SeqCst);

        assert!(registry.evaluate(Phase::Match, &enabled));
        assert!(!registry.evaluate(Phase::Match, &disabled));
        assert!(registry.evaluate(Phase::Match, &plain));
        assert!(!registry.evaluate(Phase::Resize, &enabled));
        assert!(registry.evaluate(Phase::Once, &enabled));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_evaluate_short_circuits_on_first_failure() {
        let registry = ConfigOptionRegistry::new();
        let later_calls = Arc::new(AtomicUsize::new(0));

        registry.add(ConfigOption::new("flag", Phase::Resize, |_| false));
        let counter = Arc::clone(&later_calls);
        registry.add(ConfigOption::new("flag", Phase::Resize, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }));

        let state = build_state(&registry, StateOptions::new().option("flag", 1));
        assert!(!registry.evaluate(Phase::Resize, &state));
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_phase_parsing() {
        assert_eq!("once".parse::<Phase>(), Ok(Phase::Once));
        assert_eq!("MATCH".parse::<Phase>(), Ok(Phase::Match));
        assert_eq!("resize".parse::<Phase>(), Ok(Phase::Resize));
        assert!("enter".parse::<Phase>().is_err());
        assert_eq!(Phase::default(), Phase::Resize);
        assert_eq!(Phase::Match.to_string(), "match");
    }
}
