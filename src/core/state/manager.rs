//! State manager for responsive states.
//!
//! This module provides [`StateManager`], which owns the ordered collection
//! of states, the config option registry they share, the single change
//! notifier, and the debounced resize subscription.

use super::{Callback, ChangeNotifier, State, StateOptions};
use crate::core::config_option::{ConfigOption, ConfigOptionRegistry};
use crate::core::media::{MediaQueryEvaluator, ResizeListener, ResizeSource, SubscriptionToken};
use crate::error::StateError;
use crate::utils::debounce::{DEFAULT_WAIT, Debouncer};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Tunables for a [`StateManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Quiet period before a burst of resize signals is dispatched.
    pub resize_debounce: Duration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            resize_debounce: DEFAULT_WAIT,
        }
    }
}

type StateList = Arc<Mutex<Vec<State>>>;

/// Tracks responsive states and dispatches their lifecycle callbacks.
///
/// States enter and leave on their own as their queries flip; the manager
/// keeps them in order, answers lookups, and forwards debounced resize
/// signals to the active ones.
///
/// # Ordering
///
/// [`add_states`](Self::add_states) inserts in reverse input order, and
/// [`get_state`](Self::get_state) scans from the end, so with duplicate ids the
/// most recently pushed state wins.
///
/// # Example
///
/// ```rust
/// use responsive_states::{SimulatedViewport, StateManager, StateOptions};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let viewport = Arc::new(SimulatedViewport::new(800, 600));
/// let manager = StateManager::new(viewport.clone(), viewport.clone())?;
///
/// manager.add_states(vec![
///     StateOptions::new().id("xs").width_range(None, Some(767)),
///     StateOptions::new().id("sm").width_range(Some(768), Some(991)),
/// ]);
///
/// assert!(manager.is_active("sm"));
/// viewport.resize(500, 600);
/// assert!(manager.is_active("xs"));
/// # Ok(())
/// # }
/// ```
pub struct StateManager {
    states: StateList,
    registry: ConfigOptionRegistry,
    notifier: ChangeNotifier,
    evaluator: Arc<dyn MediaQueryEvaluator>,
    resize_source: Arc<dyn ResizeSource>,
    resize_token: SubscriptionToken,
    debouncer: Arc<Debouncer>,
}

impl StateManager {
    /// Creates a manager with the default 25ms resize debounce.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NoRuntime`] when called outside a tokio runtime.
    pub fn new(
        evaluator: Arc<dyn MediaQueryEvaluator>,
        resize_source: Arc<dyn ResizeSource>,
    ) -> Result<Self, StateError> {
        Self::with_settings(evaluator, resize_source, ManagerSettings::default())
    }

    /// Creates a manager and binds its debounced resize subscription.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NoRuntime`] when called outside a tokio runtime.
    pub fn with_settings(
        evaluator: Arc<dyn MediaQueryEvaluator>,
        resize_source: Arc<dyn ResizeSource>,
        settings: ManagerSettings,
    ) -> Result<Self, StateError> {
        let states: StateList = Arc::new(Mutex::new(Vec::new()));

        let weak_states: Weak<Mutex<Vec<State>>> = Arc::downgrade(&states);
        let debouncer = Arc::new(Debouncer::new(settings.resize_debounce, move || {
            if let Some(states) = weak_states.upgrade() {
                dispatch_resize(&states);
            }
        })?);

        let signal = Arc::clone(&debouncer);
        let listener: ResizeListener = Arc::new(move || signal.call());
        let resize_token = resize_source.subscribe(listener);
        tracing::debug!(
            token = %resize_token,
            debounce_ms = settings.resize_debounce.as_millis() as u64,
            "state manager bound to resize source"
        );

        Ok(Self {
            states,
            registry: ConfigOptionRegistry::new(),
            notifier: ChangeNotifier::default(),
            evaluator,
            resize_source,
            resize_token,
            debouncer,
        })
    }

    /// Builds a state from `options` and keeps it if it is valid.
    ///
    /// The state is returned either way so callers can check
    /// [`State::is_valid`].
    pub fn add_state(&self, options: StateOptions) -> State {
        // Construction may fire callbacks, so it runs without the list lock.
        let state = State::new(
            options,
            self.registry.clone(),
            self.notifier.clone(),
            Arc::clone(&self.evaluator),
        );

        if state.is_valid() {
            tracing::debug!(state = %state.id(), query = %state.query(), active = state.is_active(), "state added");
            self.lock_states().push(state.clone());
        }

        state
    }

    /// Adds every definition, iterating from the last to the first.
    pub fn add_states(&self, options: Vec<StateOptions>) -> &Self {
        for options in options.into_iter().rev() {
            self.add_state(options);
        }
        self
    }

    /// Returns the most recently pushed state with `id`.
    pub fn get_state(&self, id: &str) -> Option<State> {
        self.lock_states()
            .iter()
            .rev()
            .find(|state| state.id() == id)
            .cloned()
    }

    /// Whether the state `id` is active; `false` for unknown ids.
    pub fn is_active(&self, id: &str) -> bool {
        self.get_state(id).is_some_and(|state| state.is_active())
    }

    /// Returns every state in collection order.
    pub fn get_states(&self) -> Vec<State> {
        self.lock_states().clone()
    }

    /// Looks up each id, keeping positions; unknown ids map to `None`.
    pub fn get_states_by_id<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Option<State>> {
        ids.iter().map(|id| self.get_state(id.as_ref())).collect()
    }

    /// Returns the active states in collection order.
    pub fn current_states(&self) -> Vec<State> {
        active_states(&self.states)
    }

    /// Destroys and removes every state with `id`.
    pub fn remove_state(&self, id: &str) -> &Self {
        let removed: Vec<State> = {
            let mut states = self.lock_states();
            let (removed, kept) = std::mem::take(&mut *states)
                .into_iter()
                .partition(|state| state.id() == id);
            *states = kept;
            removed
        };

        for state in &removed {
            state.destroy();
        }
        tracing::debug!(state = %id, removed = removed.len(), "state removed");
        self
    }

    /// Removes the states for each id, iterating from the last id.
    pub fn remove_states<S: AsRef<str>>(&self, ids: &[S]) -> &Self {
        for id in ids.iter().rev() {
            self.remove_state(id.as_ref());
        }
        self
    }

    /// Destroys every state, then empties the collection.
    pub fn remove_all_states(&self) {
        let states = std::mem::take(&mut *self.lock_states());
        for state in states.iter().rev() {
            state.destroy();
        }
        tracing::debug!(removed = states.len(), "all states removed");
    }

    /// Registers a config option for every state of this manager.
    ///
    /// Incomplete options (empty name or no predicate) are ignored; the
    /// return value tells whether the option was stored. Options only affect
    /// later evaluations: `once` options are not re-run for existing states.
    pub fn add_config_option(&self, option: ConfigOption) -> bool {
        self.registry.add(option)
    }

    /// Removes every config option called `name`.
    pub fn remove_config_option(&self, name: &str) {
        self.registry.remove(name);
    }

    /// Returns the most recently added config option called `name`.
    pub fn get_config_option(&self, name: &str) -> Option<ConfigOption> {
        self.registry.get(name)
    }

    /// Returns every config option in registration order.
    pub fn get_config_options(&self) -> Vec<ConfigOption> {
        self.registry.all()
    }

    /// Returns a handle onto the registry shared with the states.
    pub fn registry(&self) -> &ConfigOptionRegistry {
        &self.registry
    }

    /// Sets the single "state changed" callback, replacing any previous one.
    ///
    /// The callback runs after a state enters or leaves because its query
    /// flipped; entries at construction do not trigger it.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidCallback`] when `callback` is `None`.
    pub fn state_change(&self, callback: Option<Callback>) -> Result<(), StateError> {
        self.notifier.set(callback)
    }

    /// Sets the "state changed" callback from a closure.
    pub fn on_state_change<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        // A present callback always passes validation.
        let _ = self.notifier.set(Some(Arc::new(callback)));
    }

    /// Fans a resize out to the active states, in collection order.
    ///
    /// Normally invoked by the debounced resize subscription.
    pub fn resize_browser(&self) {
        dispatch_resize(&self.states);
    }

    /// Waits until the resize signals seen so far have been dispatched.
    ///
    /// Returns at once when no dispatch is pending.
    pub async fn resize_settled(&self) {
        self.debouncer.settled().await;
    }

    /// Returns the debounce quiet period.
    pub fn resize_debounce(&self) -> Duration {
        self.debouncer.wait()
    }

    pub fn len(&self) -> usize {
        self.lock_states().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_states(&self) -> MutexGuard<'_, Vec<State>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for StateManager {
    fn drop(&mut self) {
        self.resize_source.unsubscribe(self.resize_token);
        self.debouncer.cancel();
    }
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("states", &self.get_states())
            .field("registry", &self.registry)
            .field("notifier", &self.notifier)
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

fn active_states(states: &Mutex<Vec<State>>) -> Vec<State> {
    states
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .filter(|state| state.is_active())
        .cloned()
        .collect()
}

fn dispatch_resize(states: &Mutex<Vec<State>>) {
    let active = active_states(states);
    tracing::trace!(active = active.len(), "dispatching resize");
    for state in active {
        state.resize_state();
    }
}
