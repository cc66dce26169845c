//! Responsive states and the manager that owns them.
//!
//! A [`State`] binds a media query to enter/leave/resize/first-run callbacks.
//! It subscribes to its own query through a [`MediaQueryEvaluator`] and
//! consults the shared [`ConfigOptionRegistry`] before every transition.
//! [`StateManager`] keeps the ordered collection and fans out debounced
//! resize signals to the active states.

mod manager;
mod options;

pub use manager::{ManagerSettings, StateManager};
pub use options::{Callback, Callbacks, MAX_WIDTH, MIN_WIDTH, StateOptions, width_query};

use crate::core::config_option::{ConfigOptionRegistry, Phase};
use crate::core::media::{MatchListener, MediaQueryEvaluator, SubscriptionToken};
use crate::error::StateError;
use crate::utils::make_id;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

/// Query used when a state does not define one. Always matches.
pub const DEFAULT_QUERY: &str = "all";

/// Single slot holding the manager's "state changed" callback.
///
/// Shared between the manager and its states; the last callback set wins.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    slot: Arc<RwLock<Option<Callback>>>,
}

impl ChangeNotifier {
    /// Replaces the callback.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidCallback`] when `callback` is `None`; the
    /// previous callback is kept.
    pub fn set(&self, callback: Option<Callback>) -> Result<(), StateError> {
        let callback = callback.ok_or(StateError::InvalidCallback)?;
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(callback);
        Ok(())
    }

    pub fn is_set(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Invokes the callback, if one is registered.
    pub fn notify(&self) {
        let callback = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("is_set", &self.is_set())
            .finish()
    }
}

/// Whether a state has ever been entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryPhase {
    #[default]
    NeverEntered,
    HasEnteredOnce,
}

#[derive(Debug, Default)]
struct Lifecycle {
    active: bool,
    phase: EntryPhase,
    first_run_consumed: bool,
}

struct Subscription {
    token: SubscriptionToken,
    evaluator: Arc<dyn MediaQueryEvaluator>,
}

struct StateInner {
    id: String,
    query: String,
    options: Map<String, Value>,
    on_enter: Callbacks,
    on_leave: Callbacks,
    on_resize: Callbacks,
    on_first_run: Callbacks,
    valid: AtomicBool,
    lifecycle: Mutex<Lifecycle>,
    subscription: Mutex<Option<Subscription>>,
    registry: ConfigOptionRegistry,
    notifier: ChangeNotifier,
}

impl Drop for StateInner {
    fn drop(&mut self) {
        let subscription = self
            .subscription
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.evaluator.unsubscribe(subscription.token);
        }
    }
}

/// One breakpoint definition and its activation status.
///
/// `State` is a cheap handle; clones refer to the same state. The query
/// subscription is released by [`destroy`](Self::destroy) or when the last
/// handle is dropped.
#[derive(Clone)]
pub struct State {
    inner: Arc<StateInner>,
}

impl State {
    /// Builds a state and, if it passes its `once` config options, subscribes
    /// to its query and enters it right away when the query already matches.
    ///
    /// A state failing a `once` option is returned with
    /// [`is_valid`](Self::is_valid) `false` and never subscribes. The entry at
    /// construction does not invoke the change notifier.
    pub fn new(
        options: StateOptions,
        registry: ConfigOptionRegistry,
        notifier: ChangeNotifier,
        evaluator: Arc<dyn MediaQueryEvaluator>,
    ) -> Self {
        let StateOptions {
            id,
            query,
            on_enter,
            on_leave,
            on_resize,
            on_first_run,
            extra,
        } = options;

        let state = Self {
            inner: Arc::new(StateInner {
                id: id.unwrap_or_else(make_id),
                query: query.unwrap_or_else(|| DEFAULT_QUERY.to_string()),
                options: extra,
                on_enter,
                on_leave,
                on_resize,
                on_first_run,
                valid: AtomicBool::new(false),
                lifecycle: Mutex::new(Lifecycle::default()),
                subscription: Mutex::new(None),
                registry,
                notifier,
            }),
        };

        if !state.test_config_options(Phase::Once) {
            tracing::debug!(state = %state.id(), "state rejected by once config option");
            return state;
        }
        state.inner.valid.store(true, Ordering::SeqCst);
        state.init(evaluator);
        state
    }

    fn init(&self, evaluator: Arc<dyn MediaQueryEvaluator>) {
        if evaluator.matches(self.query()) && self.test_config_options(Phase::Match) {
            self.enter_state();
        }

        let weak: Weak<StateInner> = Arc::downgrade(&self.inner);
        let listener: MatchListener = Arc::new(move |matches| {
            if let Some(inner) = weak.upgrade() {
                State { inner }.handle_query_change(matches);
            }
        });
        let token = evaluator.subscribe(self.query(), listener);
        tracing::trace!(state = %self.id(), %token, query = %self.query(), "subscribed to query");

        *self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Subscription { token, evaluator });
    }

    /// Reacts to the query's match status changing.
    ///
    /// Leaving runs whenever the query stops matching, even if the state was
    /// not active. The change notifier runs after an enter or a leave, but not
    /// when a `match` config option blocked entering.
    pub fn handle_query_change(&self, matches: bool) {
        let changed = if matches {
            if self.test_config_options(Phase::Match) {
                self.enter_state();
                true
            } else {
                false
            }
        } else {
            self.leave_state();
            true
        };

        if changed {
            self.inner.notifier.notify();
        }
    }

    /// Fires first-run callbacks (only on the very first entry), then the
    /// enter callbacks, and marks the state active.
    pub fn enter_state(&self) {
        let run_first = {
            let mut lifecycle = self.lifecycle();
            let run_first = !lifecycle.first_run_consumed;
            lifecycle.first_run_consumed = true;
            lifecycle.phase = EntryPhase::HasEnteredOnce;
            run_first
        };

        tracing::debug!(state = %self.id(), first_run = run_first, "entering state");
        if run_first {
            self.inner.on_first_run.fire();
        }
        self.inner.on_enter.fire();
        self.lifecycle().active = true;
    }

    /// Fires the leave callbacks and marks the state inactive.
    pub fn leave_state(&self) {
        tracing::debug!(state = %self.id(), "leaving state");
        self.inner.on_leave.fire();
        self.lifecycle().active = false;
    }

    /// Fires the resize callbacks if every `resize` config option passes.
    ///
    /// Does not look at [`is_active`](Self::is_active); the manager only
    /// dispatches to active states.
    pub fn resize_state(&self) {
        if self.test_config_options(Phase::Resize) {
            tracing::trace!(state = %self.id(), "resizing state");
            self.inner.on_resize.fire();
        }
    }

    /// Releases the query subscription without firing leave callbacks.
    pub fn destroy(&self) {
        let subscription = self
            .inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            tracing::trace!(state = %self.id(), token = %subscription.token, "unsubscribing query");
            subscription.evaluator.unsubscribe(subscription.token);
        }
    }

    /// Runs the registry's predicates for `phase` against this state.
    pub fn test_config_options(&self, phase: Phase) -> bool {
        self.inner.registry.evaluate(phase, self)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn query(&self) -> &str {
        &self.inner.query
    }

    /// Whether the state passed its `once` config options.
    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle().active
    }

    pub fn entry_phase(&self) -> EntryPhase {
        self.lifecycle().phase
    }

    /// Whether the state still holds its query subscription.
    pub fn is_subscribed(&self) -> bool {
        self.inner
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns an extra option field by name.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.inner.options.get(name)
    }

    /// Whether the state defines the extra option field `name`.
    ///
    /// Only extra fields count. `id`, `query` and the callback lists are not
    /// option fields, so a config option named `on_enter` applies only to
    /// states that also carry an `on_enter` extra field.
    pub fn has_option(&self, name: &str) -> bool {
        self.inner.options.contains_key(name)
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.inner.options
    }

    /// Whether both handles refer to the same state.
    pub fn ptr_eq(&self, other: &State) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lifecycle(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.inner
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id())
            .field("query", &self.query())
            .field("valid", &self.is_valid())
            .field("active", &self.is_active())
            .field("options", self.options())
            .finish()
    }
}
