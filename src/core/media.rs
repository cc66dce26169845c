//! Host environment abstractions consumed by the state manager.
//!
//! The manager never inspects the viewport itself. It asks a
//! [`MediaQueryEvaluator`] whether a query matches and listens for changes,
//! and it listens to a [`ResizeSource`] for raw resize signals. Both hand out
//! a [`SubscriptionToken`] that identifies the listener when it is released.

use std::fmt;
use std::sync::Arc;

/// Listener invoked with the new match status of a query.
pub type MatchListener = Arc<dyn Fn(bool) + Send + Sync>;

/// Listener invoked for every raw viewport resize signal.
pub type ResizeListener = Arc<dyn Fn() + Send + Sync>;

/// Opaque handle identifying one subscription.
///
/// Returned by `subscribe` and passed back to `unsubscribe`. Tokens are only
/// meaningful to the collaborator that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    /// Wraps a raw token value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw token value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Evaluates media queries against the host environment.
///
/// Implementations deliver change notifications for a single query in the
/// order the environment observes them. Listeners must be called without any
/// internal lock held, since a listener may subscribe or unsubscribe.
pub trait MediaQueryEvaluator: Send + Sync {
    /// Returns whether `query` currently matches.
    fn matches(&self, query: &str) -> bool;

    /// Registers `listener` to be called whenever the match status of
    /// `query` flips.
    fn subscribe(&self, query: &str, listener: MatchListener) -> SubscriptionToken;

    /// Releases a subscription. Unknown tokens are ignored.
    fn unsubscribe(&self, token: SubscriptionToken);
}

/// Source of raw (undebounced) viewport resize signals.
pub trait ResizeSource: Send + Sync {
    /// Registers `listener` to be called on every resize signal.
    fn subscribe(&self, listener: ResizeListener) -> SubscriptionToken;

    /// Releases a subscription. Unknown tokens are ignored.
    fn unsubscribe(&self, token: SubscriptionToken);
}
