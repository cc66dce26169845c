//! In-process host environment for driving states without a browser.
//!
//! [`SimulatedViewport`] implements both [`MediaQueryEvaluator`] and
//! [`ResizeSource`]. Resizing it notifies query listeners whose match status
//! flipped, in subscription order, and then every resize listener.

pub mod query;

pub use query::{MediaQueryList, Orientation, Viewport};

use crate::core::media::{
    MatchListener, MediaQueryEvaluator, ResizeListener, ResizeSource, SubscriptionToken,
};
use std::sync::{Mutex, MutexGuard, PoisonError};

struct QuerySubscription {
    token: SubscriptionToken,
    query: Option<MediaQueryList>,
    matches: bool,
    listener: MatchListener,
}

struct ViewportInner {
    size: Viewport,
    next_token: u64,
    queries: Vec<QuerySubscription>,
    resize: Vec<(SubscriptionToken, ResizeListener)>,
}

impl ViewportInner {
    fn issue_token(&mut self) -> SubscriptionToken {
        self.next_token += 1;
        SubscriptionToken::new(self.next_token)
    }

    fn is_subscribed(&self, token: SubscriptionToken) -> bool {
        self.queries.iter().any(|s| s.token == token) || self.resize.iter().any(|(t, _)| *t == token)
    }
}

/// A viewport whose size is set by the caller.
pub struct SimulatedViewport {
    inner: Mutex<ViewportInner>,
}

impl SimulatedViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: Mutex::new(ViewportInner {
                size: Viewport::new(width, height),
                next_token: 0,
                queries: Vec::new(),
                resize: Vec::new(),
            }),
        }
    }

    pub fn size(&self) -> Viewport {
        self.lock().size
    }

    /// Changes the viewport size and delivers the resulting signals.
    ///
    /// Every call counts as a resize signal, even when the size is unchanged.
    /// A listener released by an earlier listener in the same round is
    /// skipped.
    pub fn resize(&self, width: u32, height: u32) {
        let (flipped, resize_listeners) = {
            let mut inner = self.lock();
            let size = Viewport::new(width, height);
            inner.size = size;

            let mut flipped = Vec::new();
            for subscription in &mut inner.queries {
                let now = subscription
                    .query
                    .as_ref()
                    .is_some_and(|query| query.matches(size));
                if now != subscription.matches {
                    subscription.matches = now;
                    flipped.push((
                        subscription.token,
                        subscription.listener.clone(),
                        now,
                    ));
                }
            }
            (flipped, inner.resize.clone())
        };

        tracing::trace!(
            width,
            height,
            flipped = flipped.len(),
            "viewport resized"
        );

        for (token, listener, matches) in flipped {
            if self.lock().is_subscribed(token) {
                listener(matches);
            }
        }
        for (token, listener) in resize_listeners {
            if self.lock().is_subscribed(token) {
                listener();
            }
        }
    }

    pub fn match_subscription_count(&self) -> usize {
        self.lock().queries.len()
    }

    pub fn resize_subscription_count(&self) -> usize {
        self.lock().resize.len()
    }

    fn lock(&self) -> MutexGuard<'_, ViewportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedViewport {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

impl std::fmt::Debug for SimulatedViewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SimulatedViewport")
            .field("size", &inner.size)
            .field("query_subscriptions", &inner.queries.len())
            .field("resize_subscriptions", &inner.resize.len())
            .finish()
    }
}

fn parse_or_warn(query: &str) -> Option<MediaQueryList> {
    match MediaQueryList::parse(query) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(query, error = %e, "unparseable media query never matches");
            None
        }
    }
}

impl MediaQueryEvaluator for SimulatedViewport {
    fn matches(&self, query: &str) -> bool {
        let size = self.size();
        parse_or_warn(query).is_some_and(|parsed| parsed.matches(size))
    }

    fn subscribe(&self, query: &str, listener: MatchListener) -> SubscriptionToken {
        let parsed = parse_or_warn(query);
        let mut inner = self.lock();
        let matches = parsed.as_ref().is_some_and(|p| p.matches(inner.size));
        let token = inner.issue_token();
        inner.queries.push(QuerySubscription {
            token,
            query: parsed,
            matches,
            listener,
        });
        token
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        self.lock().queries.retain(|s| s.token != token);
    }
}

impl ResizeSource for SimulatedViewport {
    fn subscribe(&self, listener: ResizeListener) -> SubscriptionToken {
        let mut inner = self.lock();
        let token = inner.issue_token();
        inner.resize.push((token, listener));
        token
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        self.lock().resize.retain(|(t, _)| *t != token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_matches_current_size() {
        let viewport = SimulatedViewport::new(800, 600);
        assert!(viewport.matches("(min-width: 768px)"));
        assert!(!viewport.matches("(min-width: 992px)"));
        assert!(!viewport.matches("(bogus)"));
        assert_eq!(viewport.size(), Viewport::new(800, 600));
    }

    /// # Query Listeners Fire Only on Flips
    ///
    /// ## Expected Outcome
    /// - Resizes that keep the status unchanged are silent
    /// - Each flip is delivered with the new status
    #[test]
    fn test_query_listener_fires_on_flip_only() {
        let viewport = SimulatedViewport::new(500, 600);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        MediaQueryEvaluator::subscribe(
            &viewport,
            "(min-width: 768px)",
            Arc::new(move |matches| log.lock().unwrap().push(matches)),
        );

        viewport.resize(600, 600);
        viewport.resize(800, 600);
        viewport.resize(900, 600);
        viewport.resize(700, 600);

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_resize_listeners_fire_every_time_until_unsubscribed() {
        let viewport = SimulatedViewport::new(500, 600);
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let token = ResizeSource::subscribe(
            &viewport,
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        viewport.resize(500, 600);
        viewport.resize(510, 600);
        ResizeSource::unsubscribe(&viewport, token);
        viewport.resize(520, 600);

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(viewport.resize_subscription_count(), 0);
    }

    /// # Unsubscribing Mid-Round
    ///
    /// ## Expected Outcome
    /// - A listener released by an earlier listener does not run
    #[test]
    fn test_listener_removed_during_round_is_skipped() {
        let viewport = Arc::new(SimulatedViewport::new(500, 600));
        let second_calls = Arc::new(AtomicUsize::new(0));
        let second_token = Arc::new(Mutex::new(None));

        let target = Arc::clone(&second_token);
        let host = Arc::downgrade(&viewport);
        MediaQueryEvaluator::subscribe(
            &*viewport,
            "(min-width: 768px)",
            Arc::new(move |_| {
                if let (Some(host), Some(token)) = (host.upgrade(), *target.lock().unwrap()) {
                    MediaQueryEvaluator::unsubscribe(&*host, token);
                }
            }),
        );
        let counter = Arc::clone(&second_calls);
        let token = MediaQueryEvaluator::subscribe(
            &*viewport,
            "(min-width: 768px)",
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        *second_token.lock().unwrap() = Some(token);

        viewport.resize(800, 600);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
        assert_eq!(viewport.match_subscription_count(), 1);
    }

    #[test]
    fn test_tokens_are_unique_across_kinds() {
        let viewport = SimulatedViewport::default();
        let a = MediaQueryEvaluator::subscribe(&viewport, "all", Arc::new(|_| {}));
        let b = ResizeSource::subscribe(&viewport, Arc::new(|| {}));
        assert_ne!(a, b);
    }
}
