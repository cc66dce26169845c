//! Trailing-edge debouncing on top of the tokio timer.

use crate::error::StateError;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default quiet period before a debounced action runs.
pub const DEFAULT_WAIT: Duration = Duration::from_millis(25);

/// Collapses a burst of calls into a single trailing invocation.
///
/// Every [`call`](Self::call) restarts the wait window; the action runs once
/// the window elapses with no further calls. There is no leading-edge
/// invocation. Dropping the debouncer cancels a pending window.
///
/// Each call is numbered; the number of the last call that ran or was
/// cancelled is published on a watch channel, which
/// [`settled`](Self::settled) waits on.
pub struct Debouncer {
    wait: Duration,
    action: Arc<dyn Fn() + Send + Sync>,
    runtime: Handle,
    pending: Mutex<Pending>,
    settled: Arc<watch::Sender<u64>>,
}

#[derive(Default)]
struct Pending {
    task: Option<JoinHandle<()>>,
    generation: u64,
}

fn publish(settled: &watch::Sender<u64>, generation: u64) {
    settled.send_if_modified(|done| {
        if *done < generation {
            *done = generation;
            true
        } else {
            false
        }
    });
}

impl Debouncer {
    /// Creates a debouncer bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NoRuntime`] when called outside a tokio runtime.
    pub fn new<F>(wait: Duration, action: F) -> Result<Self, StateError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|e| StateError::NoRuntime {
            message: e.to_string(),
        })?;
        Ok(Self::with_handle(runtime, wait, action))
    }

    /// Creates a debouncer that schedules its timer on `runtime`.
    pub fn with_handle<F>(runtime: Handle, wait: Duration, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            wait,
            action: Arc::new(action),
            runtime,
            pending: Mutex::new(Pending::default()),
            settled: Arc::new(watch::Sender::new(0)),
        }
    }

    /// Returns the quiet period.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Records a signal, restarting the wait window.
    pub fn call(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.generation += 1;
        let generation = pending.generation;

        let action = Arc::clone(&self.action);
        let settled = Arc::clone(&self.settled);
        let wait = self.wait;
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(wait).await;
            action();
            publish(&settled, generation);
        });

        if let Some(previous) = pending.task.replace(task) {
            previous.abort();
        }
    }

    /// Drops the pending invocation, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = pending.task.take() {
            task.abort();
        }
        publish(&self.settled, pending.generation);
    }

    /// Returns whether an invocation is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Waits until every call made so far has either run the action or been
    /// cancelled.
    ///
    /// Returns at once when nothing is pending. Calls made while waiting are
    /// not waited for.
    pub async fn settled(&self) {
        let target = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation;
        let mut done = self.settled.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail.
        let _ = done.wait_for(|generation| *generation >= target).await;
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("wait", &self.wait)
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_debouncer(wait_ms: u64) -> (Debouncer, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let debouncer = Debouncer::new(Duration::from_millis(wait_ms), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        (debouncer, count)
    }

    /// # Burst Collapses to One Call
    ///
    /// ## Test Scenario
    /// - Ten calls arrive 10ms apart with a 25ms window
    ///
    /// ## Expected Outcome
    /// - Nothing fires during the burst
    /// - Exactly one invocation after the quiet period
    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_single_trailing_call() {
        let (debouncer, count) = counting_debouncer(25);

        for _ in 0..10 {
            debouncer.call();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    /// # Separate Quiet Periods Fire Separately
    #[tokio::test(start_paused = true)]
    async fn test_separated_calls_fire_each_time() {
        let (debouncer, count) = counting_debouncer(25);

        debouncer.call();
        tokio::time::sleep(Duration::from_millis(40)).await;
        debouncer.call();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    /// # No Leading Edge
    #[tokio::test(start_paused = true)]
    async fn test_no_leading_edge_invocation() {
        let (debouncer, count) = counting_debouncer(25);

        debouncer.call();
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(24)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    /// # Cancel and Drop Discard the Pending Window
    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop_discard_pending_call() {
        let (debouncer, count) = counting_debouncer(25);
        debouncer.call();
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        debouncer.call();
        drop(debouncer);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    /// # Settling on a Real Clock
    ///
    /// ## Test Scenario
    /// - A burst of calls on a multi-thread runtime with time running freely
    ///
    /// ## Expected Outcome
    /// - `settled` returns only after the trailing invocation has run
    /// - A second `settled` with nothing pending returns at once
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_settled_waits_for_trailing_call() {
        let (debouncer, count) = counting_debouncer(10);

        for _ in 0..5 {
            debouncer.call();
        }
        debouncer.settled().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        debouncer.settled().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_returns_after_cancel() {
        let (debouncer, count) = counting_debouncer(25);
        debouncer.call();
        debouncer.cancel();

        debouncer.settled().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let result = Debouncer::new(DEFAULT_WAIT, || {});
        assert!(matches!(result, Err(StateError::NoRuntime { .. })));
    }
}
