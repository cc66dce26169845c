//! Lifecycle events reported by a simulation run.
//!
//! These events mirror what the registered callbacks observed, designed to be
//! serializable for JSON/NDJSON output and renderable for text output.

use serde::{Deserialize, Serialize};

/// Events emitted while driving states through a viewport sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// States were registered against the initial viewport.
    Start {
        width: u32,
        height: u32,
        /// Ids of the states kept by the manager, in collection order.
        states: Vec<String>,
        /// Ids of the states rejected by a `once` config option.
        rejected: Vec<String>,
    },

    /// The viewport was resized.
    Viewport { width: u32, height: u32 },

    /// A state entered for the first time.
    FirstRun { state: String },

    /// A state entered.
    Enter { state: String },

    /// A state left.
    Leave { state: String },

    /// A debounced resize reached an active state.
    Resize { state: String },

    /// The manager's change notifier ran.
    StateChange,
}

impl LifecycleEvent {
    /// Whether the event is a per-state resize notification.
    pub fn is_resize(&self) -> bool {
        matches!(self, LifecycleEvent::Resize { .. })
    }
}

/// Final report of a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryInfo {
    /// Final viewport width.
    pub width: u32,
    /// Final viewport height.
    pub height: u32,
    /// Ids of the active states, in collection order.
    pub active: Vec<String>,
    pub counts: SummaryCounts,
}

/// Number of lifecycle callbacks fired during the run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryCounts {
    pub enters: usize,
    pub leaves: usize,
    pub resizes: usize,
    pub state_changes: usize,
}

impl SummaryCounts {
    /// Tallies the callbacks recorded in `events`.
    pub fn from_events(events: &[LifecycleEvent]) -> Self {
        events.iter().fold(Self::default(), |mut counts, event| {
            match event {
                LifecycleEvent::Enter { .. } => counts.enters += 1,
                LifecycleEvent::Leave { .. } => counts.leaves += 1,
                LifecycleEvent::Resize { .. } => counts.resizes += 1,
                LifecycleEvent::StateChange => counts.state_changes += 1,
                _ => {}
            }
            counts
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_string(&LifecycleEvent::Enter {
            state: "sm".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"enter","state":"sm"}"#);

        let json = serde_json::to_string(&LifecycleEvent::StateChange).unwrap();
        assert_eq!(json, r#"{"event":"state_change"}"#);
    }

    #[test]
    fn test_counts_from_events() {
        let events = vec![
            LifecycleEvent::FirstRun {
                state: "sm".to_string(),
            },
            LifecycleEvent::Enter {
                state: "sm".to_string(),
            },
            LifecycleEvent::Leave {
                state: "xs".to_string(),
            },
            LifecycleEvent::StateChange,
            LifecycleEvent::Resize {
                state: "sm".to_string(),
            },
            LifecycleEvent::Viewport {
                width: 800,
                height: 600,
            },
        ];

        let counts = SummaryCounts::from_events(&events);
        assert_eq!(
            counts,
            SummaryCounts {
                enters: 1,
                leaves: 1,
                resizes: 1,
                state_changes: 1,
            }
        );
    }
}
