//! Drives a [`StateManager`] through a sequence of simulated viewports.
//!
//! Every lifecycle callback is recorded as a [`LifecycleEvent`] and written
//! through an [`OutputWriter`] as soon as the step that caused it finishes.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result, bail};

use crate::core::ExitCode;
use crate::core::output::{
    LifecycleEvent, OutputFormatter, OutputWriter, SummaryCounts, SummaryInfo,
};
use crate::core::state::{ManagerSettings, StateManager, StateOptions};
use crate::utils::make_id;
use crate::viewport::SimulatedViewport;

use super::traits::{RunResult, SimulationConfig};

/// Shared sink the state callbacks push into.
#[derive(Clone, Default)]
struct EventRecorder {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl EventRecorder {
    fn record(&self, event: LifecycleEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn drain(&self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn hook(
        &self,
        id: &str,
        make: fn(String) -> LifecycleEvent,
    ) -> impl Fn() + Send + Sync + 'static {
        let recorder = self.clone();
        let id = id.to_string();
        move || recorder.record(make(id.clone()))
    }

    fn instrument(&self, options: StateOptions, id: &str) -> StateOptions {
        options
            .on_first_run(self.hook(id, |state| LifecycleEvent::FirstRun { state }))
            .on_enter(self.hook(id, |state| LifecycleEvent::Enter { state }))
            .on_leave(self.hook(id, |state| LifecycleEvent::Leave { state }))
            .on_resize(self.hook(id, |state| LifecycleEvent::Resize { state }))
    }
}

/// Runs a simulation and reports what the states did.
pub struct SimulationRunner<W: Write = io::Stdout> {
    config: SimulationConfig,
    output: OutputWriter<W>,
    recorder: EventRecorder,
    history: Vec<LifecycleEvent>,
}

impl SimulationRunner<io::Stdout> {
    /// Creates a runner writing to stdout.
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_writer(config, io::stdout())
    }
}

impl<W: Write> SimulationRunner<W> {
    /// Creates a runner with a custom writer.
    pub fn with_writer(config: SimulationConfig, writer: W) -> Self {
        let output = OutputWriter::new(writer, config.output_format, config.quiet);
        Self {
            config,
            output,
            recorder: EventRecorder::default(),
            history: Vec::new(),
        }
    }

    /// Runs the simulation.
    ///
    /// Must be awaited inside a tokio runtime; the manager's resize debouncer
    /// uses its timer. Each step waits for the debounced resize dispatch
    /// before moving on.
    pub async fn run(&mut self) -> RunResult {
        if self.config.definitions.is_empty() {
            return RunResult::error(ExitCode::NoStates, "No states defined");
        }

        match self.simulate().await {
            Ok(_) if self.tracked_none() => RunResult::error(
                ExitCode::NoStates,
                "Every state was rejected by a once config option",
            ),
            Ok(_) => RunResult::success(),
            Err(e) => {
                tracing::error!(error = %e, "simulation failed");
                RunResult::error(ExitCode::GeneralError, format!("{:#}", e))
            }
        }
    }

    fn tracked_none(&self) -> bool {
        self.history.iter().any(|event| {
            matches!(event, LifecycleEvent::Start { states, .. } if states.is_empty())
        })
    }

    async fn simulate(&mut self) -> Result<SummaryInfo> {
        let initial = self.config.initial;
        let viewport = Arc::new(SimulatedViewport::new(initial.width, initial.height));
        let settings = ManagerSettings {
            resize_debounce: self.config.resize_debounce,
        };
        let manager = StateManager::with_settings(viewport.clone(), viewport.clone(), settings)
            .context("Failed to create state manager")?;

        for rule in &self.config.rules {
            if !manager.add_config_option(rule.to_config_option()) {
                bail!("Config option '{}' was rejected", rule);
            }
        }

        let recorder = self.recorder.clone();
        manager.on_state_change(move || recorder.record(LifecycleEvent::StateChange));

        // Same reverse insertion as add_states, keeping each state's validity.
        let mut rejected = Vec::new();
        for definition in self.config.definitions.iter().rev() {
            let id = definition.id.clone().unwrap_or_else(make_id);
            let options = self.recorder.instrument(definition.to_options().id(&id), &id);
            let state = manager.add_state(options);
            if !state.is_valid() {
                rejected.push(id);
            }
        }
        rejected.reverse();

        let states = manager
            .get_states()
            .iter()
            .map(|state| state.id().to_string())
            .collect();
        tracing::info!(
            viewport = %initial,
            states = manager.len(),
            rejected = rejected.len(),
            "states registered"
        );
        self.emit(LifecycleEvent::Start {
            width: initial.width,
            height: initial.height,
            states,
            rejected,
        })?;
        self.flush_recorded()?;

        let steps = self.config.steps.clone();
        for step in steps {
            self.emit(LifecycleEvent::Viewport {
                width: step.width,
                height: step.height,
            })?;
            viewport.resize(step.width, step.height);
            self.flush_recorded()?;

            manager.resize_settled().await;
            self.flush_recorded()?;
        }

        let size = viewport.size();
        let summary = SummaryInfo {
            width: size.width,
            height: size.height,
            active: manager
                .current_states()
                .iter()
                .map(|state| state.id().to_string())
                .collect(),
            counts: SummaryCounts::from_events(&self.history),
        };
        self.output
            .write_summary(&summary)
            .context("Failed to write summary")?;
        self.output.flush().context("Failed to flush output")?;

        Ok(summary)
    }

    fn emit(&mut self, event: LifecycleEvent) -> Result<()> {
        self.output
            .write_event(&event)
            .context("Failed to write event")?;
        self.history.push(event);
        Ok(())
    }

    fn flush_recorded(&mut self) -> Result<()> {
        for event in self.recorder.drain() {
            self.emit(event)?;
        }
        Ok(())
    }
}
