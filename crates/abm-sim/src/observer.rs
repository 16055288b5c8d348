//! Simulation observer trait for progress reporting and data collection.

use abm_core::Tick;
use abm_population::AgentStore;
use abm_states::StatesManager;

use crate::{RunReport, StepSnapshot};

/// Callbacks invoked by [`Sim`][crate::Sim] at key points of each step.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress;
///
/// impl SimObserver for Progress {
///     fn on_step_end(&mut self, snap: &StepSnapshot, _states: &StatesManager) {
///         println!("{}: {} new infections", snap.tick, snap.new_infections);
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each step, before mobility.
    fn on_step_start(&mut self, _tick: Tick) {}

    /// Called once the step's pipeline has run, before the clock advances.
    /// `states` resolves the state values in `snapshot.counts` to names.
    fn on_step_end(&mut self, _snapshot: &StepSnapshot, _states: &StatesManager) {}

    /// Called at output intervals (every `simulation.output_interval_ticks`
    /// ticks) with the full per-agent state.
    fn on_snapshot(&mut self, _tick: Tick, _states: &StatesManager, _agents: &AgentStore) {}

    /// Called once after the final step of [`Sim::run`][crate::Sim::run].
    fn on_sim_end(&mut self, _final_tick: Tick, _report: &RunReport) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Keeps every step snapshot in memory.
#[derive(Default)]
pub struct SnapshotRecorder {
    pub steps: Vec<StepSnapshot>,
}

impl SimObserver for SnapshotRecorder {
    fn on_step_end(&mut self, snapshot: &StepSnapshot, _states: &StatesManager) {
        self.steps.push(snapshot.clone());
    }
}
