//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use abm_core::Tick;
use abm_population::AgentStore;
use abm_sim::{RunReport, SimObserver, StepSnapshot};
use abm_states::StatesManager;

use crate::writer::OutputWriter;
use crate::{AgentStateRow, OutputError, OutputResult, StateCountRow, StepSummaryRow};

/// A [`SimObserver`] that writes step summaries, state counts and per-agent
/// states to any [`OutputWriter`] backend.
///
/// `SimObserver` methods cannot fail, so the first write error is kept and
/// later writes are skipped.  Check it with [`take_error`][Self::take_error]
/// once `sim.run()` returns.
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    /// Write per-agent rows at output intervals.
    agent_rows: bool,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, agent_rows: true, last_error: None }
    }

    /// Skip the per-agent rows; summaries and counts are still written.
    pub fn without_agent_states(mut self) -> Self {
        self.agent_rows = false;
        self
    }

    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn record(&mut self, write: impl FnOnce(&mut W) -> OutputResult<()>) {
        if self.last_error.is_some() {
            return;
        }
        if let Err(e) = write(&mut self.writer) {
            log::error!("output write failed: {e}");
            self.last_error = Some(e);
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_step_end(&mut self, snapshot: &StepSnapshot, states: &StatesManager) {
        let summary = StepSummaryRow::from(snapshot);
        let counts = StateCountRow::collect(snapshot, states);
        self.record(|w| {
            w.write_step_summary(&summary)?;
            w.write_state_counts(&counts)
        });
    }

    fn on_snapshot(&mut self, tick: Tick, states: &StatesManager, agents: &AgentStore) {
        if !self.agent_rows {
            return;
        }
        let rows = AgentStateRow::collect(tick, states, agents);
        if !rows.is_empty() {
            self.record(|w| w.write_agent_states(&rows));
        }
    }

    fn on_sim_end(&mut self, _final_tick: Tick, _report: &RunReport) {
        // Always close the writer, even after a failed write.
        if let Err(e) = self.writer.finish() {
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}
