//! The sink every backend implements.
//!
//! `SimOutputObserver` drives a writer once per output tick: one
//! `AgentStateRow` per agent (dead agents included), one `StepSummaryRow`,
//! then one `StateCountRow` per configured state value of every category.  Rows of a tick are written
//! before any row of the next tick, so backends may append without sorting.

use crate::{AgentStateRow, OutputResult, StateCountRow, StepSummaryRow};

/// CSV, SQLite and Parquet sinks for run output.
pub trait OutputWriter {
    /// Append the state of each agent at one tick.  An empty batch is a no-op.
    fn write_agent_states(&mut self, rows: &[AgentStateRow]) -> OutputResult<()>;

    /// Append the step totals: infections, tests, doses, traced contacts and
    /// placement fallbacks.
    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()>;

    /// Append how many agents hold each state value at one tick.
    fn write_state_counts(&mut self, rows: &[StateCountRow]) -> OutputResult<()>;

    /// Flush and close.  Idempotent; later writes return `OutputError::Finished`.
    fn finish(&mut self) -> OutputResult<()>;
}
