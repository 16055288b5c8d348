//! CSV output backend.
//!
//! Creates three files in the output directory:
//! - `agent_states.csv`
//! - `step_summaries.csv`
//! - `state_counts.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{AgentStateRow, OutputError, OutputResult, StateCountRow, StepSummaryRow};

pub const AGENT_STATES_HEADER: [&str; 7] =
    ["agent_id", "tick", "health", "role", "testing", "vaccination", "doses"];

pub const STEP_SUMMARIES_HEADER: [&str; 12] = [
    "tick",
    "day",
    "new_infections",
    "cumulative_infections",
    "transitions",
    "flu_sick",
    "tests",
    "new_confirmed",
    "doses",
    "traced",
    "rerouted",
    "fell_back",
];

pub const STATE_COUNTS_HEADER: [&str; 4] = ["tick", "category", "state", "count"];

pub struct CsvWriter {
    agents:    Writer<File>,
    summaries: Writer<File>,
    counts:    Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create the three CSV files in `dir` and write their headers.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut agents = Writer::from_path(dir.join("agent_states.csv"))?;
        agents.write_record(AGENT_STATES_HEADER)?;

        let mut summaries = Writer::from_path(dir.join("step_summaries.csv"))?;
        summaries.write_record(STEP_SUMMARIES_HEADER)?;

        let mut counts = Writer::from_path(dir.join("state_counts.csv"))?;
        counts.write_record(STATE_COUNTS_HEADER)?;

        log::debug!("writing CSV output to {}", dir.display());
        Ok(Self { agents, summaries, counts, finished: false })
    }

    fn check_open(&self) -> OutputResult<()> {
        if self.finished { Err(OutputError::Finished) } else { Ok(()) }
    }
}

impl OutputWriter for CsvWriter {
    fn write_agent_states(&mut self, rows: &[AgentStateRow]) -> OutputResult<()> {
        self.check_open()?;
        for row in rows {
            self.agents.write_record([
                row.agent_id.to_string().as_str(),
                row.tick.to_string().as_str(),
                row.health.as_str(),
                row.role.as_str(),
                row.testing.as_str(),
                row.vaccination.as_str(),
                row.doses.to_string().as_str(),
            ])?;
        }
        Ok(())
    }

    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()> {
        self.check_open()?;
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.day.to_string(),
            row.new_infections.to_string(),
            row.cumulative_infections.to_string(),
            row.transitions.to_string(),
            row.flu_sick.to_string(),
            row.tests.to_string(),
            row.new_confirmed.to_string(),
            row.doses.to_string(),
            row.traced.to_string(),
            row.rerouted.to_string(),
            row.fell_back.to_string(),
        ])?;
        Ok(())
    }

    fn write_state_counts(&mut self, rows: &[StateCountRow]) -> OutputResult<()> {
        self.check_open()?;
        for row in rows {
            self.counts.write_record([
                row.tick.to_string().as_str(),
                row.category,
                row.state.as_str(),
                row.count.to_string().as_str(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.agents.flush()?;
        self.summaries.flush()?;
        self.counts.flush()?;
        Ok(())
    }
}
