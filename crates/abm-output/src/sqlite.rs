//! SQLite output backend (feature `sqlite`).
//!
//! Creates `output.db` in the output directory with three tables:
//! `agent_states`, `step_summaries` and `state_counts`.

use std::path::Path;

use rusqlite::{Connection, params};

use crate::writer::OutputWriter;
use crate::{AgentStateRow, OutputError, OutputResult, StateCountRow, StepSummaryRow};

pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS agent_states (
                 agent_id    INTEGER NOT NULL,
                 tick        INTEGER NOT NULL,
                 health      TEXT    NOT NULL,
                 role        TEXT    NOT NULL,
                 testing     TEXT    NOT NULL,
                 vaccination TEXT    NOT NULL,
                 doses       INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS step_summaries (
                 tick                  INTEGER PRIMARY KEY,
                 day                   REAL    NOT NULL,
                 new_infections        INTEGER NOT NULL,
                 cumulative_infections INTEGER NOT NULL,
                 transitions           INTEGER NOT NULL,
                 flu_sick              INTEGER NOT NULL,
                 tests                 INTEGER NOT NULL,
                 new_confirmed         INTEGER NOT NULL,
                 doses                 INTEGER NOT NULL,
                 traced                INTEGER NOT NULL,
                 rerouted              INTEGER NOT NULL,
                 fell_back             INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS state_counts (
                 tick     INTEGER NOT NULL,
                 category TEXT    NOT NULL,
                 state    TEXT    NOT NULL,
                 count    INTEGER NOT NULL
             );",
        )?;

        log::debug!("writing SQLite output to {}", dir.join("output.db").display());
        Ok(Self { conn, finished: false })
    }

    fn check_open(&self) -> OutputResult<()> {
        if self.finished { Err(OutputError::Finished) } else { Ok(()) }
    }
}

impl OutputWriter for SqliteWriter {
    fn write_agent_states(&mut self, rows: &[AgentStateRow]) -> OutputResult<()> {
        self.check_open()?;
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO agent_states \
                 (agent_id, tick, health, role, testing, vaccination, doses) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.agent_id,
                    row.tick as i64,
                    row.health,
                    row.role,
                    row.testing,
                    row.vaccination,
                    row.doses,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()> {
        self.check_open()?;
        self.conn.execute(
            "INSERT INTO step_summaries \
             (tick, day, new_infections, cumulative_infections, transitions, flu_sick, \
              tests, new_confirmed, doses, traced, rerouted, fell_back) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                row.tick as i64,
                row.day,
                row.new_infections,
                row.cumulative_infections as i64,
                row.transitions,
                row.flu_sick,
                row.tests,
                row.new_confirmed,
                row.doses,
                row.traced,
                row.rerouted,
                row.fell_back,
            ],
        )?;
        Ok(())
    }

    fn write_state_counts(&mut self, rows: &[StateCountRow]) -> OutputResult<()> {
        self.check_open()?;
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO state_counts (tick, category, state, count) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in rows {
                stmt.execute(params![row.tick as i64, row.category, row.state, row.count])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
