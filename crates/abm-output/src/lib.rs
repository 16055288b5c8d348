//! `abm-output`: simulation output writers for the rust_abm engine.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend  | Files created                                                       |
//! |-----------|----------|---------------------------------------------------------------------|
//! | *(none)*  | CSV      | `agent_states.csv`, `step_summaries.csv`, `state_counts.csv`        |
//! | `sqlite`  | SQLite   | `output.db`                                                         |
//! | `parquet` | Parquet  | `agent_states.parquet`, `step_summaries.parquet`, `state_counts.parquet` |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `abm_sim::SimObserver`.  Step
//! summaries and state counts are written every step; per-agent states at
//! `simulation.output_interval_ticks`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use abm_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer);
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{AgentStateRow, StateCountRow, StepSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
