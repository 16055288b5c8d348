//! Parquet output backend (feature `parquet`).
//!
//! Creates `agent_states.parquet`, `step_summaries.parquet` and
//! `state_counts.parquet` in the output directory.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, StringBuilder, UInt8Builder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::OutputWriter;
use crate::{AgentStateRow, OutputError, OutputResult, StateCountRow, StepSummaryRow};

fn agent_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("agent_id",    DataType::UInt32, false),
        Field::new("tick",        DataType::UInt64, false),
        Field::new("health",      DataType::Utf8,   false),
        Field::new("role",        DataType::Utf8,   false),
        Field::new("testing",     DataType::Utf8,   false),
        Field::new("vaccination", DataType::Utf8,   false),
        Field::new("doses",       DataType::UInt8,  false),
    ]))
}

fn summary_schema() -> Arc<Schema> {
    let mut fields = vec![
        Field::new("tick", DataType::UInt64,  false),
        Field::new("day",  DataType::Float64, false),
        Field::new("new_infections", DataType::UInt32, false),
        Field::new("cumulative_infections", DataType::UInt64, false),
    ];
    for name in ["transitions", "flu_sick", "tests", "new_confirmed", "doses", "traced", "rerouted", "fell_back"] {
        fields.push(Field::new(name, DataType::UInt32, false));
    }
    Arc::new(Schema::new(fields))
}

fn count_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("tick",     DataType::UInt64, false),
        Field::new("category", DataType::Utf8,   false),
        Field::new("state",    DataType::Utf8,   false),
        Field::new("count",    DataType::UInt32, false),
    ]))
}

fn open(dir: &Path, name: &str, schema: &Arc<Schema>) -> OutputResult<ArrowWriter<File>> {
    let props = WriterProperties::builder().set_compression(Compression::SNAPPY).build();
    let file = File::create(dir.join(name))?;
    Ok(ArrowWriter::try_new(file, Arc::clone(schema), Some(props))?)
}

/// Writes simulation output to three Parquet files.
///
/// `finish()` **must** be called to write the Parquet footers; files written
/// without it cannot be opened by Parquet readers.
pub struct ParquetWriter {
    agents:         Option<ArrowWriter<File>>,
    summaries:      Option<ArrowWriter<File>>,
    counts:         Option<ArrowWriter<File>>,
    agent_schema:   Arc<Schema>,
    summary_schema: Arc<Schema>,
    count_schema:   Arc<Schema>,
}

impl ParquetWriter {
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let agent_schema = agent_schema();
        let summary_schema = summary_schema();
        let count_schema = count_schema();
        Ok(Self {
            agents:    Some(open(dir, "agent_states.parquet", &agent_schema)?),
            summaries: Some(open(dir, "step_summaries.parquet", &summary_schema)?),
            counts:    Some(open(dir, "state_counts.parquet", &count_schema)?),
            agent_schema,
            summary_schema,
            count_schema,
        })
    }
}

fn write(writer: Option<&mut ArrowWriter<File>>, schema: &Arc<Schema>, columns: Vec<ArrayRef>) -> OutputResult<()> {
    let writer = writer.ok_or(OutputError::Finished)?;
    let batch = RecordBatch::try_new(Arc::clone(schema), columns)?;
    writer.write(&batch)?;
    Ok(())
}

fn single_u32(v: u32) -> ArrayRef {
    let mut b = UInt32Builder::new();
    b.append_value(v);
    Arc::new(b.finish())
}

impl OutputWriter for ParquetWriter {
    fn write_agent_states(&mut self, rows: &[AgentStateRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut ids         = UInt32Builder::new();
        let mut ticks       = UInt64Builder::new();
        let mut health      = StringBuilder::new();
        let mut role        = StringBuilder::new();
        let mut testing     = StringBuilder::new();
        let mut vaccination = StringBuilder::new();
        let mut doses       = UInt8Builder::new();
        for row in rows {
            ids.append_value(row.agent_id);
            ticks.append_value(row.tick);
            health.append_value(&row.health);
            role.append_value(&row.role);
            testing.append_value(&row.testing);
            vaccination.append_value(&row.vaccination);
            doses.append_value(row.doses);
        }
        write(self.agents.as_mut(), &self.agent_schema, vec![
            Arc::new(ids.finish()),
            Arc::new(ticks.finish()),
            Arc::new(health.finish()),
            Arc::new(role.finish()),
            Arc::new(testing.finish()),
            Arc::new(vaccination.finish()),
            Arc::new(doses.finish()),
        ])
    }

    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()> {
        let mut tick = UInt64Builder::new();
        let mut day = Float64Builder::new();
        let mut cumulative = UInt64Builder::new();
        tick.append_value(row.tick);
        day.append_value(row.day);
        cumulative.append_value(row.cumulative_infections);

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(tick.finish()),
            Arc::new(day.finish()),
            single_u32(row.new_infections),
            Arc::new(cumulative.finish()),
        ];
        for v in [
            row.transitions,
            row.flu_sick,
            row.tests,
            row.new_confirmed,
            row.doses,
            row.traced,
            row.rerouted,
            row.fell_back,
        ] {
            columns.push(single_u32(v));
        }
        write(self.summaries.as_mut(), &self.summary_schema, columns)
    }

    fn write_state_counts(&mut self, rows: &[StateCountRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut ticks      = UInt64Builder::new();
        let mut categories = StringBuilder::new();
        let mut states     = StringBuilder::new();
        let mut counts     = UInt32Builder::new();
        for row in rows {
            ticks.append_value(row.tick);
            categories.append_value(row.category);
            states.append_value(&row.state);
            counts.append_value(row.count);
        }
        write(self.counts.as_mut(), &self.count_schema, vec![
            Arc::new(ticks.finish()),
            Arc::new(categories.finish()),
            Arc::new(states.finish()),
            Arc::new(counts.finish()),
        ])
    }

    fn finish(&mut self) -> OutputResult<()> {
        for w in [self.agents.take(), self.summaries.take(), self.counts.take()].into_iter().flatten() {
            w.close()?;
        }
        Ok(())
    }
}
