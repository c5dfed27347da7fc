// Columnar output.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use precinct_metrics::turnout::{TurnoutSupport, TURNOUT_COLUMNS};
use precinct_metrics::METRIC_COLUMNS;

use crate::pm::*;

fn utf8<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

fn int64(values: impl Iterator<Item = i64>) -> ArrayRef {
    Arc::new(Int64Array::from_iter_values(values))
}

fn float64(values: impl Iterator<Item = f64>) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(values))
}

fn make_schema(columns: &[&str], types: &[DataType]) -> Arc<Schema> {
    let fields: Vec<Field> = columns
        .iter()
        .zip(types.iter())
        .map(|(name, dt)| Field::new(*name, dt.clone(), false))
        .collect();
    Arc::new(Schema::new(fields))
}

pub fn metrics_to_batch(rows: &[PrecinctMetric]) -> PmResult<RecordBatch> {
    let schema = make_schema(
        &METRIC_COLUMNS,
        &[
            DataType::Utf8,
            DataType::Utf8,
            DataType::Int64,
            DataType::Int64,
            DataType::Utf8,
            DataType::Utf8,
            DataType::Float64,
            DataType::Utf8,
        ],
    );
    let columns: Vec<ArrayRef> = vec![
        utf8(rows.iter().map(|r| r.precinct_id.as_str())),
        utf8(rows.iter().map(|r| r.precinct_name.as_str())),
        int64(rows.iter().map(|r| r.election_year)),
        int64(rows.iter().map(|r| r.total_votes)),
        utf8(rows.iter().map(|r| r.candidate.as_str())),
        utf8(rows.iter().map(|r| r.candidate_party.as_str())),
        float64(rows.iter().map(|r| r.support_percent)),
        utf8(rows.iter().map(|r| r.state.as_str())),
    ];
    RecordBatch::try_new(schema, columns).context(ArrowSnafu {})
}

pub fn turnout_to_batch(rows: &[TurnoutSupport]) -> PmResult<RecordBatch> {
    let schema = make_schema(
        &TURNOUT_COLUMNS,
        &[
            DataType::Utf8,
            DataType::Utf8,
            DataType::Int64,
            DataType::Utf8,
            DataType::Int64,
            DataType::Int64,
            DataType::Float64,
            DataType::Float64,
            DataType::Float64,
        ],
    );
    let columns: Vec<ArrayRef> = vec![
        utf8(rows.iter().map(|r| r.precinct_id.as_str())),
        utf8(rows.iter().map(|r| r.precinct_name.as_str())),
        int64(rows.iter().map(|r| r.election_year)),
        utf8(rows.iter().map(|r| r.state.as_str())),
        int64(rows.iter().map(|r| r.total_votes)),
        int64(rows.iter().map(|r| r.registered_voters)),
        float64(rows.iter().map(|r| r.turnout_percent)),
        float64(rows.iter().map(|r| r.dem_support_percent)),
        float64(rows.iter().map(|r| r.rep_support_percent)),
    ];
    RecordBatch::try_new(schema, columns).context(ArrowSnafu {})
}

pub fn write_parquet(path: &Path, batch: &RecordBatch) -> PmResult<()> {
    let path_s = path.display().to_string();
    let file = File::create(path).context(WritingOutputSnafu {
        path: path_s.clone(),
    })?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).context(ParquetSnafu {
        path: path_s.clone(),
    })?;
    writer.write(batch).context(ParquetSnafu {
        path: path_s.clone(),
    })?;
    writer.close().context(ParquetSnafu { path: path_s })?;
    debug!(
        "write_parquet: wrote {} rows to {}",
        batch.num_rows(),
        path.display()
    );
    Ok(())
}
