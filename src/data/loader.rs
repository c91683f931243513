use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Cell, Row, Selection};

/// Rows whose first cell starts with this marker never reach the parser.
pub const IGNORE_MARKER: char = '#';

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a selection grid from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – one spreadsheet row per record, ragged rows are padded
/// * `.json`    – `[[cell, cell, ...], ...]` with strings, numbers, bools, nulls
/// * `.parquet` – every record becomes a row, columns in schema order
pub fn load_selection(path: &Path) -> Result<Selection> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let selection = Selection::new(rectangular(drop_ignored(rows)));
    log::info!(
        "Loaded {} rows x {} columns from {}",
        selection.len(),
        selection.width(),
        path.display()
    );
    Ok(selection)
}

/// Drop rows marked with [`IGNORE_MARKER`].
fn drop_ignored(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter()
        .filter(|row| {
            let ignored = row
                .first()
                .and_then(Cell::as_text)
                .is_some_and(|t| t.trim_start().starts_with(IGNORE_MARKER));
            if ignored {
                log::debug!("skipping ignored row {row:?}");
            }
            !ignored
        })
        .collect()
}

/// Pad every row with empty cells up to the widest row, as a spreadsheet
/// range would be.
fn rectangular(mut rows: Vec<Row>) -> Vec<Row> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, Cell::Empty);
    }
    rows
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// No header row: the first record is the first grid row.
fn load_csv(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;
        rows.push(record.iter().map(Cell::field).collect());
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON layout (row-major, as a spreadsheet range is read):
///
/// ```json
/// [
///   ["Time", "Signal"],
///   ["s",    "V"],
///   [0.0,    1.2],
///   [0.5,    null]
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<Row>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let cells = rec
                .as_array()
                .with_context(|| format!("Row {i} is not a JSON array"))?;
            Ok(cells.iter().map(json_to_cell).collect())
        })
        .collect()
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::field(s),
        JsonValue::Number(n) => n.as_f64().map_or_else(|| Cell::Text(n.to_string()), Cell::Number),
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Null => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file as a grid. Header rows mixed with numbers usually
/// force string columns; those cells keep their text like CSV fields.
fn load_parquet(path: &Path) -> Result<Vec<Row>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch.columns();

        for row in 0..batch.num_rows() {
            let cells = columns
                .iter()
                .enumerate()
                .map(|(c, col)| {
                    extract_cell(col, row)
                        .with_context(|| format!("Row {row}, column {c}: failed to read cell"))
                })
                .collect::<Result<Row>>()?;
            rows.push(cells);
        }
    }

    Ok(rows)
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<Cell> {
    if col.is_null(row) {
        return Ok(Cell::Empty);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Cell::field(arr.value(row))
        }
        DataType::LargeUtf8 => Cell::field(col.as_string::<i64>().value(row)),
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Cell::Number(arr.value(row) as f64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Cell::Number(arr.value(row) as f64)
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            Cell::Number(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            Cell::Number(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            Cell::Bool(arr.value(row))
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_csv_rows_are_padded_and_filtered() {
        let file = write_temp(
            ".csv",
            "Time,Signal\n# scratch row,ignored,extra\nX,Y\n1,2\n2,3,\n",
        );
        let sel = load_selection(file.path()).unwrap();
        assert_eq!(sel.len(), 4);
        assert_eq!(sel.width(), 3);
        assert_eq!(sel.rows()[0][2], Cell::Empty);
        assert_eq!(sel.rows()[2][0], Cell::Text("1".into()));
    }

    #[test]
    fn test_json_grid() {
        let file = write_temp(".json", r#"[["t", "v"], ["X", "Y"], [0, 1.5], [1, null], [true, "2"]]"#);
        let sel = load_selection(file.path()).unwrap();
        assert_eq!(sel.len(), 5);
        assert_eq!(sel.rows()[2][1], Cell::Number(1.5));
        assert_eq!(sel.rows()[3][1], Cell::Empty);
        assert_eq!(sel.rows()[4][0], Cell::Bool(true));
        assert_eq!(sel.rows()[4][1], Cell::Text("2".into()));
    }

    #[test]
    fn test_json_rejects_objects() {
        let file = write_temp(".json", r#"[{"x": 1}]"#);
        assert!(load_selection(file.path()).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".xlsx", "");
        let err = load_selection(file.path()).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn test_parquet_grid() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Utf8, true),
            Field::new("b", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("X"), Some("1"), None])),
                Arc::new(Float64Array::from(vec![None, Some(2.0), Some(3.0)])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let sel = load_selection(file.path()).unwrap();
        assert_eq!(sel.len(), 3);
        assert_eq!(sel.rows()[0], vec![Cell::Text("X".into()), Cell::Empty]);
        assert_eq!(sel.rows()[1], vec![Cell::Text("1".into()), Cell::Number(2.0)]);
        assert_eq!(sel.rows()[2][0], Cell::Empty);
    }
}
