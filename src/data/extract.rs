use crate::parse::schema::ColumnBinding;
use crate::spec::Dataset;

use super::model::{Cell, Row};

// ---------------------------------------------------------------------------
// Column extraction
// ---------------------------------------------------------------------------

/// Transpose one column of the row-major data block.
fn column(data: &[Row], index: usize) -> Vec<&Cell> {
    data.iter().filter_map(|row| row.get(index)).collect()
}

/// `Some(0.0)` for a bound but non-numeric error value, `None` when unbound.
fn error_at(errs: &Option<Vec<&Cell>>, i: usize) -> Option<f64> {
    errs.as_ref()
        .map(|col| col.get(i).and_then(|c| c.as_number()).unwrap_or(0.0))
}

/// Cleaned numeric series for one binding.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub x_err: Option<Vec<f64>>,
    pub y_err: Option<Vec<f64>>,
}

/// Extract and clean the columns of `binding` from the data block.
///
/// Trailing rows with an empty X cell are trimmed first. A row is then kept
/// only when both X and Y are numeric; error values that are not numeric
/// become `0.0`. Unbound error columns stay `None`.
pub fn extract_series(data: &[Row], binding: &ColumnBinding) -> Series {
    let xs = column(data, binding.x);
    let ys = column(data, binding.y);
    let x_errs = binding.x_err.map(|c| column(data, c));
    let y_errs = binding.y_err.map(|c| column(data, c));

    let end = xs.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
    if end < xs.len() {
        log::debug!("trimmed {} trailing rows with empty x", xs.len() - end);
    }

    let mut series = Series {
        x_err: x_errs.as_ref().map(|_| Vec::new()),
        y_err: y_errs.as_ref().map(|_| Vec::new()),
        ..Series::default()
    };
    let mut dropped = 0usize;

    for i in 0..end {
        let (Some(x), Some(y)) = (
            xs.get(i).and_then(|c| c.as_number()),
            ys.get(i).and_then(|c| c.as_number()),
        ) else {
            dropped += 1;
            continue;
        };
        series.x.push(x);
        series.y.push(y);
        if let (Some(out), Some(v)) = (series.x_err.as_mut(), error_at(&x_errs, i)) {
            out.push(v);
        }
        if let (Some(out), Some(v)) = (series.y_err.as_mut(), error_at(&y_errs, i)) {
            out.push(v);
        }
    }

    if dropped > 0 {
        log::warn!(
            "column {}: dropped {dropped} rows without numeric x/y",
            binding.y + 1
        );
    }
    series
}

/// Combine a binding with its cleaned series.
pub fn build_dataset(data: &[Row], binding: ColumnBinding) -> Dataset {
    let series = extract_series(data, &binding);
    Dataset {
        x_column: binding.x,
        x_err_column: binding.x_err,
        y_column: binding.y,
        y_err_column: binding.y_err,
        layer: binding.layer,
        label: binding.label,
        style: binding.style,
        x: series.x,
        y: series.y,
        x_err: series.x_err,
        y_err: series.y_err,
    }
}
