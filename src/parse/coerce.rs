use crate::data::model::{Cell, Value};

/// Coerce raw text: `true`/`false` → bool, whole numbers → int, other
/// numbers → float, anything else stays text (untrimmed).
pub fn coerce_str(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    match trimmed.parse::<f64>() {
        Ok(v) => number(v),
        Err(_) => Value::Text(raw.to_string()),
    }
}

/// Coerce a grid cell. Number cells follow the same int/float rule as text.
pub fn coerce_cell(cell: &Cell) -> Value {
    match cell {
        Cell::Empty => Value::Text(String::new()),
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Number(v) => number(*v),
        Cell::Text(s) => coerce_str(s),
    }
}

fn number(v: f64) -> Value {
    // i64 range check keeps huge floats from saturating
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e18 {
        Value::Int(v as i64)
    } else {
        Value::Float(v)
    }
}
