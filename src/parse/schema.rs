//! The column-schema mini-language and the X/Y/error pairing pass.
//!
//! Grammar of one schema cell:
//!
//! ```text
//! Kind [';' Layer [';' Key '=' Value]*]
//! ```
//!
//! `Kind` is `X`, `Y`, `Xerr` or `Yerr` (case-insensitive). An empty cell,
//! `skip` or `-` marks a column to drop. `\;` escapes a semicolon in a value;
//! a value may not end in a backslash, since that would escape the separator
//! written after it.
//!
//! A row is only recognized as the schema row when its first cell holds a
//! kind token, so the first column cannot be skipped: a row starting with
//! `skip`, `-` or an empty cell is read as a header text row, and the
//! default `X, Y, X, Y, ...` pairing applies.
//!
//! Pairing follows Origin: a Y column binds to the nearest X column on its
//! left, so `X | Y | Y | Yerr` gives two curves sharing the same x data, the
//! second with y error bars.

use crate::config::ParseConfig;
use crate::data::model::Cell;
use crate::error::ParseError;
use crate::spec::{Layer, Placement, Style};

use super::coerce::coerce_str;
use super::header::Header;
use super::split::{escape, split_escaped};

pub const MAIN_LAYER: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    X,
    Y,
    XErr,
    YErr,
    Skip,
}

impl ColumnKind {
    fn parse(head: &str) -> Option<ColumnKind> {
        match head.trim().to_ascii_lowercase().as_str() {
            "x" => Some(ColumnKind::X),
            "y" => Some(ColumnKind::Y),
            "xerr" => Some(ColumnKind::XErr),
            "yerr" => Some(ColumnKind::YErr),
            "" | "skip" | "-" => Some(ColumnKind::Skip),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ColumnKind::X => "X",
            ColumnKind::Y => "Y",
            ColumnKind::XErr => "Xerr",
            ColumnKind::YErr => "Yerr",
            ColumnKind::Skip => "skip",
        }
    }
}

// ---------------------------------------------------------------------------
// SchemaToken
// ---------------------------------------------------------------------------

/// One parsed schema cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaToken {
    pub kind: ColumnKind,
    /// Canonical layer name.
    pub layer: String,
    pub placement: Placement,
    pub style: Style,
}

impl SchemaToken {
    pub fn new(kind: ColumnKind) -> Self {
        SchemaToken {
            kind,
            layer: MAIN_LAYER.to_string(),
            placement: Placement::Main,
            style: Style::new(),
        }
    }

    /// Parse the schema cell in `column`.
    pub fn parse_cell(cell: &Cell, column: usize, config: &ParseConfig) -> Result<Self, ParseError> {
        match cell {
            Cell::Empty => Ok(SchemaToken::new(ColumnKind::Skip)),
            Cell::Text(raw) => SchemaToken::parse(raw, column, config),
            other => Err(ParseError::MalformedKind {
                column,
                token: other.to_string(),
            }),
        }
    }

    pub fn parse(raw: &str, column: usize, config: &ParseConfig) -> Result<Self, ParseError> {
        let parts = split_escaped(raw, ';');
        let kind = ColumnKind::parse(&parts[0]).ok_or_else(|| ParseError::MalformedKind {
            column,
            token: raw.to_string(),
        })?;
        let mut token = SchemaToken::new(kind);
        if kind == ColumnKind::Skip {
            return Ok(token);
        }

        if let Some(name) = parts.get(1).map(|p| p.trim()).filter(|p| !p.is_empty()) {
            let def = config
                .resolve_layer(name)
                .ok_or_else(|| ParseError::UnknownLayer {
                    column,
                    name: name.to_string(),
                })?;
            token.layer = def.name.clone();
            token.placement = def.placement;
        }

        for entry in parts.iter().skip(2).filter(|e| !e.trim().is_empty()) {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| ParseError::MalformedStyle {
                    column,
                    entry: entry.clone(),
                })?;
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() || value.trim().ends_with('\\') {
                return Err(ParseError::MalformedStyle {
                    column,
                    entry: entry.clone(),
                });
            }
            token.style.insert(key, coerce_str(value.trim()));
        }

        Ok(token)
    }

    /// Render back to the cell syntax; re-parsing yields the same layer and style.
    pub fn encode(&self) -> String {
        let mut out = self.kind.as_str().to_string();
        if self.layer != MAIN_LAYER || !self.style.is_empty() {
            out.push(';');
            out.push_str(&self.layer);
        }
        for (key, value) in &self.style {
            out.push(';');
            out.push_str(key);
            out.push('=');
            out.push_str(&escape(&value.to_string(), ';'));
        }
        out
    }
}

/// `X, Y, X, Y, ...` across `width` columns.
pub fn default_schema(width: usize) -> Result<Vec<SchemaToken>, ParseError> {
    if width % 2 != 0 {
        return Err(ParseError::OddColumnCount(width));
    }
    Ok((0..width)
        .map(|c| SchemaToken::new(if c % 2 == 0 { ColumnKind::X } else { ColumnKind::Y }))
        .collect())
}

// ---------------------------------------------------------------------------
// Pairing pass
// ---------------------------------------------------------------------------

/// Columns and metadata for one dataset, before data extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBinding {
    pub x: usize,
    pub x_err: Option<usize>,
    pub y: usize,
    pub y_err: Option<usize>,
    pub layer: String,
    pub label: Option<String>,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interpretation {
    pub bindings: Vec<ColumnBinding>,
    /// First-seen order.
    pub layers: Vec<Layer>,
}

/// Walk the schema left to right with one column of lookahead, emitting one
/// binding per Y column and registering layers as they first appear.
pub fn interpret(header: &Header) -> Result<Interpretation, ParseError> {
    let schema = &header.schema;
    let next_is = |c: usize, kind: ColumnKind| schema.get(c + 1).is_some_and(|t| t.kind == kind);

    let mut out = Interpretation::default();
    let mut current_x: Option<usize> = None;
    let mut current_x_err: Option<usize> = None;
    let mut skip = 0usize;

    for (c, token) in schema.iter().enumerate() {
        if skip > 0 {
            skip -= 1;
            continue;
        }

        match token.kind {
            ColumnKind::X => {
                current_x = Some(c);
                current_x_err = if next_is(c, ColumnKind::XErr) {
                    skip += 1;
                    Some(c + 1)
                } else {
                    None
                };
            }
            ColumnKind::Y => {
                let x = current_x.ok_or(ParseError::YWithoutX { column: c })?;
                let y_err = if next_is(c, ColumnKind::YErr) {
                    skip += 1;
                    Some(c + 1)
                } else {
                    None
                };

                if !out.layers.iter().any(|l| l.name == token.layer) {
                    out.layers.push(Layer {
                        name: token.layer.clone(),
                        placement: token.placement,
                        x_label: cell_text(&header.labels, x),
                        y_label: cell_text(&header.labels, c),
                        x_unit: cell_text(&header.units, x),
                        y_unit: cell_text(&header.units, c),
                        color: token.style.get("color").map(ToString::to_string),
                    });
                }

                let label = Some(cell_text(&header.legend, c)).filter(|l| !l.is_empty());
                log::debug!(
                    "dataset {}: x={x} x_err={current_x_err:?} y={c} y_err={y_err:?} layer={}",
                    out.bindings.len(),
                    token.layer
                );
                out.bindings.push(ColumnBinding {
                    x,
                    x_err: current_x_err,
                    y: c,
                    y_err,
                    layer: token.layer.clone(),
                    label,
                    style: token.style.clone(),
                });
            }
            ColumnKind::XErr | ColumnKind::YErr => {
                log::debug!("column {}: error column without a value column, ignored", c + 1);
            }
            ColumnKind::Skip => {}
        }
    }

    Ok(out)
}

fn cell_text(row: &[Cell], column: usize) -> String {
    row.get(column).map(|c| c.to_string().trim().to_string()).unwrap_or_default()
}
