//! Function-call rows (`set_xlim | 0 | 10 | layer=insettl`) resolved through a
//! closed command table.

use std::collections::{BTreeMap, VecDeque};

use crate::config::ParseConfig;
use crate::data::model::{Cell, Row, Value};
use crate::error::ParseError;
use crate::spec::{Axis, Directive, Scale};

use super::coerce::{coerce_cell, coerce_str};
use super::schema::MAIN_LAYER;

/// Result of one function-call row.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Title(String),
    Command(Directive),
}

type Handler = fn(&mut Args, &ParseConfig) -> Result<Call, String>;

const COMMANDS: &[(&str, Handler)] = &[
    ("set_title", set_title),
    ("set_xlabel", set_xlabel),
    ("set_ylabel", set_ylabel),
    ("set_xlim", set_xlim),
    ("set_ylim", set_ylim),
    ("set_xscale", set_xscale),
    ("set_yscale", set_yscale),
    ("add_hline", add_hline),
    ("add_vline", add_vline),
    ("add_text", add_text),
];

/// Names accepted in function-call rows.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|(name, _)| *name)
}

/// Parse the function-call row at index `row`.
pub fn parse_call(row: usize, cells: &Row, config: &ParseConfig) -> Result<Call, ParseError> {
    let name = cells
        .first()
        .map(|c| c.to_string().trim().to_ascii_lowercase())
        .unwrap_or_default();
    let handler = COMMANDS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, h)| *h)
        .ok_or_else(|| ParseError::UnknownFunction {
            row,
            name: name.clone(),
        })?;

    let mut args = Args::from_cells(cells.get(1..).unwrap_or_default());
    let call = handler(&mut args, config)
        .and_then(|call| args.finish().map(|_| call))
        .map_err(|reason| ParseError::BadArguments {
            row,
            name: name.clone(),
            reason,
        })?;
    log::debug!("row {}: {call:?}", row + 1);
    Ok(call)
}

// ---------------------------------------------------------------------------
// Argument list
// ---------------------------------------------------------------------------

/// Positional and keyword arguments of a call, consumed by the handlers.
#[derive(Debug, Default)]
struct Args {
    positional: VecDeque<Value>,
    keyword: BTreeMap<String, Value>,
}

impl Args {
    fn from_cells(cells: &[Cell]) -> Self {
        let mut args = Args::default();
        for cell in cells.iter().filter(|c| !c.is_empty()) {
            if let Some((key, value)) = cell.as_text().and_then(keyword_arg) {
                args.keyword.insert(key, value);
            } else {
                args.positional.push_back(coerce_cell(cell));
            }
        }
        args
    }

    fn number(&mut self, what: &str) -> Result<f64, String> {
        match self.positional.pop_front() {
            Some(v) => v.as_f64().ok_or_else(|| format!("{what} must be a number, got '{v}'")),
            None => Err(format!("missing {what}")),
        }
    }

    fn text(&mut self, what: &str) -> Result<String, String> {
        self.positional
            .pop_front()
            .map(|v| v.to_string())
            .ok_or_else(|| format!("missing {what}"))
    }

    fn keyword_text(&mut self, key: &str) -> Option<String> {
        self.keyword.remove(key).map(|v| v.to_string())
    }

    fn layer(&mut self, config: &ParseConfig) -> Result<String, String> {
        match self.keyword_text("layer") {
            None => Ok(MAIN_LAYER.to_string()),
            Some(name) => config
                .resolve_layer(&name)
                .map(|def| def.name.clone())
                .ok_or_else(|| format!("unknown layer '{name}'")),
        }
    }

    fn finish(self) -> Result<(), String> {
        if let Some(extra) = self.positional.front() {
            return Err(format!("unexpected argument '{extra}'"));
        }
        if let Some(key) = self.keyword.keys().next() {
            return Err(format!("unexpected keyword '{key}'"));
        }
        Ok(())
    }
}

/// `key=value` where `key` looks like an identifier; anything else is positional.
fn keyword_arg(text: &str) -> Option<(String, Value)> {
    let (key, value) = text.split_once('=')?;
    let key = key.trim_start().to_ascii_lowercase();
    let is_ident = key.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_ident.then(|| (key, coerce_str(value.trim())))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn set_title(args: &mut Args, _: &ParseConfig) -> Result<Call, String> {
    Ok(Call::Title(args.text("title text")?))
}

fn set_xlabel(args: &mut Args, config: &ParseConfig) -> Result<Call, String> {
    axis_label(args, config, Axis::X)
}

fn set_ylabel(args: &mut Args, config: &ParseConfig) -> Result<Call, String> {
    axis_label(args, config, Axis::Y)
}

fn set_xlim(args: &mut Args, config: &ParseConfig) -> Result<Call, String> {
    limits(args, config, Axis::X)
}

fn set_ylim(args: &mut Args, config: &ParseConfig) -> Result<Call, String> {
    limits(args, config, Axis::Y)
}

fn set_xscale(args: &mut Args, config: &ParseConfig) -> Result<Call, String> {
    scale(args, config, Axis::X)
}

fn set_yscale(args: &mut Args, config: &ParseConfig) -> Result<Call, String> {
    scale(args, config, Axis::Y)
}

fn add_hline(args: &mut Args, config: &ParseConfig) -> Result<Call, String> {
    reference_line(args, config, Axis::Y)
}

fn add_vline(args: &mut Args, config: &ParseConfig) -> Result<Call, String> {
    reference_line(args, config, Axis::X)
}

fn axis_label(args: &mut Args, config: &ParseConfig, axis: Axis) -> Result<Call, String> {
    let label = args.text("label text")?;
    let unit = args.keyword_text("unit");
    Ok(Call::Command(Directive::AxisLabel {
        layer: args.layer(config)?,
        axis,
        label,
        unit,
    }))
}

fn limits(args: &mut Args, config: &ParseConfig, axis: Axis) -> Result<Call, String> {
    let min = args.number("lower limit")?;
    let max = args.number("upper limit")?;
    if min >= max {
        return Err(format!("lower limit {min} is not below upper limit {max}"));
    }
    Ok(Call::Command(Directive::Limits {
        layer: args.layer(config)?,
        axis,
        min,
        max,
    }))
}

fn scale(args: &mut Args, config: &ParseConfig, axis: Axis) -> Result<Call, String> {
    let scale = match args.text("scale")?.trim().to_ascii_lowercase().as_str() {
        "linear" => Scale::Linear,
        "log" => Scale::Log,
        other => return Err(format!("scale must be 'linear' or 'log', got '{other}'")),
    };
    Ok(Call::Command(Directive::Scale {
        layer: args.layer(config)?,
        axis,
        scale,
    }))
}

fn reference_line(args: &mut Args, config: &ParseConfig, axis: Axis) -> Result<Call, String> {
    let value = args.number("position")?;
    let color = args.keyword_text("color");
    Ok(Call::Command(Directive::ReferenceLine {
        layer: args.layer(config)?,
        axis,
        value,
        color,
    }))
}

fn add_text(args: &mut Args, config: &ParseConfig) -> Result<Call, String> {
    let x = args.number("x position")?;
    let y = args.number("y position")?;
    let text = args.text("text")?;
    Ok(Call::Command(Directive::Text {
        layer: args.layer(config)?,
        x,
        y,
        text,
    }))
}
