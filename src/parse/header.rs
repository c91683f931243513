use std::path::PathBuf;

use crate::config::ParseConfig;
use crate::data::model::{Cell, Row, Selection};
use crate::error::ParseError;
use crate::spec::{Directive, OutputMode, SettingsBundle};

use super::classify::RowRole;
use super::directive::{parse_call, Call};
use super::schema::{default_schema, ColumnKind, SchemaToken};
use super::split::split_escaped;

/// The canonical four header rows, all as wide as the data block.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub labels: Row,
    pub units: Row,
    pub legend: Row,
    pub schema: Vec<SchemaToken>,
}

/// Selection-wide directives gathered from keyword rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlobalDirectives {
    pub title: Option<String>,
    pub settings: Vec<SettingsBundle>,
    pub output: OutputMode,
    pub legend_enabled: bool,
    pub commands: Vec<Directive>,
}

/// Header, data block and directives after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub header: Header,
    pub data: Vec<Row>,
    pub directives: GlobalDirectives,
}

/// Every row must be as wide as the first.
pub fn check_shape(selection: &Selection) -> Result<(), ParseError> {
    if selection.is_empty() {
        return Err(ParseError::EmptySelection);
    }
    let expected = selection.width();
    for (row, cells) in selection.rows().iter().enumerate() {
        if cells.len() != expected {
            return Err(ParseError::ColumnCountMismatch {
                row,
                expected,
                found: cells.len(),
            });
        }
    }
    Ok(())
}

/// Assemble the canonical header and the data block from classified rows.
pub fn normalize(
    selection: &Selection,
    roles: &[RowRole],
    config: &ParseConfig,
) -> Result<Normalized, ParseError> {
    let width = selection.width();
    let mut labels = None;
    let mut units = None;
    let mut legend = None;
    let mut schema_row = None;
    let mut data = Vec::new();
    let mut directives = GlobalDirectives::default();

    for (i, (row, role)) in selection.rows().iter().zip(roles).enumerate() {
        match role {
            RowRole::Blank => {}
            RowRole::Title => directives.title = Some(second_cell(row)),
            RowRole::Settings => directives.settings = parse_settings(row, config),
            RowRole::Pdf => directives.output = OutputMode::SavePdf { path: pdf_target(row) },
            RowRole::Show => directives.output = OutputMode::Display,
            RowRole::FunctionCall => match parse_call(i, row, config)? {
                Call::Title(title) => directives.title = Some(title),
                Call::Command(cmd) => directives.commands.push(cmd),
            },
            RowRole::Schema => schema_row = Some(row),
            RowRole::Label => replace_header_row(&mut labels, row, "label", i),
            RowRole::Units => replace_header_row(&mut units, row, "units", i),
            RowRole::Legend => replace_header_row(&mut legend, row, "legend", i),
            RowRole::Data => data.push(row.clone()),
        }
    }

    directives.legend_enabled = legend.is_some();

    let schema = match schema_row {
        Some(row) => row
            .iter()
            .enumerate()
            .map(|(c, cell)| SchemaToken::parse_cell(cell, c, config))
            .collect::<Result<Vec<_>, _>>()?,
        None => {
            log::debug!("no schema row, pairing {width} columns as X,Y,...");
            default_schema(width)?
        }
    };

    let blank = || vec![Cell::Empty; width];
    let mut header = Header {
        labels: labels.unwrap_or_else(blank),
        units: units.unwrap_or_else(blank),
        legend: legend.unwrap_or_else(blank),
        schema,
    };
    drop_skipped_columns(&mut header, &mut data);

    Ok(Normalized {
        header,
        data,
        directives,
    })
}

fn replace_header_row(slot: &mut Option<Row>, row: &Row, what: &str, index: usize) {
    if slot.is_some() {
        log::debug!("row {}: replaces earlier {what} row", index + 1);
    }
    *slot = Some(row.clone());
}

/// Remove `Skip` columns from the header rows and the data block.
fn drop_skipped_columns(header: &mut Header, data: &mut [Row]) {
    let keep: Vec<bool> = header.schema.iter().map(|t| t.kind != ColumnKind::Skip).collect();
    if keep.iter().all(|k| *k) {
        return;
    }
    log::debug!("dropping {} skipped columns", keep.iter().filter(|k| !**k).count());

    fn retain<T>(items: &mut Vec<T>, keep: &[bool]) {
        let mut flags = keep.iter();
        items.retain(|_| *flags.next().unwrap_or(&true));
    }

    retain(&mut header.schema, &keep);
    retain(&mut header.labels, &keep);
    retain(&mut header.units, &keep);
    retain(&mut header.legend, &keep);
    for row in data.iter_mut() {
        retain(row, &keep);
    }
}

fn second_cell(row: &Row) -> String {
    row.get(1).map(|c| c.to_string().trim().to_string()).unwrap_or_default()
}

/// Settings names may be spread over several cells, separated by `;` or `,`.
fn parse_settings(row: &Row, config: &ParseConfig) -> Vec<SettingsBundle> {
    let joined = row
        .iter()
        .skip(1)
        .filter(|c| !c.is_empty())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";");

    let mut bundles: Vec<SettingsBundle> = Vec::new();
    for part in split_escaped(&joined, ';') {
        for name in split_escaped(&part, ',') {
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() || bundles.iter().any(|b| b.name == name) {
                continue;
            }
            match config.setting(&name) {
                Some(bundle) => bundles.push(bundle),
                None => log::warn!("unknown settings name '{name}', ignored"),
            }
        }
    }
    bundles
}

/// `None` defers the choice of file to the output stage.
fn pdf_target(row: &Row) -> Option<PathBuf> {
    let name = second_cell(row);
    if name.is_empty() {
        return None;
    }
    if name.to_ascii_lowercase().ends_with(".pdf") {
        Some(PathBuf::from(name))
    } else {
        Some(PathBuf::from(format!("{name}.pdf")))
    }
}
