use crate::data::model::{Cell, Row, Selection};
use crate::error::ParseError;

/// What a row of the selection is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRole {
    Blank,
    Title,
    Settings,
    Pdf,
    Show,
    FunctionCall,
    Schema,
    Label,
    Units,
    Legend,
    Data,
}

impl RowRole {
    fn is_free_text(self) -> bool {
        matches!(self, RowRole::Label | RowRole::Units | RowRole::Legend)
    }
}

const SCHEMA_KINDS: [&str; 4] = ["x", "y", "xerr", "yerr"];

/// Assign a role to every row, top to bottom. The first data row and
/// everything below it are `Data`.
pub fn classify_rows(selection: &Selection) -> Result<Vec<RowRole>, ParseError> {
    let rows = selection.rows();
    let mut roles = Vec::with_capacity(rows.len());
    let mut last_free_text = None;

    for (i, row) in rows.iter().enumerate() {
        let next_first = rows.get(i + 1).and_then(|r| r.first());
        let role = classify_row(row, next_first, last_free_text);
        log::debug!("row {}: {role:?}", i + 1);

        if role == RowRole::Data {
            roles.resize(rows.len(), RowRole::Data);
            return Ok(roles);
        }
        if role.is_free_text() {
            last_free_text = Some(role);
        }
        roles.push(role);
    }

    Err(ParseError::NoDataRows)
}

fn classify_row(row: &Row, next_first: Option<&Cell>, last_free_text: Option<RowRole>) -> RowRole {
    let Some(first) = row.first() else {
        return RowRole::Blank;
    };
    if row.iter().all(Cell::is_empty) {
        return RowRole::Blank;
    }

    let keyword = first.as_text().map(|t| t.trim().to_ascii_lowercase());
    match keyword.as_deref() {
        Some("settings") => return RowRole::Settings,
        Some("title") => return RowRole::Title,
        Some("pdf") => return RowRole::Pdf,
        Some("show") => return RowRole::Show,
        Some(k) if k.starts_with("set_") || k.starts_with("add_") => return RowRole::FunctionCall,
        _ => {}
    }

    if first.as_number().is_some() && next_first.and_then(Cell::as_number).is_some() {
        return RowRole::Data;
    }

    if keyword.as_deref().is_some_and(is_schema_keyword) {
        return RowRole::Schema;
    }

    match last_free_text {
        None => RowRole::Label,
        Some(RowRole::Label) => RowRole::Units,
        Some(RowRole::Units) => RowRole::Legend,
        Some(_) => RowRole::Label,
    }
}

fn is_schema_keyword(text: &str) -> bool {
    SCHEMA_KINDS.iter().any(|kind| {
        text == *kind
            || text
                .strip_prefix(kind)
                .is_some_and(|rest| rest.starts_with(';'))
    })
}
