use thiserror::Error;

/// Broad family of a [`ParseError`]. All of them abort the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Grid shape problems: ragged rows, missing data, bad pairing.
    Structural,
    /// Bad schema cells: unknown kinds, layers or style entries.
    Schema,
    /// Function-call rows the command table cannot handle.
    Directive,
}

/// Why a selection could not be turned into a plot.
///
/// Rows and columns are reported 1-based, as a spreadsheet user counts them.
/// Column numbers refer to the selection after skipped columns are removed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("selection is empty")]
    EmptySelection,

    #[error("row {} has {found} columns, expected {expected}", .row + 1)]
    ColumnCountMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("no data rows found (data starts at two consecutive rows beginning with a number)")]
    NoDataRows,

    #[error("no schema row and an odd number of columns ({0}); cannot pair X/Y columns")]
    OddColumnCount(usize),

    #[error("column {}: Y column has no preceding X column", .column + 1)]
    YWithoutX { column: usize },

    #[error("column {}: unknown layer '{name}'", .column + 1)]
    UnknownLayer { column: usize, name: String },

    #[error("column {}: malformed schema token '{token}' (expected X, Y, Xerr, Yerr or skip)", .column + 1)]
    MalformedKind { column: usize, token: String },

    #[error("column {}: malformed style entry '{entry}' (expected key=value)", .column + 1)]
    MalformedStyle { column: usize, entry: String },

    #[error("row {}: unknown function '{name}'", .row + 1)]
    UnknownFunction { row: usize, name: String },

    #[error("row {}: {name}: {reason}", .row + 1)]
    BadArguments {
        row: usize,
        name: String,
        reason: String,
    },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::EmptySelection
            | ParseError::ColumnCountMismatch { .. }
            | ParseError::NoDataRows
            | ParseError::OddColumnCount(_)
            | ParseError::YWithoutX { .. } => ErrorKind::Structural,
            ParseError::UnknownLayer { .. }
            | ParseError::MalformedKind { .. }
            | ParseError::MalformedStyle { .. } => ErrorKind::Schema,
            ParseError::UnknownFunction { .. } | ParseError::BadArguments { .. } => {
                ErrorKind::Directive
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_one_based() {
        let err = ParseError::UnknownLayer {
            column: 2,
            name: "bogus".into(),
        };
        assert_eq!(err.to_string(), "column 3: unknown layer 'bogus'");
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ParseError::NoDataRows.kind(), ErrorKind::Structural);
        let err = ParseError::UnknownFunction {
            row: 0,
            name: "set_foo".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Directive);
        assert_eq!(err.to_string(), "row 1: unknown function 'set_foo'");
    }
}
