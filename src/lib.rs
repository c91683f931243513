//! Spreadsheet selections to layered plot specifications.
//!
//! A [`data::model::Selection`] (a rectangular grid of cells) is parsed by
//! [`parse::parse_selection`] into a [`spec::PlotSpec`], which any
//! [`backend::PlotBackend`] can draw. The egui viewer in [`ui`] is one such
//! backend.

pub mod app;
pub mod backend;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod parse;
pub mod spec;
pub mod state;
pub mod ui;

pub use config::ParseConfig;
pub use error::{ErrorKind, ParseError};
pub use parse::parse_selection;
pub use spec::PlotSpec;
