//! The resolved plot description produced by the parser.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::data::model::Value;

/// Per-dataset style overrides (`color`, `linewidth`, ...).
pub type Style = BTreeMap<String, Value>;

// ---------------------------------------------------------------------------
// Layer placement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Where a layer's axes live relative to the main plot.
///
/// `Twin(Axis::X)` shares the main x axis and gets its own y axis;
/// `Twin(Axis::Y)` shares the main y axis and gets its own x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    Main,
    Inset(Corner),
    Twin(Axis),
}

// ---------------------------------------------------------------------------
// Layer / Dataset
// ---------------------------------------------------------------------------

/// A named axis surface. Labels, units and colour are fixed by the first
/// dataset that references the layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub placement: Placement,
    pub x_label: String,
    pub y_label: String,
    pub x_unit: String,
    pub y_unit: String,
    pub color: Option<String>,
}

/// One bound X/Y pairing with its cleaned series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub x_column: usize,
    pub x_err_column: Option<usize>,
    pub y_column: usize,
    pub y_err_column: Option<usize>,
    pub layer: String,
    pub label: Option<String>,
    pub style: Style,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub x_err: Option<Vec<f64>>,
    pub y_err: Option<Vec<f64>>,
}

impl Dataset {
    /// Number of retained points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Global directives
// ---------------------------------------------------------------------------

/// A named bundle of backend options selected by a `settings` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsBundle {
    pub name: String,
    pub options: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Linear,
    Log,
}

/// A typed function-call row (`set_xlim`, `add_hline`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Directive {
    Limits {
        layer: String,
        axis: Axis,
        min: f64,
        max: f64,
    },
    Scale {
        layer: String,
        axis: Axis,
        scale: Scale,
    },
    AxisLabel {
        layer: String,
        axis: Axis,
        label: String,
        unit: Option<String>,
    },
    /// A horizontal (`axis == Y`) or vertical (`axis == X`) reference line
    /// at `value` on the given axis.
    ReferenceLine {
        layer: String,
        axis: Axis,
        value: f64,
        color: Option<String>,
    },
    Text {
        layer: String,
        x: f64,
        y: f64,
        text: String,
    },
}

impl Directive {
    pub fn layer(&self) -> &str {
        match self {
            Directive::Limits { layer, .. }
            | Directive::Scale { layer, .. }
            | Directive::AxisLabel { layer, .. }
            | Directive::ReferenceLine { layer, .. }
            | Directive::Text { layer, .. } => layer,
        }
    }
}

/// What happens with the rendered figure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    Display,
    #[default]
    SaveTemporaryImage,
    /// `path == None` defers the file name to a file chooser.
    SavePdf { path: Option<PathBuf> },
}

// ---------------------------------------------------------------------------
// PlotSpec
// ---------------------------------------------------------------------------

/// The fully resolved, ready-to-render plot description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotSpec {
    pub title: Option<String>,
    pub settings: Vec<SettingsBundle>,
    /// In first-seen order; legend locations are assigned by position.
    pub layers: Vec<Layer>,
    pub datasets: Vec<Dataset>,
    pub directives: Vec<Directive>,
    pub legend_enabled: bool,
    pub output: OutputMode,
}

impl PlotSpec {
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Datasets drawn on the named layer, in order.
    pub fn datasets_on<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a Dataset> + 'a {
        self.datasets.iter().filter(move |d| d.layer == layer)
    }
}
