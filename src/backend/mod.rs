/// Plotting backend boundary.
///
/// A [`PlotSpec`] is handed to a backend as a fixed sequence of calls made by
/// [`draw`]:
///
/// ```text
///   settings → layers → series → title → axis labels / legends
///            → directives → render → save
/// ```
///
/// The `main` layer always exists and is never added explicitly.
pub mod recorder;

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::spec::{Axis, Dataset, Directive, OutputMode, Placement, PlotSpec, SettingsBundle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegendLocation {
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
}

impl LegendLocation {
    const CYCLE: [LegendLocation; 4] = [
        LegendLocation::UpperRight,
        LegendLocation::UpperLeft,
        LegendLocation::LowerLeft,
        LegendLocation::LowerRight,
    ];

    /// Legend location for the `index`-th layer, so legends of different
    /// layers do not pile up in one corner.
    pub fn for_layer(index: usize) -> Self {
        Self::CYCLE[index % Self::CYCLE.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Pdf,
}

/// Resolution used for the temporary raster image.
pub const TEMPORARY_IMAGE_DPI: u32 = 80;
/// Resolution used for PDF export.
pub const PDF_DPI: u32 = 300;

/// The calls a renderer has to understand.
pub trait PlotBackend {
    fn apply_setting(&mut self, bundle: &SettingsBundle) -> Result<()>;
    fn add_layer(&mut self, name: &str, placement: Placement) -> Result<()>;
    fn add_series(&mut self, dataset: &Dataset) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
    fn set_axis_label(
        &mut self,
        layer: &str,
        axis: Axis,
        label: &str,
        unit: &str,
        color: Option<&str>,
    ) -> Result<()>;
    fn set_legend(&mut self, enabled: bool, location: LegendLocation, layer: &str) -> Result<()>;
    fn apply_directive(&mut self, directive: &Directive) -> Result<()>;
    fn render(&mut self) -> Result<()>;
    /// `path == None` lets the backend pick: a temporary file for images, a
    /// file chooser for PDFs.
    fn save(&mut self, path: Option<&Path>, format: ImageFormat, dpi: u32) -> Result<()>;
}

/// Issue the backend calls for `spec`, in order.
pub fn draw<B: PlotBackend + ?Sized>(spec: &PlotSpec, backend: &mut B) -> Result<()> {
    for bundle in &spec.settings {
        backend.apply_setting(bundle)?;
    }
    for layer in spec.layers.iter().filter(|l| l.placement != Placement::Main) {
        backend.add_layer(&layer.name, layer.placement)?;
    }
    for dataset in &spec.datasets {
        backend.add_series(dataset)?;
    }
    if let Some(title) = &spec.title {
        backend.set_title(title)?;
    }
    for (i, layer) in spec.layers.iter().enumerate() {
        let color = layer.color.as_deref();
        backend.set_axis_label(&layer.name, Axis::X, &layer.x_label, &layer.x_unit, color)?;
        backend.set_axis_label(&layer.name, Axis::Y, &layer.y_label, &layer.y_unit, color)?;
        if spec.legend_enabled {
            backend.set_legend(true, LegendLocation::for_layer(i), &layer.name)?;
        }
    }
    for directive in &spec.directives {
        backend.apply_directive(directive)?;
    }

    backend.render()?;

    match &spec.output {
        OutputMode::Display => Ok(()),
        OutputMode::SaveTemporaryImage => backend.save(None, ImageFormat::Png, TEMPORARY_IMAGE_DPI),
        OutputMode::SavePdf { path } => backend.save(path.as_deref(), ImageFormat::Pdf, PDF_DPI),
    }
}

#[cfg(test)]
mod tests {
    use super::recorder::{BackendCall, RecordingBackend};
    use super::*;
    use crate::config::ParseConfig;
    use crate::data::model::Selection;
    use crate::parse::parse_selection;
    use crate::spec::Corner;
    use std::path::PathBuf;

    fn spec(records: &[&[&str]]) -> PlotSpec {
        let selection = Selection::from_records(records.iter().map(|r| r.iter()));
        parse_selection(&selection, &ParseConfig::default()).unwrap()
    }

    #[test]
    fn test_legend_location_cycle() {
        assert_eq!(LegendLocation::for_layer(0), LegendLocation::UpperRight);
        assert_eq!(LegendLocation::for_layer(3), LegendLocation::LowerRight);
        assert_eq!(LegendLocation::for_layer(4), LegendLocation::UpperRight);
    }

    #[test]
    fn test_call_order() {
        let spec = spec(&[
            &["title", "T", "", ""],
            &["settings", "grid", "", ""],
            &["set_ylim", "0", "10", ""],
            &["a", "b", "c", "d"],
            &["u", "v", "w", "z"],
            &["", "one", "", "two"],
            &["X", "Y", "X;insetbl", "Y;insetbl"],
            &["1", "2", "3", "4"],
            &["2", "3", "4", "5"],
        ]);
        let mut backend = RecordingBackend::default();
        draw(&spec, &mut backend).unwrap();

        let calls = backend.calls;
        assert_eq!(calls[0], BackendCall::ApplySetting("grid".into()));
        assert_eq!(
            calls[1],
            BackendCall::AddLayer("inset-bottom-left".into(), Placement::Inset(Corner::BottomLeft))
        );
        assert!(matches!(&calls[2], BackendCall::AddSeries { layer, label, .. }
            if layer == "main" && label.as_deref() == Some("one")));
        assert!(matches!(&calls[3], BackendCall::AddSeries { layer, .. } if layer == "inset-bottom-left"));
        assert_eq!(calls[4], BackendCall::SetTitle("T".into()));
        assert_eq!(
            calls[5],
            BackendCall::SetAxisLabel {
                layer: "main".into(),
                axis: Axis::X,
                label: "a".into(),
                unit: "u".into(),
                color: None
            }
        );
        assert_eq!(
            calls[7],
            BackendCall::SetLegend(true, LegendLocation::UpperRight, "main".into())
        );
        assert_eq!(
            calls[10],
            BackendCall::SetLegend(true, LegendLocation::UpperLeft, "inset-bottom-left".into())
        );
        assert!(matches!(calls[11], BackendCall::ApplyDirective(Directive::Limits { .. })));
        assert_eq!(calls[12], BackendCall::Render);
        assert_eq!(
            calls[13],
            BackendCall::Save(None, ImageFormat::Png, TEMPORARY_IMAGE_DPI)
        );
        assert_eq!(calls.len(), 14);
    }

    #[test]
    fn test_display_mode_skips_save() {
        let spec = spec(&[&["show", ""], &["1", "2"], &["2", "3"]]);
        let mut backend = RecordingBackend::default();
        draw(&spec, &mut backend).unwrap();
        assert_eq!(backend.calls.last(), Some(&BackendCall::Render));
        assert!(!backend.calls.iter().any(|c| matches!(c, BackendCall::SetLegend(..))));
    }

    #[test]
    fn test_pdf_mode_passes_path() {
        let spec = spec(&[&["pdf", "report"], &["1", "2"], &["2", "3"]]);
        let mut backend = RecordingBackend::default();
        draw(&spec, &mut backend).unwrap();
        assert_eq!(
            backend.calls.last(),
            Some(&BackendCall::Save(Some(PathBuf::from("report.pdf")), ImageFormat::Pdf, PDF_DPI))
        );
    }

    #[test]
    fn test_backend_error_stops_drawing() {
        let spec = spec(&[&["1", "2"], &["2", "3"]]);
        let mut backend = RecordingBackend {
            fail_on_render: true,
            ..RecordingBackend::default()
        };
        assert!(draw(&spec, &mut backend).is_err());
        assert!(!backend.calls.iter().any(|c| matches!(c, BackendCall::Save(..))));
    }
}
