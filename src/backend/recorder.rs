use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use super::{ImageFormat, LegendLocation, PlotBackend};
use crate::spec::{Axis, Dataset, Directive, Placement, SettingsBundle};

/// One call received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    ApplySetting(String),
    AddLayer(String, Placement),
    AddSeries {
        layer: String,
        label: Option<String>,
        points: usize,
    },
    SetTitle(String),
    SetAxisLabel {
        layer: String,
        axis: Axis,
        label: String,
        unit: String,
        color: Option<String>,
    },
    SetLegend(bool, LegendLocation, String),
    ApplyDirective(Directive),
    Render,
    Save(Option<PathBuf>, ImageFormat, u32),
}

/// Backend that only records what it is asked to do.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    /// Make `render` fail, to exercise error propagation.
    pub fail_on_render: bool,
}

impl PlotBackend for RecordingBackend {
    fn apply_setting(&mut self, bundle: &SettingsBundle) -> Result<()> {
        self.calls.push(BackendCall::ApplySetting(bundle.name.clone()));
        Ok(())
    }

    fn add_layer(&mut self, name: &str, placement: Placement) -> Result<()> {
        self.calls.push(BackendCall::AddLayer(name.to_string(), placement));
        Ok(())
    }

    fn add_series(&mut self, dataset: &Dataset) -> Result<()> {
        self.calls.push(BackendCall::AddSeries {
            layer: dataset.layer.clone(),
            label: dataset.label.clone(),
            points: dataset.len(),
        });
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        self.calls.push(BackendCall::SetTitle(title.to_string()));
        Ok(())
    }

    fn set_axis_label(
        &mut self,
        layer: &str,
        axis: Axis,
        label: &str,
        unit: &str,
        color: Option<&str>,
    ) -> Result<()> {
        self.calls.push(BackendCall::SetAxisLabel {
            layer: layer.to_string(),
            axis,
            label: label.to_string(),
            unit: unit.to_string(),
            color: color.map(str::to_string),
        });
        Ok(())
    }

    fn set_legend(&mut self, enabled: bool, location: LegendLocation, layer: &str) -> Result<()> {
        self.calls
            .push(BackendCall::SetLegend(enabled, location, layer.to_string()));
        Ok(())
    }

    fn apply_directive(&mut self, directive: &Directive) -> Result<()> {
        self.calls.push(BackendCall::ApplyDirective(directive.clone()));
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        if self.fail_on_render {
            bail!("render failed");
        }
        self.calls.push(BackendCall::Render);
        Ok(())
    }

    fn save(&mut self, path: Option<&Path>, format: ImageFormat, dpi: u32) -> Result<()> {
        self.calls
            .push(BackendCall::Save(path.map(Path::to_path_buf), format, dpi));
        Ok(())
    }
}
