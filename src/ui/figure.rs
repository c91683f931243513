use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use eframe::egui::Color32;
use egui_plot::{LineStyle, MarkerShape};

use crate::backend::{ImageFormat, LegendLocation, PlotBackend};
use crate::color::{generate_palette, parse_color};
use crate::data::model::Value;
use crate::spec::{Axis, Dataset, Directive, Placement, Scale, SettingsBundle, Style};

// ---------------------------------------------------------------------------
// Figure model – what the egui viewer draws
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub x_err: Option<Vec<f64>>,
    pub y_err: Option<Vec<f64>>,
    /// `None` until `render` hands out palette colours.
    pub color: Option<Color32>,
    pub width: Option<f32>,
    pub line: Option<LineStyle>,
    pub marker: Option<MarkerShape>,
    pub marker_size: f32,
}

#[derive(Debug, Clone)]
pub enum Mark {
    HLine(f64, Option<Color32>),
    VLine(f64, Option<Color32>),
    Text([f64; 2], String),
}

/// One axes system of the figure.
#[derive(Debug, Clone)]
pub struct Panel {
    pub name: String,
    pub placement: Placement,
    pub x_title: String,
    pub y_title: String,
    pub axis_color: Option<Color32>,
    pub legend: Option<LegendLocation>,
    pub series: Vec<PlotSeries>,
    pub marks: Vec<Mark>,
    pub x_limits: Option<(f64, f64)>,
    pub y_limits: Option<(f64, f64)>,
    pub x_scale: Option<Scale>,
    pub y_scale: Option<Scale>,
}

impl Panel {
    fn new(name: &str, placement: Placement) -> Self {
        Panel {
            name: name.to_string(),
            placement,
            x_title: String::new(),
            y_title: String::new(),
            axis_color: None,
            legend: None,
            series: Vec::new(),
            marks: Vec::new(),
            x_limits: None,
            y_limits: None,
            x_scale: None,
            y_scale: None,
        }
    }
}

/// Where the rendered image goes once the first frame is on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub path: PathBuf,
    pub dpi: u32,
}

#[derive(Debug, Clone)]
pub struct Figure {
    pub title: Option<String>,
    /// Main panel first, then layers in the order they were added.
    pub panels: Vec<Panel>,
    pub grid: bool,
    pub line_width: f32,
    pub x_scale: Scale,
    pub y_scale: Scale,
    pub rendered: bool,
    pub save_request: Option<SaveRequest>,
}

impl Default for Figure {
    fn default() -> Self {
        Figure {
            title: None,
            panels: vec![Panel::new("main", Placement::Main)],
            grid: true,
            line_width: 1.5,
            x_scale: Scale::Linear,
            y_scale: Scale::Linear,
            rendered: false,
            save_request: None,
        }
    }
}

impl Figure {
    pub fn main_panel(&self) -> &Panel {
        &self.panels[0]
    }

    pub fn panels_where(&self, pred: impl Fn(Placement) -> bool) -> impl Iterator<Item = &Panel> {
        self.panels.iter().filter(move |p| pred(p.placement))
    }

    fn panel_mut(&mut self, name: &str) -> Option<&mut Panel> {
        let panel = self.panels.iter_mut().find(|p| p.name == name);
        if panel.is_none() {
            log::warn!("no layer named '{name}' in this figure");
        }
        panel
    }

    /// Effective scales of a panel: its own, else the figure-wide setting.
    pub fn scales(&self, panel: &Panel) -> (Scale, Scale) {
        (
            panel.x_scale.unwrap_or(self.x_scale),
            panel.y_scale.unwrap_or(self.y_scale),
        )
    }
}

// ---------------------------------------------------------------------------
// EguiBackend – builds a Figure from backend calls
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct EguiBackend {
    figure: Figure,
}

impl EguiBackend {
    pub fn into_figure(self) -> Figure {
        self.figure
    }
}

fn axis_title(label: &str, unit: &str) -> String {
    match (label.is_empty(), unit.is_empty()) {
        (_, true) => label.to_string(),
        (true, false) => format!("({unit})"),
        (false, false) => format!("{label} ({unit})"),
    }
}

fn style_text(style: &Style, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| style.get(*k)).map(ToString::to_string)
}

fn style_number(style: &Style, keys: &[&str]) -> Option<f32> {
    keys.iter()
        .find_map(|k| style.get(*k))
        .and_then(Value::as_f64)
        .map(|v| v as f32)
}

/// matplotlib-style line spec: `-`, `--`, `:`, `-.`, `none`.
fn line_style(spec: &str) -> Option<Option<LineStyle>> {
    match spec.trim() {
        "-" | "solid" => Some(Some(LineStyle::Solid)),
        "--" | "dashed" => Some(Some(LineStyle::dashed_dense())),
        "-." | "dashdot" => Some(Some(LineStyle::dashed_loose())),
        ":" | "dotted" => Some(Some(LineStyle::dotted_dense())),
        "none" | "" => Some(None),
        _ => None,
    }
}

fn marker_shape(spec: &str) -> Option<MarkerShape> {
    match spec.trim() {
        "o" | "." => Some(MarkerShape::Circle),
        "s" => Some(MarkerShape::Square),
        "d" | "D" => Some(MarkerShape::Diamond),
        "^" => Some(MarkerShape::Up),
        "v" => Some(MarkerShape::Down),
        "<" => Some(MarkerShape::Left),
        ">" => Some(MarkerShape::Right),
        "+" => Some(MarkerShape::Plus),
        "x" => Some(MarkerShape::Cross),
        "*" => Some(MarkerShape::Asterisk),
        _ => None,
    }
}

impl PlotBackend for EguiBackend {
    fn apply_setting(&mut self, bundle: &SettingsBundle) -> Result<()> {
        for (key, value) in &bundle.options {
            match (key.as_str(), value) {
                ("grid", Value::Bool(on)) => self.figure.grid = *on,
                ("line_width", v) => {
                    if let Some(w) = v.as_f64() {
                        self.figure.line_width = w as f32;
                    }
                }
                ("x_scale", Value::Text(s)) if s == "log" => self.figure.x_scale = Scale::Log,
                ("y_scale", Value::Text(s)) if s == "log" => self.figure.y_scale = Scale::Log,
                _ => log::debug!("setting {}.{key} has no effect in the viewer", bundle.name),
            }
        }
        Ok(())
    }

    fn add_layer(&mut self, name: &str, placement: Placement) -> Result<()> {
        if self.figure.panels.iter().any(|p| p.name == name) {
            bail!("layer '{name}' added twice");
        }
        self.figure.panels.push(Panel::new(name, placement));
        Ok(())
    }

    fn add_series(&mut self, dataset: &Dataset) -> Result<()> {
        let style = &dataset.style;
        let line = match style_text(style, &["linestyle", "ls"]) {
            None => Some(LineStyle::Solid),
            Some(spec) => line_style(&spec).unwrap_or_else(|| {
                log::warn!("unknown line style '{spec}', using solid");
                Some(LineStyle::Solid)
            }),
        };
        let marker = style_text(style, &["marker"]).and_then(|m| {
            let shape = marker_shape(&m);
            if shape.is_none() {
                log::warn!("unknown marker '{m}'");
            }
            shape
        });
        let color = style_text(style, &["color", "c"]).and_then(|c| {
            let parsed = parse_color(&c);
            if parsed.is_none() {
                log::warn!("unknown colour '{c}'");
            }
            parsed
        });

        let series = PlotSeries {
            name: dataset.label.clone().unwrap_or_default(),
            points: dataset.x.iter().zip(&dataset.y).map(|(&x, &y)| [x, y]).collect(),
            x_err: dataset.x_err.clone(),
            y_err: dataset.y_err.clone(),
            color,
            width: style_number(style, &["linewidth", "lw"]),
            line,
            marker,
            marker_size: style_number(style, &["markersize", "ms"]).unwrap_or(3.0),
        };
        match self.figure.panel_mut(&dataset.layer) {
            Some(panel) => panel.series.push(series),
            None => bail!("series on unknown layer '{}'", dataset.layer),
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        self.figure.title = Some(title.to_string());
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
        if let Some(panel) = self.figure.panel_mut(layer) {
            let title = axis_title(label, unit);
            match axis {
                Axis::X => panel.x_title = title,
                Axis::Y => panel.y_title = title,
            }
            panel.axis_color = color.and_then(parse_color);
        }
        Ok(())
    }

    fn set_legend(&mut self, enabled: bool, location: LegendLocation, layer: &str) -> Result<()> {
        if let Some(panel) = self.figure.panel_mut(layer) {
            panel.legend = enabled.then_some(location);
        }
        Ok(())
    }

    fn apply_directive(&mut self, directive: &Directive) -> Result<()> {
        let Some(panel) = self.figure.panel_mut(directive.layer()) else {
            return Ok(());
        };
        match directive {
            Directive::Limits { axis: Axis::X, min, max, .. } => panel.x_limits = Some((*min, *max)),
            Directive::Limits { axis: Axis::Y, min, max, .. } => panel.y_limits = Some((*min, *max)),
            Directive::Scale { axis: Axis::X, scale, .. } => panel.x_scale = Some(*scale),
            Directive::Scale { axis: Axis::Y, scale, .. } => panel.y_scale = Some(*scale),
            Directive::AxisLabel { axis, label, unit, .. } => {
                let title = axis_title(label, unit.as_deref().unwrap_or(""));
                match axis {
                    Axis::X => panel.x_title = title,
                    Axis::Y => panel.y_title = title,
                }
            }
            Directive::ReferenceLine { axis, value, color, .. } => {
                let color = color.as_deref().and_then(parse_color);
                panel.marks.push(match axis {
                    Axis::Y => Mark::HLine(*value, color),
                    Axis::X => Mark::VLine(*value, color),
                });
            }
            Directive::Text { x, y, text, .. } => panel.marks.push(Mark::Text([*x, *y], text.clone())),
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let count = self.figure.panels.iter().map(|p| p.series.len()).sum();
        let mut palette = generate_palette(count).into_iter();
        for series in self.figure.panels.iter_mut().flat_map(|p| p.series.iter_mut()) {
            let next = palette.next();
            if series.color.is_none() {
                series.color = next;
            }
        }
        self.figure.rendered = true;
        Ok(())
    }

    fn save(&mut self, path: Option<&Path>, format: ImageFormat, dpi: u32) -> Result<()> {
        if format == ImageFormat::Pdf {
            bail!("PDF output needs a vector backend; the viewer can only write PNG images");
        }
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::temp_dir().join(format!("gridplot-{}.png", std::process::id())),
        };
        log::info!("figure will be saved to {} once drawn", path.display());
        self.figure.save_request = Some(SaveRequest { path, dpi });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::draw;
    use crate::config::ParseConfig;
    use crate::data::model::Selection;
    use crate::parse::parse_selection;

    fn figure(records: &[&[&str]]) -> Result<Figure> {
        let selection = Selection::from_records(records.iter().map(|r| r.iter()));
        let spec = parse_selection(&selection, &ParseConfig::default())?;
        let mut backend = EguiBackend::default();
        draw(&spec, &mut backend)?;
        Ok(backend.into_figure())
    }

    #[test]
    fn test_axis_title() {
        assert_eq!(axis_title("Time", "s"), "Time (s)");
        assert_eq!(axis_title("Time", ""), "Time");
        assert_eq!(axis_title("", "s"), "(s)");
    }

    #[test]
    fn test_layers_and_styles() {
        let fig = figure(&[
            &["show", "", "", ""],
            &["settings", "nogrid", "", ""],
            &["add_vline", "1", "layer=insettl", ""],
            &["Time", "Signal", "f", "P"],
            &["s", "V", "Hz", "W"],
            &["X", "Y;;ls=--;marker=o;lw=3;color=#00ff00", "X;insettl", "Y;insettl"],
            &["1", "2", "3", "4"],
            &["2", "3", "4", "5"],
        ])
        .unwrap();

        assert!(fig.rendered);
        assert!(!fig.grid);
        assert_eq!(fig.save_request, None);
        assert_eq!(fig.panels.len(), 2);

        let main = fig.main_panel();
        assert_eq!(main.x_title, "Time (s)");
        let s = &main.series[0];
        assert_eq!(s.color, Some(Color32::from_rgb(0, 255, 0)));
        assert_eq!(s.width, Some(3.0));
        assert_eq!(s.marker, Some(MarkerShape::Circle));
        assert_eq!(s.points, vec![[1.0, 2.0], [2.0, 3.0]]);

        let inset = &fig.panels[1];
        assert_eq!(inset.name, "inset-top-left");
        assert_eq!(inset.y_title, "P (W)");
        assert!(matches!(inset.marks[0], Mark::VLine(v, None) if v == 1.0));
        assert!(inset.series[0].color.is_some());
    }

    #[test]
    fn test_temporary_image_request() {
        let fig = figure(&[&["1", "2"], &["2", "3"]]).unwrap();
        let request = fig.save_request.unwrap();
        assert_eq!(request.dpi, crate::backend::TEMPORARY_IMAGE_DPI);
        assert_eq!(request.path.extension().and_then(|e| e.to_str()), Some("png"));
    }

    #[test]
    fn test_pdf_is_reported_unsupported() {
        let mut backend = EguiBackend::default();
        assert!(backend.save(None, ImageFormat::Pdf, 300).is_err());
    }

    #[test]
    fn test_log_scale_setting() {
        let fig = figure(&[&["settings", "logy"], &["1", "2"], &["2", "3"]]).unwrap();
        let (x, y) = fig.scales(fig.main_panel());
        assert_eq!((x, y), (Scale::Linear, Scale::Log));
    }
}
