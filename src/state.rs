use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eframe::egui::{ColorImage, Pos2, Rect, Vec2};

use crate::backend::draw;
use crate::config::ParseConfig;
use crate::data::loader::load_selection;
use crate::parse::parse_selection;
use crate::spec::PlotSpec;
use crate::ui::figure::{EguiBackend, Figure};

/// Logical points per inch the viewer lays the figure out at.
const SCREEN_DPI: f32 = 96.0;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Layer table and settings bundles used for every parse.
    pub config: ParseConfig,

    /// File the current selection came from.
    pub source: Option<PathBuf>,

    /// Last successfully parsed specification.
    pub spec: Option<PlotSpec>,

    /// Figure built from `spec`.
    pub figure: Option<Figure>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// A screenshot has been requested and not yet received.
    pub screenshot_pending: bool,

    /// Screen area of the figure in the last frame, in points.
    pub plot_rect: Option<Rect>,
}

impl AppState {
    pub fn new(config: ParseConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Load, parse and draw a selection file. A file that fails to load or
    /// parse leaves the previous source, specification and figure in place;
    /// a backend error after parsing still shows what was drawn. Errors go
    /// to the status line.
    pub fn open(&mut self, path: &Path) {
        let spec = match self.parse(path) {
            Ok(spec) => spec,
            Err(e) => {
                log::error!("Failed to plot {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
                return;
            }
        };
        self.source = Some(path.to_path_buf());
        self.screenshot_pending = false;

        let mut backend = EguiBackend::default();
        self.status_message = draw(&spec, &mut backend).err().map(|e| {
            log::error!("Backend error for {}: {e:#}", path.display());
            format!("Error: {e:#}")
        });
        self.figure = Some(backend.into_figure());
        self.spec = Some(spec);
    }

    /// Re-read the current source file.
    pub fn reload(&mut self) {
        if let Some(path) = self.source.clone() {
            self.open(&path);
        }
    }

    fn parse(&self, path: &Path) -> Result<PlotSpec> {
        let selection = load_selection(path)?;
        let spec = parse_selection(&selection, &self.config)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(spec)
    }

    /// Write the parsed specification as pretty JSON.
    pub fn export_spec(&self, path: &Path) -> Result<()> {
        let spec = self.spec.as_ref().context("no specification to export")?;
        let json = serde_json::to_string_pretty(spec)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Exported plot specification to {}", path.display());
        Ok(())
    }

    /// Save the figure area of a captured frame where the figure asked for
    /// it, resampled to the requested dpi, then forget the request so it
    /// happens once per parse.
    pub fn save_screenshot(&mut self, image: &ColorImage, pixels_per_point: f32) -> Result<PathBuf> {
        self.screenshot_pending = false;
        let request = self
            .figure
            .as_mut()
            .and_then(|f| f.save_request.take())
            .context("no image was requested")?;

        let image = crop_to(image, self.plot_rect, pixels_per_point);
        let [width, height] = image.size;
        let bytes: Vec<u8> = image.pixels.iter().flat_map(|c| c.to_array()).collect();
        let buffer = image::RgbaImage::from_raw(width as u32, height as u32, bytes)
            .context("screenshot size does not match its pixels")?;

        let (out_width, out_height) = output_size(image.size, pixels_per_point, request.dpi);
        let buffer = if (out_width, out_height) == (width as u32, height as u32) {
            buffer
        } else {
            image::imageops::resize(&buffer, out_width, out_height, image::imageops::FilterType::Triangle)
        };
        buffer
            .save(&request.path)
            .with_context(|| format!("writing {}", request.path.display()))?;
        log::info!(
            "Saved figure image to {} ({out_width}x{out_height} at {} dpi)",
            request.path.display(),
            request.dpi
        );
        Ok(request.path)
    }
}

/// The part of a frame inside `rect` (points). Falls back to the whole frame
/// when no area is known or it lies outside the frame.
fn crop_to(image: &ColorImage, rect: Option<Rect>, pixels_per_point: f32) -> ColorImage {
    let [width, height] = image.size;
    let frame = Rect::from_min_size(
        Pos2::ZERO,
        Vec2::new(width as f32, height as f32) / pixels_per_point,
    );
    match rect.map(|r| r.intersect(frame)) {
        Some(r) if r.width() >= 1.0 && r.height() >= 1.0 => image.region(&r, Some(pixels_per_point)),
        _ => image.clone(),
    }
}

/// Pixel size of the saved image: one point becomes `dpi / 96` pixels.
fn output_size([width, height]: [usize; 2], pixels_per_point: f32, dpi: u32) -> (u32, u32) {
    let factor = dpi as f32 / (SCREEN_DPI * pixels_per_point);
    let side = |n: usize| ((n as f32 * factor).round() as u32).max(1);
    (side(width), side(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_open_builds_figure() {
        let file = csv_file("title,Demo\nshow,\nt,v\n1,2\n2,4\n");
        let mut state = AppState::default();
        state.open(file.path());
        assert!(state.status_message.is_none());
        assert_eq!(state.spec.as_ref().unwrap().title.as_deref(), Some("Demo"));
        assert_eq!(state.figure.as_ref().unwrap().main_panel().series.len(), 1);
    }

    #[test]
    fn test_failed_open_keeps_previous_figure() {
        let good = csv_file("show,\n1,2\n2,4\n");
        let bad = csv_file("Y,X\n1,2\n2,3\n");
        let mut state = AppState::default();
        state.open(good.path());
        state.open(bad.path());
        assert!(state.figure.is_some());
        assert!(state.status_message.as_deref().unwrap().contains("Error"));
        assert_eq!(state.source.as_deref(), Some(good.path()));
        assert_eq!(state.spec.as_ref().unwrap().datasets[0].y, vec![2.0, 4.0]);
    }

    #[test]
    fn test_reload_after_failed_open_uses_last_good_file() {
        let good = csv_file("show,\n1,2\n2,4\n");
        let mut state = AppState::default();
        state.open(good.path());
        state.open(Path::new("/nonexistent/selection.csv"));
        state.reload();
        assert!(state.status_message.is_none());
        assert_eq!(state.source.as_deref(), Some(good.path()));
    }

    #[test]
    fn test_pdf_request_still_shows_figure() {
        let file = csv_file("pdf,report\n1,2\n2,4\n");
        let mut state = AppState::default();
        state.open(file.path());
        assert!(state.status_message.as_deref().unwrap().contains("PDF"));
        assert_eq!(state.figure.as_ref().unwrap().main_panel().series.len(), 1);
    }

    #[test]
    fn test_export_spec() {
        let file = csv_file("show,\n1,2\n2,4\n");
        let out = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let mut state = AppState::default();
        assert!(state.export_spec(out.path()).is_err());
        state.open(file.path());
        state.export_spec(out.path()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
        assert_eq!(json["datasets"][0]["y"], serde_json::json!([2.0, 4.0]));
    }

    #[test]
    fn test_save_screenshot_once() {
        let file = csv_file("1,2\n2,4\n");
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::default();
        state.open(file.path());
        let target = dir.path().join("figure.png");
        state.figure.as_mut().unwrap().save_request.as_mut().unwrap().path = target.clone();

        let image = ColorImage::new([4, 3], eframe::egui::Color32::WHITE);
        assert_eq!(state.save_screenshot(&image, 1.0).unwrap(), target);
        assert!(target.exists());
        assert!(state.save_screenshot(&image, 1.0).is_err());
    }

    #[test]
    fn test_screenshot_cropped_and_scaled() {
        let file = csv_file("1,2\n2,4\n");
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::default();
        state.open(file.path());
        let target = dir.path().join("figure.png");
        let request = state.figure.as_mut().unwrap().save_request.as_mut().unwrap();
        request.path = target.clone();
        request.dpi = 192;

        // A 200x100 point window at 2 pixels per point; the figure covers 60x40 points.
        state.plot_rect = Some(Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(60.0, 40.0)));
        let image = ColorImage::new([400, 200], eframe::egui::Color32::WHITE);
        state.save_screenshot(&image, 2.0).unwrap();
        assert_eq!(image::image_dimensions(&target).unwrap(), (120, 80));
    }

    #[test]
    fn test_crop_to_clamps_to_frame() {
        let image = ColorImage::new([100, 50], eframe::egui::Color32::WHITE);
        let inside = Rect::from_min_max(Pos2::new(10.0, 5.0), Pos2::new(60.0, 45.0));
        assert_eq!(crop_to(&image, Some(inside), 1.0).size, [50, 40]);
        let overhanging = Rect::from_min_max(Pos2::new(80.0, 0.0), Pos2::new(300.0, 300.0));
        assert_eq!(crop_to(&image, Some(overhanging), 1.0).size, [20, 50]);
        let outside = Rect::from_min_max(Pos2::new(500.0, 500.0), Pos2::new(600.0, 600.0));
        assert_eq!(crop_to(&image, Some(outside), 1.0).size, [100, 50]);
        assert_eq!(crop_to(&image, None, 1.0).size, [100, 50]);
    }

    #[test]
    fn test_output_size_follows_dpi() {
        assert_eq!(output_size([96, 48], 1.0, 96), (96, 48));
        assert_eq!(output_size([96, 48], 1.0, 192), (192, 96));
        assert_eq!(output_size([200, 100], 2.0, 96), (100, 50));
        assert_eq!(output_size([1, 1], 1.0, 10), (1, 1));
    }
}
