use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct GridPlotApp {
    pub state: AppState,
}

impl GridPlotApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Ask for a screenshot once the figure has been on screen, and store it
    /// when it arrives.
    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        let image = ctx.input(|i| {
            i.raw.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        if let Some(image) = image {
            match self.state.save_screenshot(&image, ctx.pixels_per_point()) {
                Ok(path) => self.state.status_message = Some(format!("Saved {}", path.display())),
                Err(e) => {
                    log::error!("Failed to save figure: {e:#}");
                    self.state.status_message = Some(format!("Error: {e:#}"));
                }
            }
            return;
        }

        let wants_image = self
            .state
            .figure
            .as_ref()
            .is_some_and(|f| f.save_request.is_some());
        if wants_image && self.state.plot_rect.is_some() && !self.state.screenshot_pending {
            self.state.screenshot_pending = true;
            ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(Default::default()));
        }
    }
}

impl eframe::App for GridPlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: parsed specification ----
        egui::SidePanel::left("spec_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state);
            });

        // ---- Central panel: figure ----
        egui::CentralPanel::default().show(ctx, |ui| {
            self.state.plot_rect = plot::figure_plot(ui, self.state.figure.as_ref());
        });

        self.handle_screenshot(ctx);
    }
}
