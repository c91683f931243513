use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::spec::{OutputMode, Placement, PlotSpec};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – parsed specification
// ---------------------------------------------------------------------------

/// Render the left panel: what the parser made of the selection.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Plot specification");
    ui.separator();

    let Some(spec) = &state.spec else {
        ui.label("No selection loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("spec_summary").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.strong("Title");
                ui.label(spec.title.as_deref().unwrap_or("–"));
                ui.end_row();
                ui.strong("Output");
                ui.label(output_text(&spec.output));
                ui.end_row();
                ui.strong("Legend");
                ui.label(if spec.legend_enabled { "on" } else { "off" });
                ui.end_row();
            });
            ui.separator();

            egui::CollapsingHeader::new(RichText::new(format!("Settings  ({})", spec.settings.len())).strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    for bundle in &spec.settings {
                        ui.label(&bundle.name);
                    }
                });

            egui::CollapsingHeader::new(RichText::new(format!("Layers  ({})", spec.layers.len())).strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for layer in &spec.layers {
                        ui.label(format!("{}  [{}]", layer.name, placement_text(layer.placement)));
                    }
                });

            egui::CollapsingHeader::new(RichText::new(format!("Directives  ({})", spec.directives.len())).strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    for directive in &spec.directives {
                        ui.monospace(format!("{directive:?}"));
                    }
                });

            ui.separator();
            ui.strong("Datasets");
            datasets_table(ui, spec);
        });
}

fn datasets_table(ui: &mut Ui, spec: &PlotSpec) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .column(Column::auto())
        .header(18.0, |mut header| {
            header.col(|ui| {
                ui.strong("Layer");
            });
            header.col(|ui| {
                ui.strong("Cols");
            });
            header.col(|ui| {
                ui.strong("Label");
            });
            header.col(|ui| {
                ui.strong("Points");
            });
        })
        .body(|mut body| {
            for dataset in &spec.datasets {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(&dataset.layer);
                    });
                    row.col(|ui| {
                        ui.label(format!("{}→{}", dataset.x_column + 1, dataset.y_column + 1));
                    });
                    row.col(|ui| {
                        ui.label(dataset.label.as_deref().unwrap_or(""));
                    });
                    row.col(|ui| {
                        ui.label(dataset.len().to_string());
                    });
                });
            }
        });
}

fn output_text(output: &OutputMode) -> String {
    match output {
        OutputMode::Display => "display".to_string(),
        OutputMode::SaveTemporaryImage => "temporary image".to_string(),
        OutputMode::SavePdf { path: Some(p) } => format!("pdf → {}", p.display()),
        OutputMode::SavePdf { path: None } => "pdf (ask)".to_string(),
    }
}

fn placement_text(placement: Placement) -> String {
    match placement {
        Placement::Main => "main".to_string(),
        Placement::Inset(corner) => format!("inset {corner:?}"),
        Placement::Twin(axis) => format!("twin {axis}"),
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.source.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
            if ui
                .add_enabled(state.spec.is_some(), egui::Button::new("Export specification…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(spec) = &state.spec {
            ui.label(format!(
                "{} datasets on {} layers",
                spec.datasets.len(),
                spec.layers.len()
            ));
        }
        if let Some(path) = &state.source {
            ui.separator();
            ui.label(path.display().to_string());
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::DARK_GREEN
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open selection")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}

fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export plot specification")
        .add_filter("JSON", &["json"])
        .set_file_name("plot.json")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_spec(&path) {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
