//! Main experiment form: identity fields and the three action buttons.

use eframe::egui;

use super::theme::{accent, apply_button, load_button, primary_button, ThemeColors};
use crate::app::CdiApp;

impl CdiApp {
    /// Render the top bar with the application name and bound experiment.
    pub(crate) fn render_top_panel(&mut self, ctx: &egui::Context) {
        let colors = ThemeColors::from_ctx(ctx);

        egui::TopBottomPanel::top("top_bar")
            .frame(
                egui::Frame::none()
                    .fill(colors.bg_header)
                    .inner_margin(egui::Margin {
                        left: 16.0,
                        right: 16.0,
                        top: 8.0,
                        bottom: 8.0,
                    }),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new("CDI RECONSTRUCTION")
                            .size(14.0)
                            .strong()
                            .color(accent::BLUE),
                    );
                    ui.label(egui::RichText::new("│").size(14.0).color(colors.text_dim));
                    let title = match &self.experiment {
                        Some(experiment) => experiment.dir().display().to_string(),
                        None => "no experiment set".to_string(),
                    };
                    ui.label(egui::RichText::new(title).size(12.0).color(colors.text_muted));
                });
            });
    }

    /// Render the experiment identity form and the action buttons.
    pub(crate) fn render_main_form(&mut self, ui: &mut egui::Ui) {
        let colors = ThemeColors::from_ui(ui);

        ui.columns(2, |cols| {
            let left = &mut cols[0];
            Self::dir_picker_row(left, &colors, "Working Directory", &mut self.working_dir, true);
            Self::field_row(left, &colors, "Experiment ID", &mut self.experiment_id);
            Self::field_row(left, &colors, "scan(s)", &mut self.scan);

            let right = &mut cols[1];
            Self::field_row(right, &colors, "beamline", &mut self.beamline);
            Self::dir_picker_row(right, &colors, "spec file", &mut self.specfile, false);
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let busy = self.processing.is_busy();
            if ui
                .add_enabled(!busy, load_button("load experiment"))
                .clicked()
            {
                self.load_experiment();
            }
            if ui
                .add_enabled(!busy, apply_button("set experiment"))
                .clicked()
            {
                self.set_experiment();
            }
            if ui
                .add_enabled(!busy, primary_button("run everything"))
                .clicked()
            {
                self.run_everything();
            }
        });
    }

    fn field_row(ui: &mut egui::Ui, colors: &ThemeColors, label: &str, field: &mut String) {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(label)
                    .size(10.0)
                    .color(colors.text_muted),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.add(egui::TextEdit::singleline(field).desired_width(220.0));
            });
        });
    }

    fn dir_picker_row(
        ui: &mut egui::Ui,
        colors: &ThemeColors,
        label: &str,
        field: &mut String,
        pick_dir: bool,
    ) {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(label)
                    .size(10.0)
                    .color(colors.text_muted),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let text = if field.is_empty() { "select…" } else { field.as_str() };
                if ui.button(text).clicked() {
                    let picked = if pick_dir {
                        rfd::FileDialog::new().pick_folder()
                    } else {
                        rfd::FileDialog::new().pick_file()
                    };
                    if let Some(path) = picked {
                        *field = path.to_string_lossy().into_owned();
                    }
                }
            });
        });
    }
}
