//! Bottom status bar rendering.

use eframe::egui;

use super::theme::{accent, ThemeColors};
use crate::app::CdiApp;
use crate::util::format_bytes;

impl CdiApp {
    /// Render the bottom status bar with run state and process memory.
    pub(crate) fn render_status_bar(&mut self, ctx: &egui::Context) {
        let colors = ThemeColors::from_ctx(ctx);

        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                egui::Frame::none()
                    .fill(colors.bg_header)
                    .inner_margin(egui::Margin {
                        left: 16.0,
                        right: 16.0,
                        top: 6.0,
                        bottom: 6.0,
                    }),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let status_color = if self.processing.is_busy() {
                        accent::BLUE
                    } else {
                        accent::GREEN
                    };
                    ui.label(egui::RichText::new("●").size(11.0).color(status_color));
                    ui.label(
                        egui::RichText::new(&self.processing.status_text)
                            .size(11.0)
                            .color(status_color),
                    );
                    if self.processing.is_busy() {
                        ui.spinner();
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let memory_bytes = self.memory_rss_bytes();
                        let memory_text = if memory_bytes > 0 {
                            format!("RAM: {}", format_bytes(memory_bytes))
                        } else {
                            "RAM: --".to_string()
                        };
                        ui.label(
                            egui::RichText::new(memory_text)
                                .size(11.0)
                                .color(colors.text_primary),
                        );
                    });
                });
            });
    }
}
