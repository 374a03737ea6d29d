//! rustcdi GUI application entry point.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod message;
mod pipeline;
mod state;
mod ui;
mod util;

use app::CdiApp;
use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::init();
    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([980.0, 780.0]),
        ..Default::default()
    };
    eframe::run_native(
        "CDI Reconstruction",
        opts,
        Box::new(|cc| {
            ui::theme::configure_style(&cc.egui_ctx);
            Ok(Box::new(CdiApp::default()))
        }),
    )
}
