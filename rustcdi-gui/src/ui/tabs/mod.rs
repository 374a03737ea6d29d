//! The four stage tabs and their shared form plumbing.
//!
//! Every tab binds its widget state to a [`ConfigMap`]: `apply_config`
//! fills the widgets from a mapping, `to_config` collects the non-empty
//! fields back into one. Free-text fields hold the literal text exactly as
//! it will appear in the file; string-valued parameters hold the bare text
//! and are quoted on save.

mod data;
mod disp;
mod prep;
mod rec;

use eframe::egui;

pub use data::{AlienAlg, DataTab};
pub use disp::DispTab;
pub use prep::PrepTab;
pub use rec::{InitGuess, RecAction, RecTab};

use rustcdi_config::{ConfigMap, Value};
use rustcdi_experiment::StageKind;

use super::theme::ThemeColors;

/// Which tab is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
    Prep,
    Data,
    Rec,
    Disp,
}

impl TabKind {
    /// Tab title shown in the selector row.
    pub fn title(self) -> &'static str {
        match self {
            TabKind::Prep => "Prep",
            TabKind::Data => "Data",
            TabKind::Rec => "Reconstruction",
            TabKind::Disp => "Display",
        }
    }
}

/// Action requested from a tab's buttons.
pub enum TabAction {
    /// Save the tab's configuration and run its stage.
    Run(StageKind),
    /// Load the tab's fields from a configuration file picked by the user.
    LoadConfFrom(StageKind),
}

/// The four stage tabs.
#[derive(Default)]
pub struct Tabs {
    pub prep: PrepTab,
    pub data: DataTab,
    pub rec: RecTab,
    pub disp: DispTab,
}

impl Tabs {
    /// Clears every tab back to its empty state.
    pub fn clear(&mut self) {
        self.prep.clear();
        self.data.clear();
        self.rec.clear();
        self.disp.clear();
    }
}

impl crate::app::CdiApp {
    /// Render the tab selector row and the visible tab.
    ///
    /// Tabs appear once an experiment is set or loaded; the prep and
    /// display tabs only when a beamline is named, since their stages are
    /// beamline-specific.
    pub(crate) fn render_tabs(&mut self, ui: &mut egui::Ui) {
        if self.experiment.is_none() {
            let colors = ThemeColors::from_ui(ui);
            ui.label(
                egui::RichText::new("set or load an experiment to configure the processing stages")
                    .color(colors.text_dim),
            );
            return;
        }

        let beamline_set = !self.beamline.trim().is_empty();
        let mut kinds = Vec::with_capacity(4);
        if beamline_set {
            kinds.push(TabKind::Prep);
        }
        kinds.push(TabKind::Data);
        kinds.push(TabKind::Rec);
        if beamline_set {
            kinds.push(TabKind::Disp);
        }
        if !kinds.contains(&self.selected_tab) {
            self.selected_tab = TabKind::Data;
        }

        ui.horizontal(|ui| {
            for kind in &kinds {
                if ui
                    .selectable_label(self.selected_tab == *kind, kind.title())
                    .clicked()
                {
                    self.selected_tab = *kind;
                }
            }
        });
        ui.separator();

        match self.selected_tab {
            TabKind::Prep => {
                if let Some(action) = self.tabs.prep.show(ui) {
                    self.handle_tab_action(action);
                }
            }
            TabKind::Data => {
                if let Some(action) = self.tabs.data.show(ui) {
                    self.handle_tab_action(action);
                }
            }
            TabKind::Rec => {
                if let Some(action) = self.tabs.rec.show(ui) {
                    self.handle_rec_action(action);
                }
            }
            TabKind::Disp => {
                if let Some(action) = self.tabs.disp.show(ui) {
                    self.handle_tab_action(action);
                }
            }
        }
    }
}

/// Parses a field's literal text into the mapping; empty fields are skipped.
pub(crate) fn put_literal(
    map: &mut ConfigMap,
    name: &str,
    text: &str,
    errors: &mut Vec<String>,
) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match Value::parse(text) {
        Ok(value) => map.insert(name, value),
        Err(err) => errors.push(format!("{name}: {err}")),
    }
}

/// Stores a field's text as a string parameter; empty fields are skipped.
pub(crate) fn put_str(map: &mut ConfigMap, name: &str, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        map.insert(name, Value::Str(text.to_string()));
    }
}

/// Field text for a stored value: strings show bare, everything else shows
/// its literal form.
pub(crate) fn field_text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Copies a parameter into a text field, if present.
pub(crate) fn fill_field(map: &ConfigMap, name: &str, field: &mut String) {
    if let Some(value) = map.get(name) {
        *field = field_text(value);
    }
}

/// A labeled single-line text field, label left, input right.
pub(crate) fn text_row(ui: &mut egui::Ui, label: &str, field: &mut String) {
    ui.horizontal(|ui| {
        let colors = ThemeColors::from_ui(ui);
        ui.label(
            egui::RichText::new(label)
                .size(10.0)
                .color(colors.text_muted),
        );
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.add(egui::TextEdit::singleline(field).desired_width(260.0));
        });
    });
}

/// A labeled path field with a browse button. `pick_dir` selects between
/// directory and file dialogs.
pub(crate) fn path_row(ui: &mut egui::Ui, label: &str, field: &mut String, pick_dir: bool) {
    ui.horizontal(|ui| {
        let colors = ThemeColors::from_ui(ui);
        ui.label(
            egui::RichText::new(label)
                .size(10.0)
                .color(colors.text_muted),
        );
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("…").clicked() {
                let picked = if pick_dir {
                    rfd::FileDialog::new().pick_folder()
                } else {
                    rfd::FileDialog::new().pick_file()
                };
                if let Some(path) = picked {
                    *field = path.to_string_lossy().into_owned();
                }
            }
            ui.add(egui::TextEdit::singleline(field).desired_width(230.0));
        });
    });
}
