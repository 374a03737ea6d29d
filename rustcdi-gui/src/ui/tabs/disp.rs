//! Visualization tab.

use eframe::egui;

use rustcdi_config::{ConfigMap, Value};
use rustcdi_experiment::StageKind;

use super::{fill_field, path_row, put_literal, put_str, text_row, TabAction};
use crate::ui::theme::{load_button, primary_button};

/// Form state for the visualization stage (`config_disp`).
#[derive(Default)]
pub struct DispTab {
    pub results_dir: String,
    pub crop: String,
    pub rampups: String,
    pub make_twin: bool,
}

impl DispTab {
    /// Clears the form.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Fills the form from a configuration mapping.
    pub fn apply_config(&mut self, map: &ConfigMap) {
        self.clear();
        fill_field(map, "results_dir", &mut self.results_dir);
        fill_field(map, "crop", &mut self.crop);
        fill_field(map, "rampups", &mut self.rampups);
        self.make_twin = map.get_bool("make_twin").unwrap_or(false);
    }

    /// Collects the non-empty fields into a configuration mapping.
    ///
    /// # Errors
    ///
    /// Returns the field problems when a literal field does not parse.
    pub fn to_config(&self) -> Result<ConfigMap, Vec<String>> {
        let mut map = ConfigMap::new();
        let mut errors = Vec::new();
        put_str(&mut map, "results_dir", &self.results_dir);
        put_literal(&mut map, "crop", &self.crop, &mut errors);
        put_literal(&mut map, "rampups", &self.rampups, &mut errors);
        if self.make_twin {
            map.insert("make_twin", Value::Bool(true));
        }
        if errors.is_empty() {
            Ok(map)
        } else {
            Err(errors)
        }
    }

    /// Renders the tab; returns the requested action, if any.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<TabAction> {
        let mut action = None;

        path_row(ui, "results directory", &mut self.results_dir, true);
        text_row(ui, "crop", &mut self.crop);
        text_row(ui, "rampups", &mut self.rampups);
        ui.checkbox(&mut self.make_twin, "make twin");

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui.add(load_button("Load disp conf from")).clicked() {
                action = Some(TabAction::LoadConfFrom(StageKind::Disp));
            }
            if ui.add(primary_button("run visualization")).clicked() {
                action = Some(TabAction::Run(StageKind::Disp));
            }
        });

        action
    }
}
