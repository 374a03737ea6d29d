//! Data preparation tab.

use eframe::egui;

use rustcdi_config::ConfigMap;
use rustcdi_experiment::StageKind;

use super::{fill_field, path_row, put_literal, put_str, text_row, TabAction};
use crate::ui::theme::{load_button, primary_button};

/// Form state for the preparation stage (`config_prep`).
#[derive(Default)]
pub struct PrepTab {
    pub data_dir: String,
    pub darkfield_filename: String,
    pub whitefield_filename: String,
    pub roi: String,
    pub min_files: String,
    pub exclude_scans: String,
}

impl PrepTab {
    /// Clears the form.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Fills the form from a configuration mapping.
    pub fn apply_config(&mut self, map: &ConfigMap) {
        self.clear();
        fill_field(map, "data_dir", &mut self.data_dir);
        fill_field(map, "darkfield_filename", &mut self.darkfield_filename);
        fill_field(map, "whitefield_filename", &mut self.whitefield_filename);
        fill_field(map, "roi", &mut self.roi);
        fill_field(map, "min_files", &mut self.min_files);
        fill_field(map, "exclude_scans", &mut self.exclude_scans);
    }

    /// Collects the non-empty fields into a configuration mapping.
    ///
    /// # Errors
    ///
    /// Returns the field problems when a literal field does not parse.
    pub fn to_config(&self) -> Result<ConfigMap, Vec<String>> {
        let mut map = ConfigMap::new();
        let mut errors = Vec::new();
        put_str(&mut map, "data_dir", &self.data_dir);
        put_str(&mut map, "darkfield_filename", &self.darkfield_filename);
        put_str(&mut map, "whitefield_filename", &self.whitefield_filename);
        put_literal(&mut map, "roi", &self.roi, &mut errors);
        put_literal(&mut map, "min_files", &self.min_files, &mut errors);
        put_literal(&mut map, "exclude_scans", &self.exclude_scans, &mut errors);
        if errors.is_empty() {
            Ok(map)
        } else {
            Err(errors)
        }
    }

    /// Renders the tab; returns the requested action, if any.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<TabAction> {
        let mut action = None;

        path_row(ui, "data directory", &mut self.data_dir, true);
        path_row(ui, "darkfield file", &mut self.darkfield_filename, false);
        path_row(ui, "whitefield file", &mut self.whitefield_filename, false);
        text_row(ui, "detector area (roi)", &mut self.roi);
        text_row(ui, "min files in scan", &mut self.min_files);
        text_row(ui, "exclude scans", &mut self.exclude_scans);

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui.add(load_button("Load prep conf from")).clicked() {
                action = Some(TabAction::LoadConfFrom(StageKind::Prep));
            }
            if ui.add(primary_button("run data preparation")).clicked() {
                action = Some(TabAction::Run(StageKind::Prep));
            }
        });

        action
    }
}
