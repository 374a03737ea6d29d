//! Data formatting tab.

use eframe::egui;

use rustcdi_config::{ConfigMap, Value};
use rustcdi_experiment::StageKind;

use super::{fill_field, path_row, put_literal, put_str, text_row, TabAction};
use crate::ui::theme::{load_button, primary_button};

/// Alien (detector artifact) removal algorithm selection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AlienAlg {
    #[default]
    None,
    BlockAliens,
    AlienFile,
    AutoAlien1,
}

impl AlienAlg {
    const ALL: [AlienAlg; 4] = [
        AlienAlg::None,
        AlienAlg::BlockAliens,
        AlienAlg::AlienFile,
        AlienAlg::AutoAlien1,
    ];

    fn label(self) -> &'static str {
        match self {
            AlienAlg::None => "none",
            AlienAlg::BlockAliens => "block aliens",
            AlienAlg::AlienFile => "alien file",
            AlienAlg::AutoAlien1 => "AutoAlien1",
        }
    }

    /// Parameter value written to `config_data`; `None` writes nothing.
    fn config_value(self) -> Option<&'static str> {
        match self {
            AlienAlg::None => None,
            AlienAlg::BlockAliens => Some("block_aliens"),
            AlienAlg::AlienFile => Some("alien_file"),
            AlienAlg::AutoAlien1 => Some("AutoAlien1"),
        }
    }

    fn from_config(name: &str) -> Self {
        match name {
            "block_aliens" => AlienAlg::BlockAliens,
            "alien_file" => AlienAlg::AlienFile,
            "AutoAlien1" => AlienAlg::AutoAlien1,
            _ => AlienAlg::None,
        }
    }
}

/// Form state for the data formatting stage (`config_data`).
#[derive(Default)]
pub struct DataTab {
    pub alien_alg: AlienAlg,
    pub aliens: String,
    pub alien_file: String,
    pub aa1_size_threshold: String,
    pub aa1_asym_threshold: String,
    pub aa1_min_pts: String,
    pub aa1_eps: String,
    pub aa1_amp_threshold: String,
    pub aa1_save_arrs: bool,
    pub aa1_expandcleanedsigma: String,

    pub intensity_threshold: String,
    pub center_shift: String,
    pub adjust_dimensions: String,
    pub binning: String,
}

impl DataTab {
    /// Clears the form.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Fills the form from a configuration mapping.
    pub fn apply_config(&mut self, map: &ConfigMap) {
        self.clear();
        self.alien_alg = map
            .get_str("alien_alg")
            .map_or(AlienAlg::None, AlienAlg::from_config);
        fill_field(map, "aliens", &mut self.aliens);
        fill_field(map, "alien_file", &mut self.alien_file);
        fill_field(map, "AA1_size_threshold", &mut self.aa1_size_threshold);
        fill_field(map, "AA1_asym_threshold", &mut self.aa1_asym_threshold);
        fill_field(map, "AA1_min_pts", &mut self.aa1_min_pts);
        fill_field(map, "AA1_eps", &mut self.aa1_eps);
        fill_field(map, "AA1_amp_threshold", &mut self.aa1_amp_threshold);
        self.aa1_save_arrs = map.get_bool("AA1_save_arrs").unwrap_or(false);
        fill_field(map, "AA1_expandcleanedsigma", &mut self.aa1_expandcleanedsigma);
        fill_field(map, "intensity_threshold", &mut self.intensity_threshold);
        fill_field(map, "center_shift", &mut self.center_shift);
        fill_field(map, "adjust_dimensions", &mut self.adjust_dimensions);
        fill_field(map, "binning", &mut self.binning);
    }

    /// Collects the non-empty fields into a configuration mapping.
    ///
    /// Only the selected alien algorithm's block is included.
    ///
    /// # Errors
    ///
    /// Returns the field problems when a literal field does not parse.
    pub fn to_config(&self) -> Result<ConfigMap, Vec<String>> {
        let mut map = ConfigMap::new();
        let mut errors = Vec::new();

        if let Some(name) = self.alien_alg.config_value() {
            map.insert("alien_alg", Value::Str(name.to_string()));
        }
        match self.alien_alg {
            AlienAlg::None => {}
            AlienAlg::BlockAliens => {
                put_literal(&mut map, "aliens", &self.aliens, &mut errors);
            }
            AlienAlg::AlienFile => {
                put_str(&mut map, "alien_file", &self.alien_file);
            }
            AlienAlg::AutoAlien1 => {
                put_literal(&mut map, "AA1_size_threshold", &self.aa1_size_threshold, &mut errors);
                put_literal(&mut map, "AA1_asym_threshold", &self.aa1_asym_threshold, &mut errors);
                put_literal(&mut map, "AA1_min_pts", &self.aa1_min_pts, &mut errors);
                put_literal(&mut map, "AA1_eps", &self.aa1_eps, &mut errors);
                put_literal(&mut map, "AA1_amp_threshold", &self.aa1_amp_threshold, &mut errors);
                if self.aa1_save_arrs {
                    map.insert("AA1_save_arrs", Value::Bool(true));
                }
                put_literal(
                    &mut map,
                    "AA1_expandcleanedsigma",
                    &self.aa1_expandcleanedsigma,
                    &mut errors,
                );
            }
        }

        put_literal(&mut map, "intensity_threshold", &self.intensity_threshold, &mut errors);
        put_literal(&mut map, "center_shift", &self.center_shift, &mut errors);
        put_literal(&mut map, "adjust_dimensions", &self.adjust_dimensions, &mut errors);
        put_literal(&mut map, "binning", &self.binning, &mut errors);

        if errors.is_empty() {
            Ok(map)
        } else {
            Err(errors)
        }
    }

    /// Renders the tab; returns the requested action, if any.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<TabAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.label("alien algorithm");
            egui::ComboBox::from_id_salt("alien_alg")
                .selected_text(self.alien_alg.label())
                .show_ui(ui, |ui| {
                    for alg in AlienAlg::ALL {
                        ui.selectable_value(&mut self.alien_alg, alg, alg.label());
                    }
                });
        });

        match self.alien_alg {
            AlienAlg::None => {}
            AlienAlg::BlockAliens => text_row(ui, "aliens", &mut self.aliens),
            AlienAlg::AlienFile => path_row(ui, "alien file", &mut self.alien_file, false),
            AlienAlg::AutoAlien1 => {
                text_row(ui, "relative size threshold", &mut self.aa1_size_threshold);
                text_row(ui, "average asymmetry threshold", &mut self.aa1_asym_threshold);
                text_row(ui, "min pts in cluster", &mut self.aa1_min_pts);
                text_row(ui, "cluster alg eps", &mut self.aa1_eps);
                text_row(ui, "alien alg amp threshold", &mut self.aa1_amp_threshold);
                ui.checkbox(&mut self.aa1_save_arrs, "save analysis arrays");
                text_row(ui, "expand cleaned sigma", &mut self.aa1_expandcleanedsigma);
            }
        }

        ui.add_space(6.0);
        text_row(ui, "intensity threshold", &mut self.intensity_threshold);
        text_row(ui, "center shift", &mut self.center_shift);
        text_row(ui, "pad, crop", &mut self.adjust_dimensions);
        text_row(ui, "binning", &mut self.binning);

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui.add(load_button("Load data conf from")).clicked() {
                action = Some(TabAction::LoadConfFrom(StageKind::Data));
            }
            if ui.add(primary_button("format data")).clicked() {
                action = Some(TabAction::Run(StageKind::Data));
            }
        });

        action
    }
}
