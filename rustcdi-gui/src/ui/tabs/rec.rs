//! Reconstruction tab.

use eframe::egui;

use rustcdi_config::{ConfigMap, Value};
use rustcdi_experiment::StageKind;

use super::{fill_field, path_row, put_literal, text_row, TabAction};
use crate::ui::features::Features;
use crate::ui::theme::{load_button, primary_button, section_header};

/// Initial guess selection for the reconstruction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InitGuess {
    #[default]
    Random,
    Continue,
    AiGuess,
}

impl InitGuess {
    const ALL: [InitGuess; 3] = [InitGuess::Random, InitGuess::Continue, InitGuess::AiGuess];

    fn label(self) -> &'static str {
        match self {
            InitGuess::Random => "random",
            InitGuess::Continue => "continue",
            InitGuess::AiGuess => "AI algorithm",
        }
    }

    /// Parameter value written to `config_rec`; `random` writes nothing.
    fn config_value(self) -> Option<&'static str> {
        match self {
            InitGuess::Random => None,
            InitGuess::Continue => Some("continue"),
            InitGuess::AiGuess => Some("AI_guess"),
        }
    }

    fn from_config(name: &str) -> Self {
        match name {
            "continue" => InitGuess::Continue,
            "AI_guess" => InitGuess::AiGuess,
            _ => InitGuess::Random,
        }
    }
}

/// Processor backends the reconstruction can run on.
const PROCESSING_CHOICES: [&str; 7] = ["auto", "cp", "np", "af", "cuda", "opencl", "cpu"];

/// Action requested from the reconstruction tab.
pub enum RecAction {
    /// Plain tab action (run / load-from).
    Tab(TabAction),
    /// Switch to another reconstruction configuration (index into
    /// `main + rec_ids`).
    SwitchConfig(usize),
    /// Create a new alternate configuration with this id.
    AddConfig(String),
}

/// Form state for the reconstruction stage (`config_rec`).
#[derive(Default)]
pub struct RecTab {
    pub init_guess: InitGuess,
    pub continue_dir: String,
    pub ai_threshold: String,
    pub ai_sigma: String,
    pub ai_trained_model: String,

    pub processing: String,
    pub device: String,
    pub reconstructions: String,
    pub algorithm_sequence: String,
    pub hio_beta: String,
    pub initial_support_area: String,

    pub features: Features,

    /// Alternate configuration ids discovered in the conf directory.
    pub rec_ids: Vec<String>,
    /// Selected configuration: 0 is the main `config_rec`, `i + 1` is
    /// `rec_ids[i]`.
    pub selected_rec: usize,
    /// Text being typed into the add-configuration dialog, when open.
    add_dialog: Option<String>,
}

impl RecTab {
    /// Clears the form.
    pub fn clear(&mut self) {
        let rec_ids = std::mem::take(&mut self.rec_ids);
        *self = Self::default();
        self.rec_ids = rec_ids;
    }

    /// The id of the selected alternate configuration, `None` for main.
    pub fn current_rec_id(&self) -> Option<String> {
        (self.selected_rec > 0).then(|| self.rec_ids[self.selected_rec - 1].clone())
    }

    /// The configuration file name for the current selection.
    pub fn config_file_name(&self) -> String {
        match self.current_rec_id() {
            Some(id) => format!("config_rec_{id}"),
            None => "config_rec".to_string(),
        }
    }

    /// Fills the form from a configuration mapping.
    pub fn apply_config(&mut self, map: &ConfigMap) {
        self.init_guess = map
            .get_str("init_guess")
            .map_or(InitGuess::Random, InitGuess::from_config);
        self.continue_dir.clear();
        self.ai_threshold.clear();
        self.ai_sigma.clear();
        self.ai_trained_model.clear();
        fill_field(map, "continue_dir", &mut self.continue_dir);
        fill_field(map, "AI_threshold", &mut self.ai_threshold);
        fill_field(map, "AI_sigma", &mut self.ai_sigma);
        fill_field(map, "AI_trained_model", &mut self.ai_trained_model);

        self.processing = map.get_str("processing").unwrap_or_default().to_string();
        self.device.clear();
        self.reconstructions.clear();
        self.algorithm_sequence.clear();
        self.hio_beta.clear();
        self.initial_support_area.clear();
        fill_field(map, "device", &mut self.device);
        fill_field(map, "reconstructions", &mut self.reconstructions);
        fill_field(map, "algorithm_sequence", &mut self.algorithm_sequence);
        fill_field(map, "hio_beta", &mut self.hio_beta);
        fill_field(map, "initial_support_area", &mut self.initial_support_area);

        self.features.apply_config(map);
    }

    /// Collects the non-empty fields into a configuration mapping.
    ///
    /// # Errors
    ///
    /// Returns the field problems when a literal field does not parse.
    pub fn to_config(&self) -> Result<ConfigMap, Vec<String>> {
        let mut map = ConfigMap::new();
        let mut errors = Vec::new();

        if !self.algorithm_sequence.trim().is_empty() {
            map.insert(
                "algorithm_sequence",
                Value::Str(self.algorithm_sequence.trim().to_string()),
            );
        }
        put_literal(&mut map, "reconstructions", &self.reconstructions, &mut errors);
        put_literal(&mut map, "device", &self.device, &mut errors);
        if !self.processing.trim().is_empty() {
            map.insert("processing", Value::Str(self.processing.trim().to_string()));
        }
        put_literal(&mut map, "hio_beta", &self.hio_beta, &mut errors);
        put_literal(
            &mut map,
            "initial_support_area",
            &self.initial_support_area,
            &mut errors,
        );

        if let Some(name) = self.init_guess.config_value() {
            map.insert("init_guess", Value::Str(name.to_string()));
        }
        match self.init_guess {
            InitGuess::Random => {}
            InitGuess::Continue => {
                if !self.continue_dir.trim().is_empty() {
                    map.insert(
                        "continue_dir",
                        Value::Str(self.continue_dir.trim().to_string()),
                    );
                }
            }
            InitGuess::AiGuess => {
                put_literal(&mut map, "AI_threshold", &self.ai_threshold, &mut errors);
                put_literal(&mut map, "AI_sigma", &self.ai_sigma, &mut errors);
                if !self.ai_trained_model.trim().is_empty() {
                    map.insert(
                        "AI_trained_model",
                        Value::Str(self.ai_trained_model.trim().to_string()),
                    );
                }
            }
        }

        self.features.add_config(&mut map, &mut errors);

        if errors.is_empty() {
            Ok(map)
        } else {
            Err(errors)
        }
    }

    /// Sets the basic parameters to the standard defaults.
    pub fn set_defaults(&mut self) {
        self.reconstructions = "1".to_string();
        self.device = "(0,1)".to_string();
        self.algorithm_sequence = "((3,(\"ER\",20),(\"HIO\",180)),(1,(\"ER\",20)))".to_string();
        self.hio_beta = ".9".to_string();
        self.initial_support_area = "(0.5,0.5,0.5)".to_string();
    }

    /// Renders the tab; returns the requested action, if any.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<RecAction> {
        let mut action = None;

        self.show_init_guess(ui);
        ui.add_space(6.0);
        if let Some(switch) = self.show_config_selector(ui) {
            action = Some(switch);
        }
        ui.add_space(6.0);
        self.show_base_params(ui);

        ui.add_space(8.0);
        ui.label(section_header("features"));
        self.features.show(ui);

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui.add(load_button("Load rec conf from")).clicked() {
                action = Some(RecAction::Tab(TabAction::LoadConfFrom(StageKind::Rec)));
            }
            if ui.add(primary_button("run reconstruction")).clicked() {
                action = Some(RecAction::Tab(TabAction::Run(StageKind::Rec)));
            }
        });

        action
    }

    fn show_init_guess(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("initial guess");
            egui::ComboBox::from_id_salt("init_guess")
                .selected_text(self.init_guess.label())
                .show_ui(ui, |ui| {
                    for guess in InitGuess::ALL {
                        ui.selectable_value(&mut self.init_guess, guess, guess.label());
                    }
                });
        });
        match self.init_guess {
            InitGuess::Random => {}
            InitGuess::Continue => {
                path_row(ui, "continue directory", &mut self.continue_dir, true);
            }
            InitGuess::AiGuess => {
                text_row(ui, "AI init shrink wrap threshold", &mut self.ai_threshold);
                text_row(ui, "AI init shrink wrap sigma", &mut self.ai_sigma);
                path_row(ui, "AI trained model file", &mut self.ai_trained_model, false);
            }
        }
    }

    fn show_config_selector(&mut self, ui: &mut egui::Ui) -> Option<RecAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            if ui.button("add configuration").clicked() {
                self.add_dialog = Some(String::new());
            }
            if !self.rec_ids.is_empty() {
                let selected_label = match self.current_rec_id() {
                    Some(id) => id,
                    None => "main".to_string(),
                };
                egui::ComboBox::from_id_salt("rec_config")
                    .selected_text(selected_label)
                    .show_ui(ui, |ui| {
                        let mut choice = self.selected_rec;
                        ui.selectable_value(&mut choice, 0, "main");
                        for (index, id) in self.rec_ids.iter().enumerate() {
                            ui.selectable_value(&mut choice, index + 1, id);
                        }
                        if choice != self.selected_rec {
                            action = Some(RecAction::SwitchConfig(choice));
                        }
                    });
            }
        });

        if let Some(mut text) = self.add_dialog.take() {
            let mut keep_open = true;
            egui::Window::new("New reconstruction configuration")
                .collapsible(false)
                .resizable(false)
                .show(ui.ctx(), |ui| {
                    ui.label("configuration id");
                    ui.text_edit_singleline(&mut text);
                    ui.horizontal(|ui| {
                        if ui.button("OK").clicked() {
                            keep_open = false;
                            if !text.trim().is_empty() {
                                action = Some(RecAction::AddConfig(text.trim().to_string()));
                            }
                        }
                        if ui.button("Cancel").clicked() {
                            keep_open = false;
                        }
                    });
                });
            if keep_open {
                self.add_dialog = Some(text);
            }
        }

        action
    }

    fn show_base_params(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("processor type");
            egui::ComboBox::from_id_salt("processing")
                .selected_text(if self.processing.is_empty() {
                    "auto"
                } else {
                    self.processing.as_str()
                })
                .show_ui(ui, |ui| {
                    for choice in PROCESSING_CHOICES {
                        ui.selectable_value(&mut self.processing, choice.to_string(), choice);
                    }
                });
        });
        text_row(ui, "device(s)", &mut self.device);
        text_row(ui, "number of reconstructions", &mut self.reconstructions);
        text_row(ui, "algorithm sequence", &mut self.algorithm_sequence);
        text_row(ui, "HIO beta", &mut self.hio_beta);
        text_row(ui, "initial support area", &mut self.initial_support_area);
        if ui.button("set to defaults").clicked() {
            self.set_defaults();
        }
    }
}
