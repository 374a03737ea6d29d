//! Optional reconstruction feature panels.
//!
//! Each feature contributes an independent block of `config_rec`
//! parameters when active. The panel shows the feature list on the left
//! and the selected feature's parameters on the right; inactive features
//! are dimmed in the list. On load, a feature activates when its marker
//! parameter (the block's trigger or interval) is present.

use eframe::egui;

use rustcdi_config::ConfigMap;

use super::tabs::{fill_field, put_literal, put_str, text_row};
use super::theme::ThemeColors;

/// One optional reconstruction feature.
pub trait Feature {
    /// Display name in the feature list.
    fn id(&self) -> &'static str;

    /// Whether the feature contributes its block on save.
    fn is_active(&self) -> bool;

    /// Activates or deactivates the feature.
    fn set_active(&mut self, on: bool);

    /// Clears the feature's fields and deactivates it.
    fn clear(&mut self);

    /// Sets the feature's fields to their standard defaults.
    fn set_defaults(&mut self);

    /// Fills the feature from a configuration mapping, activating it when
    /// its marker parameter is present.
    fn apply_config(&mut self, map: &ConfigMap);

    /// Adds the feature's block to the mapping when active.
    fn add_config(&self, map: &mut ConfigMap, errors: &mut Vec<String>);

    /// Renders the feature's parameter fields.
    fn show_params(&mut self, ui: &mut egui::Ui);
}

/// Genetic algorithm guidance.
#[derive(Default)]
pub struct GeneticAlgorithm {
    active: bool,
    pub generations: String,
    pub metrics: String,
    pub breed_modes: String,
    pub cullings: String,
    pub shrink_wrap_thresholds: String,
    pub shrink_wrap_gauss_sigmas: String,
    pub lowpass_filter_sigmas: String,
    pub gen_pc_start: String,
}

impl Feature for GeneticAlgorithm {
    fn id(&self) -> &'static str {
        "GA"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, on: bool) {
        self.active = on;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn set_defaults(&mut self) {
        self.active = true;
        self.generations = "5".to_string();
        self.metrics = "(\"chi\",\"chi\",\"area\",\"chi\",\"sharpness\")".to_string();
        self.breed_modes = "(\"sqrt_ab\",\"sqrt_ab\",\"avg_ab\",\"max_ab_pa\",\"sqrt_ab\")".to_string();
        self.cullings = "(2,2,1)".to_string();
        self.shrink_wrap_thresholds = "(.1,.1,.1,.1,.1)".to_string();
        self.shrink_wrap_gauss_sigmas = "(1.0,1.0,1.0,1.0)".to_string();
        self.lowpass_filter_sigmas = "(2.0,1.5)".to_string();
        self.gen_pc_start = "3".to_string();
    }

    fn apply_config(&mut self, map: &ConfigMap) {
        self.clear();
        if !map.contains("ga_generations") {
            return;
        }
        self.active = true;
        fill_field(map, "ga_generations", &mut self.generations);
        fill_field(map, "ga_metrics", &mut self.metrics);
        fill_field(map, "ga_breed_modes", &mut self.breed_modes);
        fill_field(map, "ga_cullings", &mut self.cullings);
        fill_field(map, "ga_shrink_wrap_thresholds", &mut self.shrink_wrap_thresholds);
        fill_field(map, "ga_shrink_wrap_gauss_sigmas", &mut self.shrink_wrap_gauss_sigmas);
        fill_field(map, "ga_lowpass_filter_sigmas", &mut self.lowpass_filter_sigmas);
        fill_field(map, "ga_gen_pc_start", &mut self.gen_pc_start);
    }

    fn add_config(&self, map: &mut ConfigMap, errors: &mut Vec<String>) {
        if !self.active {
            return;
        }
        put_literal(map, "ga_generations", &self.generations, errors);
        put_literal(map, "ga_metrics", &self.metrics, errors);
        put_literal(map, "ga_breed_modes", &self.breed_modes, errors);
        put_literal(map, "ga_cullings", &self.cullings, errors);
        put_literal(map, "ga_shrink_wrap_thresholds", &self.shrink_wrap_thresholds, errors);
        put_literal(map, "ga_shrink_wrap_gauss_sigmas", &self.shrink_wrap_gauss_sigmas, errors);
        put_literal(map, "ga_lowpass_filter_sigmas", &self.lowpass_filter_sigmas, errors);
        put_literal(map, "ga_gen_pc_start", &self.gen_pc_start, errors);
    }

    fn show_params(&mut self, ui: &mut egui::Ui) {
        text_row(ui, "generations", &mut self.generations);
        text_row(ui, "fitness metrics", &mut self.metrics);
        text_row(ui, "breed modes", &mut self.breed_modes);
        text_row(ui, "cullings", &mut self.cullings);
        text_row(ui, "after breed support thresholds", &mut self.shrink_wrap_thresholds);
        text_row(ui, "after breed shrink wrap sigmas", &mut self.shrink_wrap_gauss_sigmas);
        text_row(ui, "low resolution sigmas", &mut self.lowpass_filter_sigmas);
        text_row(ui, "gen to start pcdi", &mut self.gen_pc_start);
    }
}

/// Low-resolution early generations.
#[derive(Default)]
pub struct LowResolution {
    active: bool,
    pub triggers: String,
    pub sigma_range: String,
    pub det_range: String,
}

impl Feature for LowResolution {
    fn id(&self) -> &'static str {
        "low resolution"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, on: bool) {
        self.active = on;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn set_defaults(&mut self) {
        self.active = true;
        self.triggers = "(0,1,320)".to_string();
        self.sigma_range = "(2.0)".to_string();
        self.det_range = "(.7)".to_string();
    }

    fn apply_config(&mut self, map: &ConfigMap) {
        self.clear();
        if !map.contains("resolution_trigger") {
            return;
        }
        self.active = true;
        fill_field(map, "resolution_trigger", &mut self.triggers);
        fill_field(map, "lowpass_filter_sw_sigma_range", &mut self.sigma_range);
        fill_field(map, "lowpass_filter_range", &mut self.det_range);
    }

    fn add_config(&self, map: &mut ConfigMap, errors: &mut Vec<String>) {
        if !self.active {
            return;
        }
        put_literal(map, "resolution_trigger", &self.triggers, errors);
        put_literal(map, "lowpass_filter_sw_sigma_range", &self.sigma_range, errors);
        put_literal(map, "lowpass_filter_range", &self.det_range, errors);
    }

    fn show_params(&mut self, ui: &mut egui::Ui) {
        text_row(ui, "low resolution triggers", &mut self.triggers);
        text_row(ui, "sigma range", &mut self.sigma_range);
        text_row(ui, "det range", &mut self.det_range);
    }
}

/// Shrink-wrap support update.
#[derive(Default)]
pub struct ShrinkWrap {
    active: bool,
    pub triggers: String,
    pub algorithm: String,
    pub threshold: String,
    pub gauss_sigma: String,
}

impl Feature for ShrinkWrap {
    fn id(&self) -> &'static str {
        "shrink wrap"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, on: bool) {
        self.active = on;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn set_defaults(&mut self) {
        self.active = true;
        self.triggers = "(1,1)".to_string();
        self.algorithm = "GAUSS".to_string();
        self.threshold = "0.1".to_string();
        self.gauss_sigma = "1.0".to_string();
    }

    fn apply_config(&mut self, map: &ConfigMap) {
        self.clear();
        if !map.contains("shrink_wrap_trigger") {
            return;
        }
        self.active = true;
        fill_field(map, "shrink_wrap_trigger", &mut self.triggers);
        fill_field(map, "shrink_wrap_type", &mut self.algorithm);
        fill_field(map, "shrink_wrap_threshold", &mut self.threshold);
        fill_field(map, "shrink_wrap_gauss_sigma", &mut self.gauss_sigma);
    }

    fn add_config(&self, map: &mut ConfigMap, errors: &mut Vec<String>) {
        if !self.active {
            return;
        }
        put_literal(map, "shrink_wrap_trigger", &self.triggers, errors);
        put_str(map, "shrink_wrap_type", &self.algorithm);
        put_literal(map, "shrink_wrap_threshold", &self.threshold, errors);
        put_literal(map, "shrink_wrap_gauss_sigma", &self.gauss_sigma, errors);
    }

    fn show_params(&mut self, ui: &mut egui::Ui) {
        text_row(ui, "shrink wrap triggers", &mut self.triggers);
        text_row(ui, "shrink wrap algorithm", &mut self.algorithm);
        text_row(ui, "shrink wrap threshold", &mut self.threshold);
        text_row(ui, "shrink wrap Gauss sigma", &mut self.gauss_sigma);
    }
}

/// Phase constraint on the support.
#[derive(Default)]
pub struct PhaseSupport {
    active: bool,
    pub triggers: String,
    pub phase_min: String,
    pub phase_max: String,
}

impl Feature for PhaseSupport {
    fn id(&self) -> &'static str {
        "phase support"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, on: bool) {
        self.active = on;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn set_defaults(&mut self) {
        self.active = true;
        self.triggers = "(0,1,320)".to_string();
        self.phase_min = "-1.57".to_string();
        self.phase_max = "1.57".to_string();
    }

    fn apply_config(&mut self, map: &ConfigMap) {
        self.clear();
        if !map.contains("phase_support_trigger") {
            return;
        }
        self.active = true;
        fill_field(map, "phase_support_trigger", &mut self.triggers);
        fill_field(map, "phm_phase_min", &mut self.phase_min);
        fill_field(map, "phm_phase_max", &mut self.phase_max);
    }

    fn add_config(&self, map: &mut ConfigMap, errors: &mut Vec<String>) {
        if !self.active {
            return;
        }
        put_literal(map, "phase_support_trigger", &self.triggers, errors);
        put_literal(map, "phm_phase_min", &self.phase_min, errors);
        put_literal(map, "phm_phase_max", &self.phase_max, errors);
    }

    fn show_params(&mut self, ui: &mut egui::Ui) {
        text_row(ui, "phase support triggers", &mut self.triggers);
        text_row(ui, "phase minimum", &mut self.phase_min);
        text_row(ui, "phase maximum", &mut self.phase_max);
    }
}

/// Partial coherence correction.
#[derive(Default)]
pub struct PartialCoherence {
    active: bool,
    pub interval: String,
    pub algorithm: String,
    pub lucy_iterations: String,
    pub normalize: String,
    pub lucy_kernel: String,
}

impl Feature for PartialCoherence {
    fn id(&self) -> &'static str {
        "partial coherence"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, on: bool) {
        self.active = on;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn set_defaults(&mut self) {
        self.active = true;
        self.interval = "50".to_string();
        self.algorithm = "LUCY".to_string();
        self.lucy_iterations = "20".to_string();
        self.normalize = "true".to_string();
        self.lucy_kernel = "(16,16,16)".to_string();
    }

    fn apply_config(&mut self, map: &ConfigMap) {
        self.clear();
        if !map.contains("pc_interval") {
            return;
        }
        self.active = true;
        fill_field(map, "pc_interval", &mut self.interval);
        fill_field(map, "pc_type", &mut self.algorithm);
        fill_field(map, "pc_LUCY_iterations", &mut self.lucy_iterations);
        fill_field(map, "pc_normalize", &mut self.normalize);
        fill_field(map, "pc_LUCY_kernel", &mut self.lucy_kernel);
    }

    fn add_config(&self, map: &mut ConfigMap, errors: &mut Vec<String>) {
        if !self.active {
            return;
        }
        put_literal(map, "pc_interval", &self.interval, errors);
        put_str(map, "pc_type", &self.algorithm);
        put_literal(map, "pc_LUCY_iterations", &self.lucy_iterations, errors);
        put_literal(map, "pc_normalize", &self.normalize, errors);
        put_literal(map, "pc_LUCY_kernel", &self.lucy_kernel, errors);
    }

    fn show_params(&mut self, ui: &mut egui::Ui) {
        text_row(ui, "pc interval", &mut self.interval);
        text_row(ui, "partial coherence algorithm", &mut self.algorithm);
        text_row(ui, "LUCY iteration number", &mut self.lucy_iterations);
        text_row(ui, "normalize", &mut self.normalize);
        text_row(ui, "LUCY kernel area", &mut self.lucy_kernel);
    }
}

/// Twin-image removal.
#[derive(Default)]
pub struct TwinRemoval {
    active: bool,
    pub triggers: String,
    pub halves: String,
}

impl Feature for TwinRemoval {
    fn id(&self) -> &'static str {
        "twin"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, on: bool) {
        self.active = on;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn set_defaults(&mut self) {
        self.active = true;
        self.triggers = "(2)".to_string();
        self.halves = "(0,0)".to_string();
    }

    fn apply_config(&mut self, map: &ConfigMap) {
        self.clear();
        if !map.contains("twin_trigger") {
            return;
        }
        self.active = true;
        fill_field(map, "twin_trigger", &mut self.triggers);
        fill_field(map, "twin_halves", &mut self.halves);
    }

    fn add_config(&self, map: &mut ConfigMap, errors: &mut Vec<String>) {
        if !self.active {
            return;
        }
        put_literal(map, "twin_trigger", &self.triggers, errors);
        put_literal(map, "twin_halves", &self.halves, errors);
    }

    fn show_params(&mut self, ui: &mut egui::Ui) {
        text_row(ui, "twin triggers", &mut self.triggers);
        text_row(ui, "twin halves", &mut self.halves);
    }
}

/// Averaging of the trailing iterations.
#[derive(Default)]
pub struct Averaging {
    active: bool,
    pub triggers: String,
}

impl Feature for Averaging {
    fn id(&self) -> &'static str {
        "average"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, on: bool) {
        self.active = on;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn set_defaults(&mut self) {
        self.active = true;
        self.triggers = "(-50,1)".to_string();
    }

    fn apply_config(&mut self, map: &ConfigMap) {
        self.clear();
        if !map.contains("average_trigger") {
            return;
        }
        self.active = true;
        fill_field(map, "average_trigger", &mut self.triggers);
    }

    fn add_config(&self, map: &mut ConfigMap, errors: &mut Vec<String>) {
        if !self.active {
            return;
        }
        put_literal(map, "average_trigger", &self.triggers, errors);
    }

    fn show_params(&mut self, ui: &mut egui::Ui) {
        text_row(ui, "average triggers", &mut self.triggers);
    }
}

/// Progress reporting.
#[derive(Default)]
pub struct ProgressReporting {
    active: bool,
    pub triggers: String,
}

impl Feature for ProgressReporting {
    fn id(&self) -> &'static str {
        "progress"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, on: bool) {
        self.active = on;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn set_defaults(&mut self) {
        self.active = true;
        self.triggers = "(0,20)".to_string();
    }

    fn apply_config(&mut self, map: &ConfigMap) {
        self.clear();
        if !map.contains("progress_trigger") {
            return;
        }
        self.active = true;
        fill_field(map, "progress_trigger", &mut self.triggers);
    }

    fn add_config(&self, map: &mut ConfigMap, errors: &mut Vec<String>) {
        if !self.active {
            return;
        }
        put_literal(map, "progress_trigger", &self.triggers, errors);
    }

    fn show_params(&mut self, ui: &mut egui::Ui) {
        text_row(ui, "progress triggers", &mut self.triggers);
    }
}

/// Composition of all reconstruction features.
pub struct Features {
    selected: usize,
    items: Vec<Box<dyn Feature>>,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            selected: 0,
            items: vec![
                Box::new(GeneticAlgorithm::default()),
                Box::new(LowResolution::default()),
                Box::new(ShrinkWrap::default()),
                Box::new(PhaseSupport::default()),
                Box::new(PartialCoherence::default()),
                Box::new(TwinRemoval::default()),
                Box::new(Averaging::default()),
                Box::new(ProgressReporting::default()),
            ],
        }
    }
}

impl Features {
    /// Clears and deactivates every feature.
    pub fn clear(&mut self) {
        for feature in &mut self.items {
            feature.clear();
        }
    }

    /// Fills every feature from a configuration mapping.
    pub fn apply_config(&mut self, map: &ConfigMap) {
        for feature in &mut self.items {
            feature.apply_config(map);
        }
    }

    /// Adds every active feature's block to the mapping.
    pub fn add_config(&self, map: &mut ConfigMap, errors: &mut Vec<String>) {
        for feature in &self.items {
            feature.add_config(map, errors);
        }
    }

    /// Renders the feature list and the selected feature's parameters.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_top(|ui| {
            let colors = ThemeColors::from_ui(ui);

            ui.vertical(|ui| {
                ui.set_width(150.0);
                for (index, feature) in self.items.iter().enumerate() {
                    let color = if feature.is_active() {
                        colors.text_primary
                    } else {
                        colors.text_dim
                    };
                    let label = egui::RichText::new(feature.id()).color(color);
                    if ui
                        .selectable_label(index == self.selected, label)
                        .clicked()
                    {
                        self.selected = index;
                    }
                }
            });

            ui.separator();

            ui.vertical(|ui| {
                let feature = &mut self.items[self.selected];
                let mut active = feature.is_active();
                if ui.checkbox(&mut active, "active").changed() {
                    feature.set_active(active);
                }
                if active {
                    feature.show_params(ui);
                    ui.add_space(4.0);
                    if ui.button("set to defaults").clicked() {
                        feature.set_defaults();
                    }
                }
            });
        });
    }
}
