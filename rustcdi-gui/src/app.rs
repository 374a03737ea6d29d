//! Main application state and logic.
//!
//! Contains the `CdiApp` struct which binds the experiment form and the
//! four stage tabs to the configuration files, and dispatches the external
//! processing stages on worker threads.

use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use anyhow::{anyhow, Context};
use eframe::egui;

use rustcdi_config::{
    read_config, write_config_verified, ConfigMap, Stage, Value, CONVERTER_VERSION,
};
use rustcdi_experiment::{
    experiment_name, load_config_maps, Experiment, LoadOptions, RunOptions, StageKind, Toolchain,
};

use crate::message::AppMessage;
use crate::pipeline;
use crate::state::ProcessingState;
use crate::ui::tabs::{RecAction, TabAction, TabKind, Tabs};
use crate::util::format_seconds;

/// Main application state.
pub struct CdiApp {
    /// Working directory the experiment lives under.
    pub(crate) working_dir: String,
    /// Experiment id field.
    pub(crate) experiment_id: String,
    /// Scan selection field.
    pub(crate) scan: String,
    /// Beamline name field; gates the prep and display tabs.
    pub(crate) beamline: String,
    /// Spec file field.
    pub(crate) specfile: String,

    /// The experiment the tabs are currently bound to.
    pub(crate) experiment: Option<Experiment>,
    /// Identity captured when the experiment was set, for drift detection.
    pub(crate) set_id: String,
    pub(crate) set_scan: String,

    /// The four stage tabs.
    pub(crate) tabs: Tabs,
    /// Visible tab.
    pub(crate) selected_tab: TabKind,

    /// External stage programs.
    pub(crate) toolchain: Toolchain,
    /// Background run state.
    pub(crate) processing: ProcessingState,
    /// Pending info popup text.
    pub(crate) info: Option<String>,

    /// Message receiver for background workers.
    pub(crate) rx: Receiver<AppMessage>,
    /// Message sender handed to background workers.
    pub(crate) tx: Sender<AppMessage>,

    /// Process info for the status-bar memory readout.
    pub(crate) system: sysinfo::System,
}

impl Default for CdiApp {
    fn default() -> Self {
        let (tx, rx) = channel();
        Self {
            working_dir: String::new(),
            experiment_id: String::new(),
            scan: String::new(),
            beamline: String::new(),
            specfile: String::new(),

            experiment: None,
            set_id: String::new(),
            set_scan: String::new(),

            tabs: Tabs::default(),
            selected_tab: TabKind::Data,

            toolchain: Toolchain::default(),
            processing: ProcessingState::default(),
            info: None,

            rx,
            tx,

            system: sysinfo::System::new(),
        }
    }
}

impl eframe::App for CdiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump_messages();

        self.render_top_panel(ctx);
        self.render_status_bar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.render_main_form(ui);
                    ui.add_space(8.0);
                    ui.separator();
                    self.render_tabs(ui);
                    ui.add_space(12.0);
                });
        });

        self.render_info_popup(ctx);

        if self.processing.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(200));
        }
    }
}

impl CdiApp {
    /// Queue an info popup.
    pub(crate) fn show_info(&mut self, text: impl Into<String>) {
        self.info = Some(text.into());
    }

    fn pump_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                AppMessage::StageStarted(stage) => {
                    self.processing.running = Some(stage);
                    self.processing.status_text = format!("Running {}...", stage.label());
                }
                AppMessage::StageFinished(stage, elapsed) => {
                    self.processing.running = None;
                    if !self.processing.run_all {
                        self.processing.status_text =
                            format!("Finished {} in {}", stage.label(), format_seconds(elapsed));
                    }
                }
                AppMessage::StageFailed(stage, error) => {
                    self.processing.running = None;
                    self.processing.run_all = false;
                    self.processing.status_text = "Ready".to_string();
                    self.show_info(format!("{} failed: {error}", stage.label()));
                }
                AppMessage::AllFinished(elapsed) => {
                    self.processing.run_all = false;
                    self.processing.status_text =
                        format!("Finished all stages in {}", format_seconds(elapsed));
                }
            }
        }
    }

    fn render_info_popup(&mut self, ctx: &egui::Context) {
        let Some(text) = self.info.clone() else {
            return;
        };
        let mut close = false;
        egui::Window::new("Info")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(text);
                ui.add_space(6.0);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });
        if close {
            self.info = None;
        }
    }

    /// Scan field with whitespace stripped; `None` when empty.
    pub(crate) fn normalized_scan(&self) -> Option<String> {
        let scan: String = self.scan.split_whitespace().collect();
        (!scan.is_empty()).then_some(scan)
    }

    /// True when the form still matches the experiment it was set to.
    pub(crate) fn is_exp_set(&self) -> bool {
        self.experiment.is_some()
            && self.set_id == self.experiment_id.trim()
            && self.set_scan == self.normalized_scan().unwrap_or_default()
    }

    /// True when a directory exists for the identity currently in the form.
    pub(crate) fn is_exp_exists(&self) -> bool {
        let id = self.experiment_id.trim();
        if id.is_empty() || self.working_dir.trim().is_empty() {
            return false;
        }
        Path::new(self.working_dir.trim())
            .join(experiment_name(id, self.normalized_scan().as_deref()))
            .exists()
    }

    /// Create the experiment for the current form values and save every
    /// configuration file.
    pub(crate) fn set_experiment(&mut self) {
        let working_dir = self.working_dir.trim().to_string();
        if working_dir.is_empty() {
            self.show_info(
                "The working directory is not set. Select a valid working directory and set experiment",
            );
            return;
        }
        if !Path::new(&working_dir).is_dir() {
            self.show_info(format!(
                "The working directory {working_dir} does not exist. Select a valid working directory and set experiment"
            ));
            self.working_dir.clear();
            return;
        }
        let id = self.experiment_id.trim().to_string();
        if id.is_empty() {
            self.show_info("experiment id must be entered");
            return;
        }

        match Experiment::create(Path::new(&working_dir), &id, self.normalized_scan().as_deref()) {
            Ok(experiment) => {
                self.experiment = Some(experiment);
                self.set_id = id;
                self.set_scan = self.normalized_scan().unwrap_or_default();
                if let Err(err) = self.save_main() {
                    self.show_info(err.to_string());
                    return;
                }
                let problems = self.save_tabs();
                if !problems.is_empty() {
                    self.show_info(problems.join("\n"));
                }
                self.refresh_rec_ids();
            }
            Err(err) => self.show_info(format!("cannot set experiment: {err}")),
        }
    }

    /// Write the main configuration from the form fields.
    pub(crate) fn save_main(&self) -> anyhow::Result<()> {
        let experiment = self
            .experiment
            .as_ref()
            .ok_or_else(|| anyhow!("the experiment has not been created yet"))?;

        let mut main = ConfigMap::new();
        main.insert("working_dir", Value::Str(self.working_dir.trim().to_string()));
        main.insert("experiment_id", Value::Str(self.set_id.clone()));
        if !self.set_scan.is_empty() {
            main.insert("scan", Value::Str(self.set_scan.clone()));
        }
        if !self.beamline.trim().is_empty() {
            main.insert("beamline", Value::Str(self.beamline.trim().to_string()));
        }
        if !self.specfile.trim().is_empty() {
            main.insert("specfile", Value::Str(self.specfile.trim().to_string()));
        }
        main.insert("converter_ver", Value::Int(CONVERTER_VERSION));

        write_config_verified(&main, &experiment.conf_dir(), Stage::Main.config_name())
            .context("please check the entries in the main window, cannot save this format")?;
        Ok(())
    }

    /// Save every tab's non-empty configuration; returns the problems.
    pub(crate) fn save_tabs(&mut self) -> Vec<String> {
        let Some(experiment) = self.experiment.clone() else {
            return Vec::new();
        };
        let conf_dir = experiment.conf_dir();
        let mut problems = Vec::new();
        let beamline_set = !self.beamline.trim().is_empty();

        if beamline_set {
            Self::save_tab(&conf_dir, "config_prep", self.tabs.prep.to_config(), &mut problems);
        }
        Self::save_tab(&conf_dir, "config_data", self.tabs.data.to_config(), &mut problems);
        Self::save_tab(
            &conf_dir,
            &self.tabs.rec.config_file_name(),
            self.tabs.rec.to_config(),
            &mut problems,
        );
        if beamline_set {
            Self::save_tab(&conf_dir, "config_disp", self.tabs.disp.to_config(), &mut problems);
        }
        problems
    }

    fn save_tab(
        conf_dir: &Path,
        name: &str,
        result: Result<ConfigMap, Vec<String>>,
        problems: &mut Vec<String>,
    ) {
        match result {
            Ok(map) => {
                if map.is_empty() {
                    return;
                }
                if let Err(err) = write_config_verified(&map, conf_dir, name) {
                    problems.push(format!("{name}: {err}"));
                }
            }
            Err(errors) => {
                problems.extend(errors.into_iter().map(|err| format!("{name}: {err}")));
            }
        }
    }

    /// Write one stage's configuration before running it.
    fn save_stage_config(&mut self, stage: StageKind) -> anyhow::Result<()> {
        let experiment = self
            .experiment
            .clone()
            .ok_or_else(|| anyhow!("the experiment has not been created yet"))?;
        let (name, result) = match stage {
            StageKind::Prep => ("config_prep".to_string(), self.tabs.prep.to_config()),
            StageKind::Data => ("config_data".to_string(), self.tabs.data.to_config()),
            StageKind::Rec => (self.tabs.rec.config_file_name(), self.tabs.rec.to_config()),
            StageKind::Disp => ("config_disp".to_string(), self.tabs.disp.to_config()),
        };
        let map = result.map_err(|errors| anyhow!("{}", errors.join("\n")))?;
        write_config_verified(&map, &experiment.conf_dir(), &name)
            .with_context(|| format!("cannot save {name}"))?;
        Ok(())
    }

    /// Pick an experiment directory and load its configuration set.
    pub(crate) fn load_experiment(&mut self) {
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };
        if let Err(err) = self.load_experiment_from(&dir) {
            self.show_info(err.to_string());
        }
    }

    fn load_experiment_from(&mut self, dir: &Path) -> anyhow::Result<()> {
        Experiment::open(dir)
            .map_err(|_| anyhow!("missing conf/config file, not an experiment directory"))?;

        let options = LoadOptions {
            rec_id: None,
            no_verify: true,
        };
        let loaded = load_config_maps(
            dir,
            &[Stage::Prep, Stage::Data, Stage::Rec, Stage::Disp],
            &options,
        )
        .with_context(|| format!("please check the configuration files in {}", dir.display()))?;

        self.working_dir = loaded.main.get_str("working_dir").unwrap_or_default().to_string();
        self.experiment_id = loaded
            .main
            .get_str("experiment_id")
            .unwrap_or_default()
            .to_string();
        self.scan = loaded.main.get_str("scan").unwrap_or_default().to_string();
        self.beamline = loaded.main.get_str("beamline").unwrap_or_default().to_string();
        self.specfile = loaded.main.get_str("specfile").unwrap_or_default().to_string();

        self.set_id = self.experiment_id.trim().to_string();
        self.set_scan = self.normalized_scan().unwrap_or_default();
        self.experiment = Some(Experiment::open(dir)?);

        self.tabs.clear();
        if let Some(map) = loaded.stage(Stage::Prep) {
            self.tabs.prep.apply_config(map);
        }
        if let Some(map) = loaded.stage(Stage::Data) {
            self.tabs.data.apply_config(map);
        }
        if let Some(map) = loaded.stage(Stage::Rec) {
            self.tabs.rec.apply_config(map);
        }
        if let Some(map) = loaded.stage(Stage::Disp) {
            self.tabs.disp.apply_config(map);
        }
        self.refresh_rec_ids();

        if !self.specfile.is_empty() && !Path::new(&self.specfile).is_file() {
            self.show_info(format!(
                "The spec file {} from the config file does not exist",
                self.specfile
            ));
        }
        if !loaded.warnings.is_empty() {
            let text = loaded
                .warnings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            self.show_info(format!("configuration warnings:\n{text}"));
        }
        if loaded.converted {
            // rewrite the migrated forms so the files match what is shown
            self.save_main()?;
            let problems = self.save_tabs();
            if !problems.is_empty() {
                self.show_info(problems.join("\n"));
            }
        }
        Ok(())
    }

    /// Re-read the alternate reconstruction config ids from disk.
    pub(crate) fn refresh_rec_ids(&mut self) {
        if let Some(experiment) = &self.experiment {
            match experiment.rec_ids() {
                Ok(ids) => self.tabs.rec.rec_ids = ids,
                Err(err) => log::warn!("cannot list reconstruction configs: {err}"),
            }
        }
    }

    /// Save everything and run all four stages in order.
    pub(crate) fn run_everything(&mut self) {
        if !self.is_exp_exists() {
            self.show_info("the experiment has not been created yet");
            return;
        }
        if !self.is_exp_set() {
            self.show_info("the experiment has changed, press \"set experiment\"");
            return;
        }
        if self.processing.is_busy() {
            return;
        }
        if let Err(err) = self.save_main() {
            self.show_info(err.to_string());
            return;
        }
        let problems = self.save_tabs();
        if !problems.is_empty() {
            self.show_info(problems.join("\n"));
            return;
        }
        let Some(experiment) = self.experiment.clone() else {
            return;
        };

        let toolchain = self.toolchain.clone();
        let options = RunOptions {
            rec_id: self.tabs.rec.current_rec_id(),
            no_verify: false,
        };
        let tx = self.tx.clone();
        self.processing.run_all = true;
        self.processing.status_text = "Running everything...".to_string();
        thread::spawn(move || pipeline::run_all_worker(&toolchain, &experiment, &options, &tx));
    }

    /// Handle a plain tab action (run / load-from).
    pub(crate) fn handle_tab_action(&mut self, action: TabAction) {
        match action {
            TabAction::Run(stage) => self.run_stage_for_tab(stage),
            TabAction::LoadConfFrom(stage) => self.load_tab_conf_from(stage),
        }
    }

    /// Handle a reconstruction tab action.
    pub(crate) fn handle_rec_action(&mut self, action: RecAction) {
        match action {
            RecAction::Tab(tab_action) => self.handle_tab_action(tab_action),
            RecAction::SwitchConfig(index) => self.switch_rec_config(index),
            RecAction::AddConfig(id) => self.add_rec_config(&id),
        }
    }

    fn run_stage_for_tab(&mut self, stage: StageKind) {
        if !self.is_exp_exists() {
            self.show_info("the experiment has not been created yet");
            return;
        }
        if !self.is_exp_set() {
            self.show_info("the experiment has changed, press \"set experiment\"");
            return;
        }
        if self.processing.is_busy() {
            return;
        }
        if stage == StageKind::Data && self.tabs.data.intensity_threshold.trim().is_empty() {
            self.show_info("Please, enter the intensity threshold parameter");
            return;
        }
        let Some(experiment) = self.experiment.clone() else {
            return;
        };
        if !stage.is_ready(&experiment) {
            self.show_info(format!(
                "{} needs {}",
                stage.label(),
                stage.requirement_hint()
            ));
            return;
        }
        if let Err(err) = self.save_stage_config(stage) {
            self.show_info(err.to_string());
            return;
        }

        let toolchain = self.toolchain.clone();
        let options = RunOptions {
            rec_id: self.tabs.rec.current_rec_id(),
            no_verify: false,
        };
        let tx = self.tx.clone();
        self.processing.running = Some(stage);
        self.processing.status_text = format!("Running {}...", stage.label());
        thread::spawn(move || {
            pipeline::stage_worker(&toolchain, stage, &experiment, &options, &tx);
        });
    }

    fn load_tab_conf_from(&mut self, stage: StageKind) {
        let Some(path) = rfd::FileDialog::new().pick_file() else {
            return;
        };
        match read_config(&path) {
            Ok(map) => match stage {
                StageKind::Prep => self.tabs.prep.apply_config(&map),
                StageKind::Data => self.tabs.data.apply_config(&map),
                StageKind::Rec => self.tabs.rec.apply_config(&map),
                StageKind::Disp => self.tabs.disp.apply_config(&map),
            },
            Err(err) => self.show_info(format!(
                "please check configuration file {}: {err}",
                path.display()
            )),
        }
    }

    /// Save the outgoing reconstruction config, then load the selected one.
    fn switch_rec_config(&mut self, index: usize) {
        let Some(experiment) = self.experiment.clone() else {
            self.tabs.rec.selected_rec = index;
            return;
        };

        let outgoing = self.tabs.rec.config_file_name();
        match self.tabs.rec.to_config() {
            Ok(map) => {
                if !map.is_empty() {
                    if let Err(err) = write_config_verified(&map, &experiment.conf_dir(), &outgoing)
                    {
                        self.show_info(format!("configuration {outgoing} was not saved: {err}"));
                    }
                }
            }
            Err(errors) => {
                self.show_info(errors.join("\n"));
                return;
            }
        }

        self.tabs.rec.selected_rec = index;
        let incoming = experiment.conf_dir().join(self.tabs.rec.config_file_name());
        if incoming.is_file() {
            match read_config(&incoming) {
                Ok(map) => self.tabs.rec.apply_config(&map),
                Err(err) => self.show_info(format!(
                    "please check configuration file {}: {err}",
                    incoming.display()
                )),
            }
        }
    }

    /// Clone `config_rec` into a new alternate configuration.
    fn add_rec_config(&mut self, id: &str) {
        if self.tabs.rec.rec_ids.iter().any(|existing| existing == id) {
            self.show_info(format!("the id '{id}' is already used"));
            return;
        }
        let Some(experiment) = self.experiment.clone() else {
            self.show_info("the experiment has not been created yet");
            return;
        };

        // the main config_rec must exist before it can be cloned
        let main_rec = experiment.conf_dir().join("config_rec");
        if !main_rec.is_file() {
            match self.tabs.rec.to_config() {
                Ok(map) => {
                    if let Err(err) =
                        write_config_verified(&map, &experiment.conf_dir(), "config_rec")
                    {
                        self.show_info(format!("cannot save config_rec: {err}"));
                        return;
                    }
                }
                Err(errors) => {
                    self.show_info(errors.join("\n"));
                    return;
                }
            }
        }

        match experiment.add_rec_config(id) {
            Ok(_) => {
                self.refresh_rec_ids();
                if let Some(position) =
                    self.tabs.rec.rec_ids.iter().position(|existing| existing == id)
                {
                    self.tabs.rec.selected_rec = position + 1;
                }
            }
            Err(err) => self.show_info(err.to_string()),
        }
    }

    /// Resident set size of this process, for the status bar.
    pub(crate) fn memory_rss_bytes(&mut self) -> u64 {
        let Ok(pid) = sysinfo::get_current_pid() else {
            return 0;
        };
        self.system.refresh_process(pid);
        self.system.process(pid).map_or(0, sysinfo::Process::memory)
    }
}
