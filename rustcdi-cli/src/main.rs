//!
//! This binary provides a headless CLI for the rustcdi workflow: creating
//! experiments, verifying and migrating configuration files, and running
//! the external processing stages.
#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use rustcdi_config::{convert_dir, read_config, verify, write_config_verified, ConfigMap, Stage, Value, CONVERTER_VERSION};
use rustcdi_experiment::{
    load_config_maps, run_stage, Experiment, LoadOptions, RunOptions, StageKind, Toolchain,
};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] rustcdi_config::Error),

    #[error("Experiment error: {0}")]
    Experiment(#[from] rustcdi_experiment::Error),

    #[error("{0} configuration problem(s) found")]
    VerificationFailed(usize),
}

/// Stage selection for the run command.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StageArg {
    /// All stages, in processing order
    All,
    /// Raw-data preparation
    Prep,
    /// Data formatting
    Data,
    /// Reconstruction
    Rec,
    /// Visualization
    Disp,
}

impl StageArg {
    fn kinds(self) -> &'static [StageKind] {
        match self {
            StageArg::All => &StageKind::ALL,
            StageArg::Prep => &[StageKind::Prep],
            StageArg::Data => &[StageKind::Data],
            StageArg::Rec => &[StageKind::Rec],
            StageArg::Disp => &[StageKind::Disp],
        }
    }
}

/// Configuration and orchestration for CDI reconstruction workflows.
#[derive(Parser)]
#[command(name = "rustcdi")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run processing stages on an experiment
    Run {
        /// Experiment directory
        experiment_dir: PathBuf,

        /// Which stage(s) to run
        #[arg(long, value_enum, default_value = "all")]
        stage: StageArg,

        /// Alternate reconstruction configuration id
        #[arg(long)]
        rec_id: Option<String>,

        /// Report configuration problems as warnings instead of failing
        #[arg(long)]
        no_verify: bool,

        /// Toolchain description file naming the stage programs
        #[arg(long)]
        toolchain: Option<PathBuf>,
    },

    /// Create an experiment directory with a fresh main configuration
    Init {
        /// Working directory the experiment is created under
        working_dir: PathBuf,

        /// Experiment id
        id: String,

        /// Scan or scan range, e.g. 54 or 54-57
        #[arg(long)]
        scan: Option<String>,

        /// Beamline name
        #[arg(long)]
        beamline: Option<String>,

        /// Spec file recorded in the main configuration
        #[arg(long)]
        specfile: Option<PathBuf>,
    },

    /// Verify every configuration file of an experiment
    Verify {
        /// Experiment directory
        experiment_dir: PathBuf,

        /// Also verify this alternate reconstruction configuration
        #[arg(long)]
        rec_id: Option<String>,
    },

    /// Migrate an experiment's configuration files to the current schema
    Convert {
        /// Experiment directory
        experiment_dir: PathBuf,
    },

    /// Print an experiment's parsed configuration files
    Show {
        /// Experiment directory
        experiment_dir: PathBuf,

        /// Only this stage
        #[arg(long, value_enum)]
        stage: Option<StageArg>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            experiment_dir,
            stage,
            rec_id,
            no_verify,
            toolchain,
        } => run(&experiment_dir, stage, rec_id, no_verify, toolchain.as_deref()),

        Commands::Init {
            working_dir,
            id,
            scan,
            beamline,
            specfile,
        } => init(&working_dir, &id, scan.as_deref(), beamline.as_deref(), specfile.as_deref()),

        Commands::Verify {
            experiment_dir,
            rec_id,
        } => verify_experiment(&experiment_dir, rec_id.as_deref()),

        Commands::Convert { experiment_dir } => {
            let experiment = Experiment::open(&experiment_dir)?;
            if convert_dir(&experiment.conf_dir())? {
                println!("Converted configuration files to schema version {CONVERTER_VERSION}");
            } else {
                println!("Configuration files are already at schema version {CONVERTER_VERSION}");
            }
            Ok(())
        }

        Commands::Show {
            experiment_dir,
            stage,
        } => show(&experiment_dir, stage),
    }
}

fn run(
    experiment_dir: &Path,
    stage: StageArg,
    rec_id: Option<String>,
    no_verify: bool,
    toolchain_path: Option<&Path>,
) -> Result<()> {
    let toolchain = match toolchain_path {
        Some(path) => Toolchain::from_file(path)?,
        None => Toolchain::default(),
    };

    let kinds = stage.kinds();
    let config_stages: Vec<Stage> = kinds.iter().map(|kind| kind.config_stage()).collect();
    let options = LoadOptions {
        rec_id: rec_id.clone(),
        no_verify,
    };
    // Verifies and, when stale, migrates all configuration files up front.
    let loaded = load_config_maps(experiment_dir, &config_stages, &options)?;
    if loaded.converted {
        println!("Converted configuration files to schema version {CONVERTER_VERSION}");
    }
    for warning in &loaded.warnings {
        eprintln!("warning: {warning}");
    }

    let experiment = Experiment::open(experiment_dir)?;
    let run_options = RunOptions { rec_id, no_verify };
    for &kind in kinds {
        println!("Running {}...", kind.label());
        let run = run_stage(&toolchain, kind, &experiment, &run_options)?;
        println!("Finished {} in {:.2}s", kind.label(), run.elapsed.as_secs_f64());
    }
    Ok(())
}

fn init(
    working_dir: &Path,
    id: &str,
    scan: Option<&str>,
    beamline: Option<&str>,
    specfile: Option<&Path>,
) -> Result<()> {
    let experiment = Experiment::create(working_dir, id, scan)?;

    let mut main = ConfigMap::new();
    main.insert(
        "working_dir",
        Value::Str(working_dir.to_string_lossy().into_owned()),
    );
    main.insert("experiment_id", Value::Str(id.trim().to_string()));
    if let Some(scan) = scan {
        main.insert(
            "scan",
            Value::Str(scan.split_whitespace().collect::<String>()),
        );
    }
    if let Some(beamline) = beamline {
        main.insert("beamline", Value::Str(beamline.to_string()));
    }
    if let Some(specfile) = specfile {
        main.insert(
            "specfile",
            Value::Str(specfile.to_string_lossy().into_owned()),
        );
    }
    main.insert("converter_ver", Value::Int(CONVERTER_VERSION));

    write_config_verified(&main, &experiment.conf_dir(), Stage::Main.config_name())?;
    println!("Created experiment at {}", experiment.dir().display());
    Ok(())
}

fn verify_experiment(experiment_dir: &Path, rec_id: Option<&str>) -> Result<()> {
    let experiment = Experiment::open(experiment_dir)?;
    let mut problems = 0usize;

    let mut names: Vec<String> = Stage::ALL
        .iter()
        .map(|stage| stage.config_name().to_string())
        .collect();
    if let Some(id) = rec_id {
        names.push(format!("config_rec_{id}"));
    }

    for name in names {
        let path = experiment.conf_dir().join(&name);
        if !path.is_file() {
            continue;
        }
        let Some(stage) = Stage::from_config_name(&name) else {
            continue;
        };
        match read_config(&path) {
            Ok(map) => match verify(stage, &map) {
                Ok(()) => println!("{name}: ok"),
                Err(err) => {
                    problems += err.issues.len();
                    println!("{name}: {} problem(s)", err.issues.len());
                    for issue in &err.issues {
                        println!("  {issue}");
                    }
                }
            },
            Err(err) => {
                problems += 1;
                println!("{name}: {err}");
            }
        }
    }

    if problems == 0 {
        Ok(())
    } else {
        Err(CliError::VerificationFailed(problems))
    }
}

fn show(experiment_dir: &Path, stage: Option<StageArg>) -> Result<()> {
    let experiment = Experiment::open(experiment_dir)?;
    let stages: Vec<Stage> = match stage {
        None | Some(StageArg::All) => Stage::ALL.to_vec(),
        Some(arg) => arg
            .kinds()
            .iter()
            .map(|kind| kind.config_stage())
            .collect(),
    };

    for stage in stages {
        let path = experiment.stage_config_path(stage, None);
        if !path.is_file() {
            continue;
        }
        let map = read_config(&path)?;
        println!("// {}", stage.config_name());
        print!("{}", map.to_text());
        println!();
    }
    Ok(())
}
