//! rustcdi-experiment: experiment directories, config lifecycle, and stage
//! launching.
//!
//! This crate owns everything between the configuration files and the
//! external processing programs: the `<working_dir>/<id>[_<scan>]` naming
//! convention, opening and creating experiment directories, loading the
//! configuration set with verification and schema migration, and running
//! the four processing stages in order.

pub mod error;
pub mod experiment;
pub mod lifecycle;
pub mod stages;
pub mod toolchain;

pub use error::{Error, Result};
pub use experiment::{experiment_name, Experiment};
pub use lifecycle::{load_config_maps, LoadOptions, LoadedConfigs};
pub use stages::{run_all, run_stage, RunOptions, StageKind, StageRun};
pub use toolchain::Toolchain;
