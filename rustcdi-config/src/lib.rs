//! rustcdi-config: configuration codec, verification, and migration for CDI
//! experiment files.
//!
//! Every processing stage of a reconstruction workflow (preparation, data
//! formatting, reconstruction, visualization) is driven by a line-oriented
//! `name = literal` configuration file stored in the experiment's `conf`
//! directory. This crate owns the lifecycle of those files: parsing and
//! writing them with full typing, checking them against per-stage schemas,
//! and migrating files written under older schema versions.

pub mod codec;
pub mod convert;
pub mod error;
pub mod value;
pub mod verify;

pub use codec::{read_config, write_config, write_config_verified, ConfigMap};
pub use convert::{convert_dir, convert_map, version, CONVERTER_VERSION};
pub use error::{Error, Result};
pub use value::Value;
pub use verify::{verify, Issue, Kind, Stage, VerifyError};
