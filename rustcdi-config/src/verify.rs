//! Per-stage configuration schemas and verification.
//!
//! Every stage configuration file is checked against a closed schema:
//! required parameters must be present, every parameter must have the
//! expected shape, and unknown parameters are rejected (a misspelled name
//! would otherwise be silently ignored by the processing stages).

use std::fmt;

use thiserror::Error;

use crate::{ConfigMap, Value};

/// Processing stage a configuration file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Main experiment configuration (`config`).
    Main,
    /// Raw-data preparation (`config_prep`).
    Prep,
    /// Data formatting (`config_data`).
    Data,
    /// Reconstruction (`config_rec`).
    Rec,
    /// Visualization (`config_disp`).
    Disp,
}

impl Stage {
    /// All stages, in processing order.
    pub const ALL: [Stage; 5] = [Stage::Main, Stage::Prep, Stage::Data, Stage::Rec, Stage::Disp];

    /// The configuration file name for this stage.
    pub fn config_name(self) -> &'static str {
        match self {
            Stage::Main => "config",
            Stage::Prep => "config_prep",
            Stage::Data => "config_data",
            Stage::Rec => "config_rec",
            Stage::Disp => "config_disp",
        }
    }

    /// Resolves a configuration file name to its stage.
    ///
    /// Alternate reconstruction configurations (`config_rec_<id>`) resolve
    /// to [`Stage::Rec`].
    pub fn from_config_name(name: &str) -> Option<Self> {
        match name {
            "config" => Some(Stage::Main),
            "config_prep" => Some(Stage::Prep),
            "config_data" => Some(Stage::Data),
            "config_disp" => Some(Stage::Disp),
            _ if name == "config_rec" || name.starts_with("config_rec_") => Some(Stage::Rec),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

/// Expected shape of a parameter value.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    /// String.
    Str,
    /// Integer.
    Int,
    /// Float (integer accepted).
    Float,
    /// Boolean.
    Bool,
    /// Tuple or list of integers.
    IntSeq,
    /// Tuple or list of numbers.
    NumSeq,
    /// Tuple or list of strings.
    StrSeq,
    /// Trigger: one to three integers, or a bare integer.
    Trigger,
    /// Tuple or list of integer sequences.
    NestedIntSeq,
    /// String restricted to a closed set.
    Choice(&'static [&'static str]),
}

/// One schema entry.
struct ParamSpec {
    name: &'static str,
    kind: Kind,
    required: bool,
}

const fn req(name: &'static str, kind: Kind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
    }
}

const fn opt(name: &'static str, kind: Kind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
    }
}

static MAIN_SCHEMA: &[ParamSpec] = &[
    req("working_dir", Kind::Str),
    req("experiment_id", Kind::Str),
    opt("scan", Kind::Str),
    opt("beamline", Kind::Str),
    opt("specfile", Kind::Str),
    opt("separate_scans", Kind::Bool),
    opt("converter_ver", Kind::Int),
];

static PREP_SCHEMA: &[ParamSpec] = &[
    opt("data_dir", Kind::Str),
    opt("darkfield_filename", Kind::Str),
    opt("whitefield_filename", Kind::Str),
    opt("roi", Kind::IntSeq),
    opt("min_files", Kind::Int),
    opt("exclude_scans", Kind::IntSeq),
];

static DATA_SCHEMA: &[ParamSpec] = &[
    req("intensity_threshold", Kind::Float),
    opt(
        "alien_alg",
        Kind::Choice(&["none", "block_aliens", "alien_file", "AutoAlien1"]),
    ),
    opt("aliens", Kind::NestedIntSeq),
    opt("alien_file", Kind::Str),
    opt("AA1_size_threshold", Kind::Float),
    opt("AA1_asym_threshold", Kind::Float),
    opt("AA1_min_pts", Kind::Int),
    opt("AA1_eps", Kind::Float),
    opt("AA1_amp_threshold", Kind::Float),
    opt("AA1_save_arrs", Kind::Bool),
    opt("AA1_expandcleanedsigma", Kind::Float),
    opt("binning", Kind::IntSeq),
    opt("center_shift", Kind::IntSeq),
    opt("adjust_dimensions", Kind::IntSeq),
];

static REC_SCHEMA: &[ParamSpec] = &[
    req("algorithm_sequence", Kind::Str),
    opt("reconstructions", Kind::Int),
    opt("device", Kind::IntSeq),
    opt(
        "processing",
        Kind::Choice(&["auto", "cp", "np", "af", "cuda", "opencl", "cpu"]),
    ),
    opt("hio_beta", Kind::Float),
    opt("initial_support_area", Kind::NumSeq),
    opt("init_guess", Kind::Choice(&["random", "continue", "AI_guess"])),
    opt("continue_dir", Kind::Str),
    opt("AI_threshold", Kind::Float),
    opt("AI_sigma", Kind::Float),
    opt("AI_trained_model", Kind::Str),
    // genetic algorithm block
    opt("ga_generations", Kind::Int),
    opt("ga_metrics", Kind::StrSeq),
    opt("ga_breed_modes", Kind::StrSeq),
    opt("ga_cullings", Kind::IntSeq),
    opt("ga_shrink_wrap_thresholds", Kind::NumSeq),
    opt("ga_shrink_wrap_gauss_sigmas", Kind::NumSeq),
    opt("ga_lowpass_filter_sigmas", Kind::NumSeq),
    opt("ga_gen_pc_start", Kind::Int),
    // low resolution block
    opt("resolution_trigger", Kind::Trigger),
    opt("lowpass_filter_sw_sigma_range", Kind::NumSeq),
    opt("lowpass_filter_range", Kind::NumSeq),
    // shrink wrap block
    opt("shrink_wrap_trigger", Kind::Trigger),
    opt("shrink_wrap_type", Kind::Str),
    opt("shrink_wrap_threshold", Kind::Float),
    opt("shrink_wrap_gauss_sigma", Kind::Float),
    // phase support block
    opt("phase_support_trigger", Kind::Trigger),
    opt("phm_phase_min", Kind::Float),
    opt("phm_phase_max", Kind::Float),
    // partial coherence block
    opt("pc_interval", Kind::Int),
    opt("pc_type", Kind::Str),
    opt("pc_LUCY_iterations", Kind::Int),
    opt("pc_normalize", Kind::Bool),
    opt("pc_LUCY_kernel", Kind::IntSeq),
    // twin removal block
    opt("twin_trigger", Kind::Trigger),
    opt("twin_halves", Kind::IntSeq),
    // averaging block
    opt("average_trigger", Kind::Trigger),
    // progress reporting block
    opt("progress_trigger", Kind::Trigger),
];

static DISP_SCHEMA: &[ParamSpec] = &[
    opt("results_dir", Kind::Str),
    opt("crop", Kind::NumSeq),
    opt("rampups", Kind::Int),
    opt("make_twin", Kind::Bool),
];

fn schema(stage: Stage) -> &'static [ParamSpec] {
    match stage {
        Stage::Main => MAIN_SCHEMA,
        Stage::Prep => PREP_SCHEMA,
        Stage::Data => DATA_SCHEMA,
        Stage::Rec => REC_SCHEMA,
        Stage::Disp => DISP_SCHEMA,
    }
}

/// A single verification problem.
#[derive(Debug, Clone)]
pub struct Issue {
    /// Parameter name the problem is about.
    pub param: String,
    /// What is wrong with it.
    pub problem: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.param, self.problem)
    }
}

/// Verification failure carrying every detected issue.
#[derive(Debug, Clone, Error)]
#[error("invalid {stage} configuration: {}", issues_summary(.issues))]
pub struct VerifyError {
    /// Stage whose schema was violated.
    pub stage: Stage,
    /// All detected issues.
    pub issues: Vec<Issue>,
}

fn issues_summary(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(Issue::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Verifies a configuration mapping against its stage schema.
///
/// All issues are collected before reporting, so a single pass surfaces
/// every problem in the file.
///
/// # Errors
///
/// Returns [`VerifyError`] listing every missing required parameter,
/// type mismatch, and unknown parameter.
pub fn verify(stage: Stage, map: &ConfigMap) -> Result<(), VerifyError> {
    let schema = schema(stage);
    let mut issues = Vec::new();

    for spec in schema {
        if spec.required && !map.contains(spec.name) {
            issues.push(Issue {
                param: spec.name.to_string(),
                problem: "required parameter is missing".to_string(),
            });
        }
    }

    for (name, value) in map.iter() {
        match schema.iter().find(|spec| spec.name == name) {
            Some(spec) => {
                if let Err(problem) = check_kind(spec.kind, value) {
                    issues.push(Issue {
                        param: name.to_string(),
                        problem,
                    });
                }
            }
            None => issues.push(Issue {
                param: name.to_string(),
                problem: "unknown parameter".to_string(),
            }),
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(VerifyError { stage, issues })
    }
}

fn check_kind(kind: Kind, value: &Value) -> Result<(), String> {
    let ok = match kind {
        Kind::Str => matches!(value, Value::Str(_)),
        Kind::Int => matches!(value, Value::Int(_)),
        Kind::Float => matches!(value, Value::Int(_) | Value::Float(_)),
        Kind::Bool => matches!(value, Value::Bool(_)),
        Kind::IntSeq => all_items(value, |v| matches!(v, Value::Int(_))),
        Kind::NumSeq => all_items(value, |v| matches!(v, Value::Int(_) | Value::Float(_))),
        Kind::StrSeq => all_items(value, |v| matches!(v, Value::Str(_))),
        Kind::Trigger => match value {
            Value::Int(_) => true,
            _ => value
                .items()
                .is_some_and(|items| {
                    (1..=3).contains(&items.len())
                        && items.iter().all(|v| matches!(v, Value::Int(_)))
                }),
        },
        Kind::NestedIntSeq => all_items(value, |v| {
            v.items()
                .is_some_and(|inner| inner.iter().all(|v| matches!(v, Value::Int(_))))
        }),
        Kind::Choice(options) => match value {
            Value::Str(s) => {
                if options.contains(&s.as_str()) {
                    true
                } else {
                    return Err(format!(
                        "must be one of {}, found \"{s}\"",
                        options.join(", ")
                    ));
                }
            }
            _ => false,
        },
    };
    if ok {
        Ok(())
    } else {
        Err(format!("expected {}, found {}", kind_name(kind), value.kind_name()))
    }
}

fn all_items(value: &Value, pred: impl Fn(&Value) -> bool) -> bool {
    value.items().is_some_and(|items| items.iter().all(pred))
}

fn kind_name(kind: Kind) -> &'static str {
    match kind {
        Kind::Str => "a string",
        Kind::Int => "an integer",
        Kind::Float => "a number",
        Kind::Bool => "a boolean",
        Kind::IntSeq => "a sequence of integers",
        Kind::NumSeq => "a sequence of numbers",
        Kind::StrSeq => "a sequence of strings",
        Kind::Trigger => "a trigger (1-3 integers)",
        Kind::NestedIntSeq => "a sequence of integer sequences",
        Kind::Choice(_) => "a string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_map() -> ConfigMap {
        let mut map = ConfigMap::new();
        map.insert("working_dir", Value::Str("/data/cdi".to_string()));
        map.insert("experiment_id", Value::Str("ab".to_string()));
        map
    }

    #[test]
    fn test_main_ok() {
        let mut map = main_map();
        map.insert("scan", Value::Str("54-57".to_string()));
        map.insert("converter_ver", Value::Int(2));
        assert!(verify(Stage::Main, &map).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let mut map = main_map();
        map.remove("working_dir");
        let err = verify(Stage::Main, &map).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].param, "working_dir");
    }

    #[test]
    fn test_collects_all_issues() {
        let mut map = ConfigMap::new();
        map.insert("experiment_id", Value::Int(5));
        map.insert("mystery", Value::Bool(true));
        let err = verify(Stage::Main, &map).unwrap_err();
        // missing working_dir, wrong experiment_id type, unknown key
        assert_eq!(err.issues.len(), 3, "{err}");
    }

    #[test]
    fn test_trigger_arity() {
        let mut map = ConfigMap::new();
        map.insert("algorithm_sequence", Value::Str("(20*ER)".to_string()));
        map.insert(
            "shrink_wrap_trigger",
            Value::Tuple(vec![Value::Int(1), Value::Int(1)]),
        );
        assert!(verify(Stage::Rec, &map).is_ok());

        map.insert(
            "shrink_wrap_trigger",
            Value::Tuple(vec![
                Value::Int(1),
                Value::Int(1),
                Value::Int(1),
                Value::Int(1),
            ]),
        );
        let err = verify(Stage::Rec, &map).unwrap_err();
        assert_eq!(err.issues[0].param, "shrink_wrap_trigger");
    }

    #[test]
    fn test_bare_int_trigger_accepted() {
        let mut map = ConfigMap::new();
        map.insert("algorithm_sequence", Value::Str("(20*ER)".to_string()));
        map.insert("twin_trigger", Value::Int(2));
        assert!(verify(Stage::Rec, &map).is_ok());
    }

    #[test]
    fn test_choice_values() {
        let mut map = ConfigMap::new();
        map.insert("intensity_threshold", Value::Float(1.5));
        map.insert("alien_alg", Value::Str("AutoAlien1".to_string()));
        assert!(verify(Stage::Data, &map).is_ok());

        map.insert("alien_alg", Value::Str("AutoAlien2".to_string()));
        let err = verify(Stage::Data, &map).unwrap_err();
        assert!(err.issues[0].problem.contains("one of"), "{err}");
    }

    #[test]
    fn test_float_accepts_int() {
        let mut map = ConfigMap::new();
        map.insert("intensity_threshold", Value::Int(25));
        assert!(verify(Stage::Data, &map).is_ok());
    }

    #[test]
    fn test_from_config_name_alternates() {
        assert_eq!(Stage::from_config_name("config"), Some(Stage::Main));
        assert_eq!(Stage::from_config_name("config_rec"), Some(Stage::Rec));
        assert_eq!(Stage::from_config_name("config_rec_lowres"), Some(Stage::Rec));
        assert_eq!(Stage::from_config_name("temp"), None);
    }
}
