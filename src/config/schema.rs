//! Configuration schema definitions for nbenv.
//!
//! This module contains the struct definitions that map to the
//! `nbenv.yml` configuration file format.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the package-environment directory expected in the project root.
pub const DEFAULT_ENVIRONMENT_DIR: &str = "pluto-deployment-environment";

/// Root configuration structure for nbenv.yml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NbenvConfig {
    /// Directories (or single notebook files) to scan, relative to the project root
    pub roots: Vec<PathBuf>,

    /// Global settings
    pub settings: Settings,
}

impl Default for NbenvConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(".")],
            settings: Settings::default(),
        }
    }
}

/// Global settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory that must exist in the project root before syncing
    pub environment_dir: PathBuf,

    /// Julia executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub julia: Option<String>,

    /// Extra arguments passed to every Julia invocation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub julia_args: Vec<String>,

    /// Keep temporary work directories after the run
    #[serde(default, skip_serializing_if = "is_false")]
    pub keep_workdirs: bool,

    /// Default output mode: verbose, normal, quiet, silent
    pub default_output: OutputMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment_dir: PathBuf::from(DEFAULT_ENVIRONMENT_DIR),
            julia: None,
            julia_args: Vec::new(),
            keep_workdirs: false,
            default_output: OutputMode::default(),
        }
    }
}

fn is_false(b: &bool) -> bool {
    !b
}

/// Output verbosity mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Verbose,
    #[default]
    Normal,
    Quiet,
    Silent,
}
