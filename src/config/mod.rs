//! Configuration loading and parsing for nbenv.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//!
//! # Example
//!
//! ```
//! use nbenv::config::load_merged_config;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("nbenv.yml"), "roots: [notebooks]").unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! assert_eq!(config.roots, vec![std::path::PathBuf::from("notebooks")]);
//! ```
//!
//! # Configuration File Locations
//!
//! nbenv discovers and merges configuration in this order:
//! 1. Project config (`nbenv.yml`)
//! 2. Local overrides (`nbenv.local.yml`)

pub mod loader;
pub mod merger;
pub mod schema;

pub use loader::{
    load_config, load_config_file, load_config_value, load_merged_config, ConfigPaths,
    LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE,
};
pub use merger::{deep_merge, merge_configs};
pub use schema::{NbenvConfig, OutputMode, Settings, DEFAULT_ENVIRONMENT_DIR};
