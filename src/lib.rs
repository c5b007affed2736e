//! nbenv - Consolidate the package environments embedded in Pluto notebooks.
//!
//! A Pluto notebook carries its own `Project.toml` and `Manifest.toml` as
//! string blocks inside the source file. nbenv merges the environments of a
//! set of notebooks into one resolution, then writes each notebook back with
//! that resolution pruned to the packages it declares, so every notebook
//! agrees on the version of every shared package.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading and layering
//! - [`environment`] - Work directories holding a manifest pair
//! - [`error`] - Error types and result aliases
//! - [`notebook`] - Notebook discovery and manifest block parsing
//! - [`pkg`] - Package manager abstraction (Julia's Pkg and a mock)
//! - [`shell`] - External command execution
//! - [`sync`] - Extract, merge, prune and rewrite phases
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use nbenv::notebook::extract_manifests;
//!
//! let text = "### A Pluto.jl notebook ###\n\
//!             PLUTO_PROJECT_TOML_CONTENTS = \"\"\"\n[deps]\n\"\"\"\n";
//! let (project, manifest) = extract_manifests(text);
//! assert_eq!(project.as_deref(), Some("[deps]\n"));
//! assert!(manifest.is_none());
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod notebook;
pub mod pkg;
pub mod shell;
pub mod sync;
pub mod ui;

pub use error::{NbenvError, Result};
