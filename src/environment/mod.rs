//! Materialized package environments.
//!
//! An [`Environment`] is a private work directory holding exactly two files,
//! `Project.toml` and `Manifest.toml`, that a package manager can activate.
//! Environments are created from extracted notebook text, cloned from one
//! another, and read back once the package manager is done with them.
//!
//! # Example
//!
//! ```
//! use nbenv::environment::{Environment, WorkdirPolicy};
//!
//! let env = Environment::materialize("[deps]\n", "", WorkdirPolicy::default()).unwrap();
//! assert!(env.project_path().exists());
//! assert_eq!(env.read_project().unwrap(), "[deps]\n");
//! ```

pub mod manifest;

pub use manifest::{LockEntry, LockManifest, ProjectManifest, MANIFEST_HEADER};

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::Result;

/// File name of the project manifest inside an environment.
pub const PROJECT_FILE: &str = "Project.toml";

/// File name of the lock manifest inside an environment.
pub const MANIFEST_FILE: &str = "Manifest.toml";

/// Prefix of every work directory nbenv creates.
pub const WORKDIR_PREFIX: &str = "nbenv-";

/// What happens to work directories when their environment is dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkdirPolicy {
    /// Leave directories on disk for inspection.
    pub keep: bool,
}

impl WorkdirPolicy {
    /// Policy that keeps directories after the run.
    pub fn keep() -> Self {
        Self { keep: true }
    }
}

/// A project/lock manifest pair in its own directory.
#[derive(Debug)]
pub struct Environment {
    path: PathBuf,
    // Deletes the directory on drop; `None` once kept.
    _dir: Option<TempDir>,
}

impl Environment {
    /// Write a project and lock manifest into a fresh work directory.
    pub fn materialize(project: &str, manifest: &str, policy: WorkdirPolicy) -> Result<Self> {
        let env = Self::allocate(policy)?;
        fs::write(env.project_path(), project)?;
        fs::write(env.manifest_path(), manifest)?;
        debug!("Materialized environment at {}", env.path.display());
        Ok(env)
    }

    /// Copy this environment into a fresh work directory.
    pub fn duplicate(&self, policy: WorkdirPolicy) -> Result<Self> {
        let env = Self::allocate(policy)?;
        fs::copy(self.project_path(), env.project_path())?;
        fs::copy(self.manifest_path(), env.manifest_path())?;
        debug!(
            "Cloned environment {} into {}",
            self.path.display(),
            env.path.display()
        );
        Ok(env)
    }

    fn allocate(policy: WorkdirPolicy) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir()?;

        if policy.keep {
            let path = dir.keep();
            info!("Keeping work directory {}", path.display());
            Ok(Self { path, _dir: None })
        } else {
            Ok(Self {
                path: dir.path().to_path_buf(),
                _dir: Some(dir),
            })
        }
    }

    /// The work directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `Project.toml`.
    pub fn project_path(&self) -> PathBuf {
        self.path.join(PROJECT_FILE)
    }

    /// Path of `Manifest.toml`.
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }

    /// Current project manifest text.
    pub fn read_project(&self) -> Result<String> {
        Ok(fs::read_to_string(self.project_path())?)
    }

    /// Current lock manifest text.
    ///
    /// A package manager may delete the manifest of an environment with no
    /// dependencies; that reads as empty.
    pub fn read_manifest(&self) -> Result<String> {
        match fs::read_to_string(self.manifest_path()) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parsed project manifest.
    pub fn project(&self) -> Result<ProjectManifest> {
        ProjectManifest::parse(&self.read_project()?, &self.project_path())
    }

    /// Parsed lock manifest.
    pub fn lock(&self) -> Result<LockManifest> {
        LockManifest::parse(&self.read_manifest()?, &self.manifest_path())
    }
}
