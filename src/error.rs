//! Error types for nbenv operations.
//!
//! This module defines [`NbenvError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Per-notebook problems (missing blocks, a failed rewrite) are reported
//!   and the batch continues
//! - Problems with the shared merged environment abort the whole run
//! - Use `anyhow::Error` (via `NbenvError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for nbenv operations.
#[derive(Debug, Error)]
pub enum NbenvError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// The package-environment directory is missing from the project root.
    #[error("Package environment directory not found: {path} (run nbenv from the repository root)")]
    EnvironmentDirMissing { path: PathBuf },

    /// A Project.toml or Manifest.toml could not be parsed.
    #[error("Failed to parse manifest {path}: {message}")]
    ManifestParseError { path: PathBuf, message: String },

    /// The package manager could not resolve the requested packages.
    #[error("Could not resolve packages [{packages}]: {message}")]
    ResolutionFailed { packages: String, message: String },

    /// The Julia executable could not be started.
    #[error("Julia not found: '{program}' (use --julia or NBENV_JULIA to point at it)")]
    JuliaNotFound { program: String },

    /// A package manager operation failed for another reason.
    #[error("Package manager operation '{operation}' failed: {message}")]
    PackageManagerFailed { operation: String, message: String },

    /// A notebook lost one of its manifest blocks before it could be rewritten.
    #[error("{path} no longer contains a {marker} block")]
    RewriteTargetMissing { path: PathBuf, marker: String },

    /// Manifest text would close its block early.
    #[error("Manifest text for {marker} contains a closing fence (\"\"\")")]
    FenceInManifest { marker: String },

    /// External command failed to start or exited unsuccessfully.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NbenvError {
    /// Whether this error invalidates the whole run rather than one notebook.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ResolutionFailed { .. }
                | Self::JuliaNotFound { .. }
                | Self::EnvironmentDirMissing { .. }
                | Self::ConfigParseError { .. }
                | Self::ConfigNotFound { .. }
        )
    }
}

/// Result type alias for nbenv operations.
pub type Result<T> = std::result::Result<T, NbenvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = NbenvError::ConfigParseError {
            path: PathBuf::from("/nbenv.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/nbenv.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn environment_dir_missing_displays_path() {
        let err = NbenvError::EnvironmentDirMissing {
            path: PathBuf::from("/repo/pluto-deployment-environment"),
        };
        assert!(err
            .to_string()
            .contains("/repo/pluto-deployment-environment"));
    }

    #[test]
    fn resolution_failed_displays_packages() {
        let err = NbenvError::ResolutionFailed {
            packages: "Plots, Makie".into(),
            message: "unsatisfiable requirements".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Plots, Makie"));
        assert!(msg.contains("unsatisfiable"));
    }

    #[test]
    fn rewrite_target_missing_displays_path_and_marker() {
        let err = NbenvError::RewriteTargetMissing {
            path: PathBuf::from("lectures/intro.jl"),
            marker: "PLUTO_MANIFEST_TOML_CONTENTS".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("lectures/intro.jl"));
        assert!(msg.contains("PLUTO_MANIFEST_TOML_CONTENTS"));
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = NbenvError::CommandFailed {
            command: "julia -e 'using Pkg'".into(),
            code: Some(1),
        };
        let msg = err.to_string();
        assert!(msg.contains("julia"));
        assert!(msg.contains("1"));
    }

    #[test]
    fn resolution_failure_is_fatal() {
        let err = NbenvError::ResolutionFailed {
            packages: "A".into(),
            message: "conflict".into(),
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn missing_julia_is_fatal_and_names_program() {
        let err = NbenvError::JuliaNotFound {
            program: "/opt/julia/bin/julia".into(),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/opt/julia/bin/julia"));
    }

    #[test]
    fn rewrite_failure_is_not_fatal() {
        let err = NbenvError::FenceInManifest {
            marker: "PLUTO_PROJECT_TOML_CONTENTS".into(),
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: NbenvError = io_err.into();
        assert!(matches!(err, NbenvError::Io(_)));
    }
}
