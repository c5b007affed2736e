//! Extraction and materialization of a notebook's environment.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::environment::{Environment, LockManifest, ProjectManifest, WorkdirPolicy};
use crate::error::Result;
use crate::notebook::{BlockKind, NotebookDocument};

/// Why a notebook takes no part in a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The notebook could not be read.
    Unreadable(String),
    /// One of the two manifest blocks is missing.
    MissingBlock(BlockKind),
    /// A manifest block is not valid TOML.
    Unparseable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(msg) => write!(f, "could not be read: {}", msg),
            Self::MissingBlock(kind) => write!(f, "has no {} block", kind.marker()),
            Self::Unparseable(msg) => write!(f, "has an invalid manifest: {}", msg),
        }
    }
}

/// Result of extracting one notebook.
#[derive(Debug)]
pub enum Extraction {
    /// Both manifests were found and written to a work directory.
    Ready(Environment),
    /// The notebook is left out of the sync.
    Skipped(SkipReason),
}

impl Extraction {
    /// The materialized environment, if any.
    pub fn environment(&self) -> Option<&Environment> {
        match self {
            Self::Ready(env) => Some(env),
            Self::Skipped(_) => None,
        }
    }
}

/// Read a notebook and materialize its embedded environment.
///
/// Problems with the notebook itself are reported as
/// [`Extraction::Skipped`] and logged; only failing to create the work
/// directory is an error.
pub fn extract_environment(path: &Path, policy: WorkdirPolicy) -> Result<Extraction> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => return Ok(skip(path, SkipReason::Unreadable(e.to_string()))),
    };

    let doc = NotebookDocument::parse(&text);
    let (Some(project), Some(manifest)) =
        (doc.body(BlockKind::Project), doc.body(BlockKind::Manifest))
    else {
        let kind = doc.missing().unwrap_or(BlockKind::Project);
        return Ok(skip(path, SkipReason::MissingBlock(kind)));
    };

    if let Err(e) = ProjectManifest::parse(project, path) {
        return Ok(skip(path, SkipReason::Unparseable(e.to_string())));
    }
    if let Err(e) = LockManifest::parse(manifest, path) {
        return Ok(skip(path, SkipReason::Unparseable(e.to_string())));
    }

    Ok(Extraction::Ready(Environment::materialize(
        project, manifest, policy,
    )?))
}

fn skip(path: &Path, reason: SkipReason) -> Extraction {
    warn!("Skipping {}: {}", path.display(), reason);
    Extraction::Skipped(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn complete_notebook_is_materialized() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "nb.jl",
            "PLUTO_PROJECT_TOML_CONTENTS = \"\"\"\n[deps]\nA = \"x\"\n\"\"\"\nPLUTO_MANIFEST_TOML_CONTENTS = \"\"\"\nmanifest_format = \"2.0\"\n\"\"\"\n",
        );

        let extraction = extract_environment(&path, WorkdirPolicy::default()).unwrap();
        let env = extraction.environment().expect("should be ready");
        assert_eq!(env.read_project().unwrap(), "[deps]\nA = \"x\"\n");
        assert_eq!(env.read_manifest().unwrap(), "manifest_format = \"2.0\"\n");
    }

    #[test]
    fn missing_manifest_block_is_skipped() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "nb.jl",
            "PLUTO_PROJECT_TOML_CONTENTS = \"\"\"\n[deps]\n\"\"\"\n",
        );

        let extraction = extract_environment(&path, WorkdirPolicy::default()).unwrap();
        assert!(matches!(
            extraction,
            Extraction::Skipped(SkipReason::MissingBlock(BlockKind::Manifest))
        ));
    }

    #[test]
    fn plain_notebook_is_skipped() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "nb.jl", "### A Pluto.jl notebook ###\n1 + 1\n");

        let extraction = extract_environment(&path, WorkdirPolicy::default()).unwrap();
        assert!(matches!(
            extraction,
            Extraction::Skipped(SkipReason::MissingBlock(BlockKind::Project))
        ));
    }

    #[test]
    fn invalid_toml_is_skipped() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "nb.jl",
            "PLUTO_PROJECT_TOML_CONTENTS = \"\"\"\n[deps\n\"\"\"\nPLUTO_MANIFEST_TOML_CONTENTS = \"\"\"\n\"\"\"\n",
        );

        let extraction = extract_environment(&path, WorkdirPolicy::default()).unwrap();
        assert!(matches!(
            extraction,
            Extraction::Skipped(SkipReason::Unparseable(_))
        ));
    }

    #[test]
    fn unreadable_notebook_is_skipped() {
        let temp = TempDir::new().unwrap();
        let extraction =
            extract_environment(&temp.path().join("gone.jl"), WorkdirPolicy::default()).unwrap();
        assert!(matches!(
            extraction,
            Extraction::Skipped(SkipReason::Unreadable(_))
        ));
    }

    #[test]
    fn skip_reason_names_the_marker() {
        let reason = SkipReason::MissingBlock(BlockKind::Manifest);
        assert!(reason.to_string().contains("PLUTO_MANIFEST_TOML_CONTENTS"));
    }
}
