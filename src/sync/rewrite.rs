//! Writing an environment back into its notebook.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::environment::Environment;
use crate::error::Result;
use crate::notebook::replace_manifests;

/// What rewriting did to a notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The notebook already embedded this environment.
    Unchanged,
    /// The manifest blocks were replaced.
    Rewritten,
    /// The manifest blocks would change, but nothing was written.
    WouldRewrite,
}

/// Embed `env` into the notebook at `path`.
///
/// The notebook is read again at this point, so a file whose blocks
/// disappeared since extraction fails here and stays untouched. The new
/// content replaces the file atomically, and only when it differs.
pub fn rewrite_notebook(path: &Path, env: &Environment, dry_run: bool) -> Result<RewriteOutcome> {
    let project = env.read_project()?;
    let manifest = env.read_manifest()?;

    let original = fs::read_to_string(path)?;
    let updated = replace_manifests(path, &original, &project, &manifest)?;

    if updated == original {
        debug!("{} is up to date", path.display());
        return Ok(RewriteOutcome::Unchanged);
    }
    if dry_run {
        return Ok(RewriteOutcome::WouldRewrite);
    }

    write_atomically(path, &updated)?;
    debug!("Rewrote {}", path.display());
    Ok(RewriteOutcome::Rewritten)
}

fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), fs::metadata(path)?.permissions())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::WorkdirPolicy;
    use crate::error::NbenvError;
    use tempfile::TempDir;

    const NOTEBOOK: &str = "### A Pluto.jl notebook ###\n\nx = 1\n\nPLUTO_PROJECT_TOML_CONTENTS = \"\"\"\nold project\n\"\"\"\n\nPLUTO_MANIFEST_TOML_CONTENTS = \"\"\"\nold manifest\n\"\"\"\n\n# ╔═╡ Cell order:\n";

    fn notebook(dir: &TempDir, text: &str) -> std::path::PathBuf {
        let path = dir.path().join("nb.jl");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn replaces_both_blocks() {
        let temp = TempDir::new().unwrap();
        let path = notebook(&temp, NOTEBOOK);
        let env = Environment::materialize("[deps]\n", "lock\n", WorkdirPolicy::default()).unwrap();

        let outcome = rewrite_notebook(&path, &env, false).unwrap();

        assert_eq!(outcome, RewriteOutcome::Rewritten);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "### A Pluto.jl notebook ###\n\nx = 1\n\nPLUTO_PROJECT_TOML_CONTENTS = \"\"\"\n[deps]\n\"\"\"\n\nPLUTO_MANIFEST_TOML_CONTENTS = \"\"\"\nlock\n\"\"\"\n\n# ╔═╡ Cell order:\n"
        );
    }

    #[test]
    fn identical_content_is_not_written() {
        let temp = TempDir::new().unwrap();
        let path = notebook(&temp, NOTEBOOK);
        let env = Environment::materialize("old project\n", "old manifest\n", WorkdirPolicy::default())
            .unwrap();

        let outcome = rewrite_notebook(&path, &env, false).unwrap();

        assert_eq!(outcome, RewriteOutcome::Unchanged);
        assert_eq!(fs::read_to_string(&path).unwrap(), NOTEBOOK);
    }

    #[test]
    fn dry_run_leaves_file_alone() {
        let temp = TempDir::new().unwrap();
        let path = notebook(&temp, NOTEBOOK);
        let env = Environment::materialize("[deps]\n", "lock\n", WorkdirPolicy::default()).unwrap();

        let outcome = rewrite_notebook(&path, &env, true).unwrap();

        assert_eq!(outcome, RewriteOutcome::WouldRewrite);
        assert_eq!(fs::read_to_string(&path).unwrap(), NOTEBOOK);
    }

    #[test]
    fn vanished_block_fails_without_touching_file() {
        let temp = TempDir::new().unwrap();
        let text = "### A Pluto.jl notebook ###\nPLUTO_PROJECT_TOML_CONTENTS = \"\"\"\nold\n\"\"\"\n";
        let path = notebook(&temp, text);
        let env = Environment::materialize("[deps]\n", "lock\n", WorkdirPolicy::default()).unwrap();

        let err = rewrite_notebook(&path, &env, false).unwrap_err();

        assert!(matches!(err, NbenvError::RewriteTargetMissing { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[cfg(unix)]
    #[test]
    fn permissions_are_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = notebook(&temp, NOTEBOOK);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        let env = Environment::materialize("[deps]\n", "lock\n", WorkdirPolicy::default()).unwrap();

        rewrite_notebook(&path, &env, false).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
