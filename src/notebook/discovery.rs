//! Notebook discovery.
//!
//! Walks the configured roots and classifies files as notebooks.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

/// First line of every Pluto notebook file.
pub const NOTEBOOK_HEADER: &str = "### A Pluto.jl notebook ###";

/// Extension of notebook files.
pub const NOTEBOOK_EXTENSION: &str = "jl";

/// Check whether a file is a notebook document.
///
/// A notebook has the `.jl` extension and starts with [`NOTEBOOK_HEADER`].
pub fn is_notebook(path: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some(NOTEBOOK_EXTENSION) {
        return false;
    }

    let Ok(file) = fs::File::open(path) else {
        return false;
    };
    let mut first_line = String::new();
    if BufReader::new(file).read_line(&mut first_line).is_err() {
        return false;
    }
    first_line.trim_end() == NOTEBOOK_HEADER
}

/// Find all notebooks under the given roots.
///
/// Hidden directories are not entered. Roots may be files. The result is
/// sorted and deduplicated so that every run visits notebooks in the same
/// order. Missing roots are skipped with a warning.
pub fn discover_notebooks(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for root in roots {
        if !root.exists() {
            warn!("Notebook root {} does not exist, skipping", root.display());
            continue;
        }
        if root.is_file() {
            if is_notebook(root) {
                found.push(root.clone());
            }
            continue;
        }
        walk(root, &mut found)?;
    }

    found.sort();
    found.dedup();
    debug!("Discovered {} notebook(s)", found.len());
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if is_hidden(&path) {
                continue;
            }
            walk(&path, found)?;
        } else if file_type.is_file() && is_notebook(&path) {
            found.push(path);
        }
    }
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn notebook(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, format!("{}\n# v0.19.40\n", NOTEBOOK_HEADER)).unwrap();
        path
    }

    #[test]
    fn classifies_by_extension_and_header() {
        let temp = TempDir::new().unwrap();
        let nb = notebook(temp.path(), "lecture.jl");
        let script = temp.path().join("script.jl");
        fs::write(&script, "println(\"hi\")\n").unwrap();
        let text = temp.path().join("notes.txt");
        fs::write(&text, format!("{}\n", NOTEBOOK_HEADER)).unwrap();

        assert!(is_notebook(&nb));
        assert!(!is_notebook(&script));
        assert!(!is_notebook(&text));
    }

    #[test]
    fn discovers_nested_notebooks_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        let b = notebook(temp.path(), "lectures/B.jl");
        let a = notebook(temp.path(), "lectures/A.jl");
        let c = notebook(temp.path(), "minis/C.jl");

        let found = discover_notebooks(&[temp.path().to_path_buf()]).unwrap();
        assert_eq!(found, vec![a, b, c]);
    }

    #[test]
    fn skips_hidden_directories() {
        let temp = TempDir::new().unwrap();
        notebook(temp.path(), ".git/stale.jl");
        let visible = notebook(temp.path(), "visible.jl");

        let found = discover_notebooks(&[temp.path().to_path_buf()]).unwrap();
        assert_eq!(found, vec![visible]);
    }

    #[test]
    fn overlapping_roots_are_deduplicated() {
        let temp = TempDir::new().unwrap();
        let nb = notebook(temp.path(), "lectures/A.jl");

        let roots = vec![temp.path().to_path_buf(), nb.clone()];
        let found = discover_notebooks(&roots).unwrap();
        assert_eq!(found, vec![nb]);
    }

    #[test]
    fn missing_root_is_skipped() {
        let temp = TempDir::new().unwrap();
        let found = discover_notebooks(&[temp.path().join("nope")]).unwrap();
        assert!(found.is_empty());
    }
}
