//! Configuration file discovery and loading.
//!
//! This module handles finding and loading configuration files from
//! the project root in the correct priority order.

use crate::config::merger::merge_configs;
use crate::config::schema::NbenvConfig;
use crate::error::{NbenvError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "nbenv.yml";

/// Local override file name.
pub const LOCAL_CONFIG_FILE: &str = "nbenv.local.yml";

/// Paths to configuration files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. Project config (`nbenv.yml`)
/// 2. Local overrides (`nbenv.local.yml`)
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project config: nbenv.yml
    pub project: Option<PathBuf>,

    /// Local overrides: nbenv.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            project: existing(project_root.join(PROJECT_CONFIG_FILE)),
            project_local: existing(project_root.join(LOCAL_CONFIG_FILE)),
        }
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.project_local.iter()).collect()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.is_file() {
        Some(path)
    } else {
        None
    }
}

/// Load a single config file and parse it into NbenvConfig.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<NbenvConfig> {
    let value = load_config_value(path)?;
    from_value(value, path)
}

/// Load a config file as raw YAML Value (for merging).
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            NbenvError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            NbenvError::Io(e)
        }
    })?;

    let value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| NbenvError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    // An empty file parses as null
    if value.is_null() {
        Ok(serde_yaml::Value::Mapping(Default::default()))
    } else {
        Ok(value)
    }
}

fn from_value(value: serde_yaml::Value, path: &Path) -> Result<NbenvConfig> {
    serde_yaml::from_value(value).map_err(|e| NbenvError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load and merge the config files of a project.
///
/// A project without any config file gets the default configuration.
pub fn load_merged_config(project_root: &Path) -> Result<NbenvConfig> {
    let paths = ConfigPaths::discover(project_root);

    let mut configs = Vec::new();
    for path in paths.all_existing() {
        configs.push(load_config_value(path)?);
    }

    if configs.is_empty() {
        return Ok(NbenvConfig::default());
    }

    let merged = merge_configs(configs);
    from_value(merged, &project_root.join(PROJECT_CONFIG_FILE))
}

/// Load config with optional path override.
///
/// If `config_override` is provided, loads only that file without merging.
/// Otherwise, discovers and merges the project's config files.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<NbenvConfig> {
    match config_override {
        Some(path) => load_config_file(path),
        None => load_merged_config(project_root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::OutputMode;
    use tempfile::TempDir;

    #[test]
    fn discover_finds_project_and_local_config() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PROJECT_CONFIG_FILE), "roots: [nb]").unwrap();
        fs::write(temp.path().join(LOCAL_CONFIG_FILE), "roots: [mine]").unwrap();

        let paths = ConfigPaths::discover(temp.path());
        assert!(paths.project.is_some());
        assert!(paths.project_local.is_some());
        assert_eq!(paths.all_existing().len(), 2);
    }

    #[test]
    fn missing_files_yield_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_merged_config(temp.path()).unwrap();
        assert_eq!(config, NbenvConfig::default());
    }

    #[test]
    fn local_overrides_project() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "settings:\n  julia: julia\n  default_output: verbose\n",
        )
        .unwrap();
        fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            "settings:\n  julia: /usr/local/bin/julia\n",
        )
        .unwrap();

        let config = load_merged_config(temp.path()).unwrap();
        assert_eq!(config.settings.julia.as_deref(), Some("/usr/local/bin/julia"));
        assert_eq!(config.settings.default_output, OutputMode::Verbose);
    }

    #[test]
    fn empty_file_is_default_config() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PROJECT_CONFIG_FILE), "").unwrap();

        let config = load_merged_config(temp.path()).unwrap();
        assert_eq!(config, NbenvConfig::default());
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(PROJECT_CONFIG_FILE);
        fs::write(&path, "roots: [unclosed").unwrap();

        let err = load_merged_config(temp.path()).unwrap_err();
        assert!(matches!(err, NbenvError::ConfigParseError { path: p, .. } if p == path));
    }

    #[test]
    fn override_loads_only_that_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PROJECT_CONFIG_FILE), "roots: [a]").unwrap();
        let other = temp.path().join("ci.yml");
        fs::write(&other, "roots: [b]").unwrap();

        let config = load_config(temp.path(), Some(&other)).unwrap();
        assert_eq!(config.roots, vec![PathBuf::from("b")]);
    }

    #[test]
    fn missing_override_is_not_found() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yml");

        let err = load_config(temp.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, NbenvError::ConfigNotFound { .. }));
    }
}
