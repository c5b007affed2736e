//! `Project.toml` and `Manifest.toml` parsing.
//!
//! Only the parts nbenv reasons about are modeled: direct dependencies and
//! compat bounds of a project, and the resolved package graph of a
//! manifest. Both manifest formats are read: format 2.0 nests packages under
//! `[deps]`, the legacy format keeps them at the top level.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NbenvError, Result};

/// Header Julia writes at the top of every manifest.
pub const MANIFEST_HEADER: &str =
    "# This file is machine-generated - editing it directly is not advised";

/// Direct dependencies of an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    /// Package name to UUID.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deps: BTreeMap<String, String>,

    /// Package name to compatibility bound.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub compat: BTreeMap<String, String>,
}

impl ProjectManifest {
    /// Parse project text; `source` is used in error messages.
    pub fn parse(text: &str, source: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| NbenvError::ManifestParseError {
            path: source.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The set of direct dependency names.
    pub fn package_names(&self) -> BTreeSet<String> {
        self.deps.keys().cloned().collect()
    }

    /// Serialize in the layout Julia writes.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| anyhow::anyhow!(e).into())
    }
}

/// One resolved package in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEntry {
    pub uuid: Option<String>,
    /// Absent for standard libraries.
    pub version: Option<String>,
    /// Names of the packages this one depends on.
    pub deps: Vec<String>,
}

/// A resolved dependency graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockManifest {
    pub julia_version: Option<String>,
    pub manifest_format: Option<String>,
    /// Package name to its entries. Julia allows several packages with the
    /// same name (different UUIDs), hence the list.
    pub packages: BTreeMap<String, Vec<LockEntry>>,
}

impl LockManifest {
    /// Parse manifest text; `source` is used in error messages.
    pub fn parse(text: &str, source: &Path) -> Result<Self> {
        let table: toml::Table =
            toml::from_str(text).map_err(|e| NbenvError::ManifestParseError {
                path: source.to_path_buf(),
                message: e.to_string(),
            })?;

        let manifest_format = table
            .get("manifest_format")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let julia_version = table
            .get("julia_version")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let empty = toml::Table::new();
        let package_table = match manifest_format.as_deref() {
            Some(format) if format.starts_with('2') => {
                table.get("deps").and_then(|v| v.as_table()).unwrap_or(&empty)
            }
            _ => &table,
        };

        let mut packages = BTreeMap::new();
        for (name, value) in package_table {
            let Some(items) = value.as_array() else {
                continue;
            };
            let entries: Vec<LockEntry> = items
                .iter()
                .filter_map(|item| item.as_table())
                .map(parse_entry)
                .collect();
            if !entries.is_empty() {
                packages.insert(name.clone(), entries);
            }
        }

        Ok(Self {
            julia_version,
            manifest_format,
            packages,
        })
    }

    /// Resolved version of each package (first entry per name).
    pub fn versions(&self) -> BTreeMap<String, Option<String>> {
        self.packages
            .iter()
            .filter_map(|(name, entries)| {
                entries
                    .first()
                    .map(|entry| (name.clone(), entry.version.clone()))
            })
            .collect()
    }

    /// Every `(name, uuid, version)` triple in the graph.
    pub fn resolved(&self) -> BTreeSet<(String, Option<String>, Option<String>)> {
        self.packages
            .iter()
            .flat_map(|(name, entries)| {
                entries
                    .iter()
                    .map(move |e| (name.clone(), e.uuid.clone(), e.version.clone()))
            })
            .collect()
    }

    /// Names reachable from `roots` through dependency edges, roots included.
    ///
    /// Roots missing from the manifest are still part of the result.
    pub fn transitive_closure<'a, I>(&self, roots: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<String> = roots.into_iter().cloned().collect();

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            for entry in self.packages.get(&name).into_iter().flatten() {
                for dep in &entry.deps {
                    if !seen.contains(dep) {
                        queue.push_back(dep.clone());
                    }
                }
            }
        }
        seen
    }

    /// Whether every resolved package here appears identically in `other`.
    pub fn is_sub_resolution_of(&self, other: &LockManifest) -> bool {
        self.resolved().is_subset(&other.resolved())
    }

    /// Serialize as a format 2.0 manifest.
    pub fn to_toml_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", MANIFEST_HEADER);
        let _ = writeln!(out);
        if let Some(v) = &self.julia_version {
            let _ = writeln!(out, "julia_version = {}", quote(v));
        }
        let _ = writeln!(
            out,
            "manifest_format = {}",
            quote(self.manifest_format.as_deref().unwrap_or("2.0"))
        );

        for (name, entries) in &self.packages {
            for entry in entries {
                let _ = writeln!(out);
                let _ = writeln!(out, "[[deps.{}]]", name);
                if !entry.deps.is_empty() {
                    let deps: Vec<String> = entry.deps.iter().map(|d| quote(d)).collect();
                    let _ = writeln!(out, "deps = [{}]", deps.join(", "));
                }
                if let Some(uuid) = &entry.uuid {
                    let _ = writeln!(out, "uuid = {}", quote(uuid));
                }
                if let Some(version) = &entry.version {
                    let _ = writeln!(out, "version = {}", quote(version));
                }
            }
        }
        out
    }
}

fn parse_entry(table: &toml::Table) -> LockEntry {
    let deps = match table.get("deps") {
        Some(toml::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(toml::Value::Table(named)) => named.keys().cloned().collect(),
        _ => Vec::new(),
    };

    LockEntry {
        uuid: table.get("uuid").and_then(|v| v.as_str()).map(str::to_string),
        version: table
            .get("version")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        deps,
    }
}

fn quote(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}
