//! In-memory package manager for testing.
//!
//! `MockPackageManager` resolves against a small registry configured in the
//! test and writes real `Project.toml`/`Manifest.toml` files, so the sync
//! pipeline can be exercised end to end without Julia. Like the real
//! resolver it keeps versions already pinned in the lock manifest unless an
//! upgrade is requested.
//!
//! # Example
//!
//! ```
//! use nbenv::environment::{Environment, WorkdirPolicy};
//! use nbenv::pkg::{MockPackageManager, PackageManager, PkgCall};
//!
//! let pm = MockPackageManager::new()
//!     .with_versions("A", &["1.0.0", "1.1.0"], &["B"])
//!     .with_package("B", "0.3.0", &[]);
//!
//! let (project, manifest) = pm.environment_text(&[("A", "1.0.0")]);
//! let env = Environment::materialize(&project, &manifest, WorkdirPolicy::default()).unwrap();
//! pm.upgrade(&env).unwrap();
//!
//! assert_eq!(env.lock().unwrap().versions()["A"].as_deref(), Some("1.1.0"));
//! assert_eq!(pm.calls(), vec![PkgCall::Upgrade]);
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use crate::environment::{Environment, LockEntry, LockManifest, ProjectManifest};
use crate::error::{NbenvError, Result};

use super::{join_names, PackageManager};

/// Julia version written into generated manifests.
const MOCK_JULIA_VERSION: &str = "1.10.0";

/// An operation recorded by [`MockPackageManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PkgCall {
    Add(Vec<String>),
    Remove(Vec<String>),
    Upgrade,
    Compat,
}

#[derive(Debug, Clone)]
struct MockPackage {
    uuid: String,
    /// Ascending; the last one is the newest.
    versions: Vec<String>,
    deps: Vec<String>,
}

/// Package manager that resolves against an in-memory registry.
#[derive(Debug, Default)]
pub struct MockPackageManager {
    registry: BTreeMap<String, MockPackage>,
    conflicts: Vec<(String, String)>,
    calls: RefCell<Vec<PkgCall>>,
}

impl MockPackageManager {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package with a single version.
    pub fn with_package(self, name: &str, version: &str, deps: &[&str]) -> Self {
        self.with_versions(name, &[version], deps)
    }

    /// Register a package with several versions, oldest first.
    pub fn with_versions(mut self, name: &str, versions: &[&str], deps: &[&str]) -> Self {
        let mut deps: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
        deps.sort();
        self.registry.insert(
            name.to_string(),
            MockPackage {
                uuid: mock_uuid(name),
                versions: versions.iter().map(|v| v.to_string()).collect(),
                deps,
            },
        );
        self
    }

    /// Make two packages impossible to install together.
    pub fn with_conflict(mut self, a: &str, b: &str) -> Self {
        self.conflicts.push((a.to_string(), b.to_string()));
        self
    }

    /// UUID the registry assigns to `name`.
    pub fn uuid_of(&self, name: &str) -> Option<&str> {
        self.registry.get(name).map(|p| p.uuid.as_str())
    }

    /// Newest registered version of `name`.
    pub fn latest_version(&self, name: &str) -> Option<&str> {
        self.registry
            .get(name)
            .and_then(|p| p.versions.last())
            .map(String::as_str)
    }

    /// Operations performed so far, in order.
    pub fn calls(&self) -> Vec<PkgCall> {
        self.calls.borrow().clone()
    }

    /// Project and manifest text for an environment whose direct
    /// dependencies are pinned to the given versions.
    ///
    /// Transitive dependencies get their newest version. Unknown packages
    /// are written with a made-up UUID and no dependencies.
    pub fn environment_text(&self, direct: &[(&str, &str)]) -> (String, String) {
        let mut project = ProjectManifest::default();
        let mut pins = BTreeMap::new();
        for (name, version) in direct {
            project.deps.insert(name.to_string(), mock_uuid(name));
            pins.insert(name.to_string(), version.to_string());
        }

        let names: BTreeSet<String> = project.deps.keys().cloned().collect();
        let mut lock = LockManifest {
            julia_version: Some(MOCK_JULIA_VERSION.to_string()),
            manifest_format: Some("2.0".to_string()),
            packages: BTreeMap::new(),
        };
        for name in self.closure(&names) {
            let package = self.registry.get(&name);
            let version = pins
                .get(&name)
                .cloned()
                .or_else(|| package.and_then(|p| p.versions.last().cloned()));
            lock.packages.insert(
                name.clone(),
                vec![LockEntry {
                    uuid: Some(mock_uuid(&name)),
                    version,
                    deps: package.map(|p| p.deps.clone()).unwrap_or_default(),
                }],
            );
        }

        let project_text = project.to_toml_string().unwrap_or_default();
        (project_text, lock.to_toml_string())
    }

    fn record(&self, call: PkgCall) {
        self.calls.borrow_mut().push(call);
    }

    fn closure(&self, roots: &BTreeSet<String>) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<String> = roots.iter().cloned().collect();
        while let Some(name) = stack.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(package) = self.registry.get(&name) {
                stack.extend(package.deps.iter().cloned());
            }
        }
        seen
    }

    fn resolve(
        &self,
        project: &ProjectManifest,
        existing: &LockManifest,
        upgrade: bool,
    ) -> Result<LockManifest> {
        let direct = project.package_names();

        let unknown: Vec<String> = direct
            .iter()
            .filter(|n| !self.registry.contains_key(*n))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(NbenvError::ResolutionFailed {
                packages: join_names(&unknown),
                message: "not found in any registry".to_string(),
            });
        }

        let needed = self.closure(&direct);
        for (a, b) in &self.conflicts {
            if needed.contains(a) && needed.contains(b) {
                return Err(NbenvError::ResolutionFailed {
                    packages: format!("{}, {}", a, b),
                    message: "unsatisfiable requirements detected".to_string(),
                });
            }
        }

        let pinned = existing.versions();
        let mut packages = BTreeMap::new();
        for name in needed {
            let Some(package) = self.registry.get(&name) else {
                continue;
            };
            let kept = pinned
                .get(&name)
                .cloned()
                .flatten()
                .filter(|v| !upgrade && package.versions.contains(v));
            let version = kept.or_else(|| package.versions.last().cloned());
            packages.insert(
                name,
                vec![LockEntry {
                    uuid: Some(package.uuid.clone()),
                    version,
                    deps: package.deps.clone(),
                }],
            );
        }

        Ok(LockManifest {
            julia_version: existing
                .julia_version
                .clone()
                .or_else(|| Some(MOCK_JULIA_VERSION.to_string())),
            manifest_format: Some("2.0".to_string()),
            packages,
        })
    }

    fn write(&self, env: &Environment, project: &ProjectManifest, lock: &LockManifest) -> Result<()> {
        fs::write(env.project_path(), project.to_toml_string()?)?;
        fs::write(env.manifest_path(), lock.to_toml_string())?;
        Ok(())
    }
}

impl PackageManager for MockPackageManager {
    fn name(&self) -> &str {
        "mock"
    }

    fn direct_dependencies(&self, env: &Environment) -> Result<BTreeSet<String>> {
        Ok(env.project()?.package_names())
    }

    fn add(&self, env: &Environment, names: &[String]) -> Result<()> {
        self.record(PkgCall::Add(names.to_vec()));

        let mut project = env.project()?;
        for name in names {
            if !project.deps.contains_key(name) {
                let uuid = self
                    .uuid_of(name)
                    .map(str::to_string)
                    .unwrap_or_else(|| mock_uuid(name));
                project.deps.insert(name.clone(), uuid);
            }
        }

        let lock = self.resolve(&project, &env.lock()?, false)?;
        self.write(env, &project, &lock)
    }

    fn remove(&self, env: &Environment, names: &[String]) -> Result<()> {
        self.record(PkgCall::Remove(names.to_vec()));

        let mut project = env.project()?;
        for name in names {
            if project.deps.remove(name).is_none() {
                return Err(NbenvError::PackageManagerFailed {
                    operation: format!("remove {}", name),
                    message: format!("{} is not a direct dependency", name),
                });
            }
            project.compat.remove(name);
        }

        let lock = self.resolve(&project, &env.lock()?, false)?;
        self.write(env, &project, &lock)
    }

    fn upgrade(&self, env: &Environment) -> Result<()> {
        self.record(PkgCall::Upgrade);

        let project = env.project()?;
        let lock = self.resolve(&project, &env.lock()?, true)?;
        self.write(env, &project, &lock)
    }

    fn write_compat_bounds(&self, env: &Environment) -> Result<()> {
        self.record(PkgCall::Compat);

        let mut project = env.project()?;
        let versions = env.lock()?.versions();
        project.compat = project
            .deps
            .keys()
            .filter_map(|name| {
                versions
                    .get(name)
                    .cloned()
                    .flatten()
                    .map(|v| (name.clone(), format!("~{}", v)))
            })
            .collect();

        fs::write(env.project_path(), project.to_toml_string()?)?;
        Ok(())
    }
}

/// Deterministic UUID-shaped identifier derived from a package name.
fn mock_uuid(name: &str) -> String {
    // FNV-1a
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    format!(
        "{:08x}-{:04x}-4{:03x}-8{:03x}-{:012x}",
        (hash >> 32) as u32,
        (hash >> 16) as u16,
        hash & 0xfff,
        (hash >> 12) & 0xfff,
        hash & 0xffff_ffff_ffff
    )
}
