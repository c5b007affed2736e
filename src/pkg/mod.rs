//! Package manager backends.
//!
//! nbenv does not resolve packages itself. Every change to an environment
//! goes through a [`PackageManager`], so the sync pipeline can run against
//! the real Julia package manager or against [`MockPackageManager`] in tests.
//!
//! # Example
//!
//! ```
//! use nbenv::environment::{Environment, WorkdirPolicy};
//! use nbenv::pkg::{MockPackageManager, PackageManager};
//!
//! let pm = MockPackageManager::new()
//!     .with_package("Example", "1.0.0", &[]);
//! let env = Environment::materialize("", "", WorkdirPolicy::default()).unwrap();
//!
//! pm.add(&env, &["Example".to_string()]).unwrap();
//! assert!(pm.direct_dependencies(&env).unwrap().contains("Example"));
//! ```

pub mod julia;
pub mod mock;

pub use julia::JuliaPkg;
pub use mock::{MockPackageManager, PkgCall};

use std::collections::BTreeSet;

use crate::environment::Environment;
use crate::error::Result;

/// Operations nbenv needs from a package manager.
///
/// Every method acts on the environment it is given, as if that
/// environment were activated for the duration of the call.
pub trait PackageManager {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Fail when the backend cannot run at all.
    ///
    /// Called once before a sync touches any environment.
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    /// Names of the environment's direct dependencies.
    fn direct_dependencies(&self, env: &Environment) -> Result<BTreeSet<String>>;

    /// Add packages and resolve them, keeping existing lock entries where
    /// possible. Packages already present are left alone.
    fn add(&self, env: &Environment, names: &[String]) -> Result<()>;

    /// Remove direct dependencies and drop what is no longer needed.
    fn remove(&self, env: &Environment, names: &[String]) -> Result<()>;

    /// Move every resolved package to the newest compatible version.
    fn upgrade(&self, env: &Environment) -> Result<()>;

    /// Record compatibility bounds for the direct dependencies that match
    /// their currently resolved versions.
    fn write_compat_bounds(&self, env: &Environment) -> Result<()>;
}

/// Comma-separated package list for messages.
pub(crate) fn join_names(names: &[String]) -> String {
    names.join(", ")
}
