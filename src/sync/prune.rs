//! Pruning the merged environment down to one notebook's packages.

use std::collections::BTreeSet;

use tracing::debug;

use crate::environment::{Environment, WorkdirPolicy};
use crate::error::Result;
use crate::pkg::PackageManager;

use super::merge::MegaEnvironment;

/// Build a notebook's environment from the merged one.
///
/// Clones the merged environment, removes every package the notebook does
/// not declare, and rewrites compat bounds to match the shared resolution.
/// Returns `None` for an empty package set; such notebooks are left alone.
pub fn prune<P>(
    pm: &P,
    mega: &MegaEnvironment,
    packages: &BTreeSet<String>,
    policy: WorkdirPolicy,
) -> Result<Option<Environment>>
where
    P: PackageManager + ?Sized,
{
    if packages.is_empty() {
        return Ok(None);
    }

    let env = mega.environment().duplicate(policy)?;
    let unneeded: Vec<String> = mega.union().difference(packages).cloned().collect();
    debug!(
        "Pruning {} of {} package(s) in {}",
        unneeded.len(),
        mega.union().len(),
        env.path().display()
    );

    if !unneeded.is_empty() {
        pm.remove(&env, &unneeded)?;
    }
    pm.write_compat_bounds(&env)?;

    Ok(Some(env))
}
