//! Probing and merging notebook environments.
//!
//! The merge produces one [`MegaEnvironment`] that declares every package
//! any notebook uses, resolved together. It is built once per run, returned
//! by value, and only read afterwards.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::environment::{Environment, WorkdirPolicy};
use crate::error::{NbenvError, Result};
use crate::pkg::PackageManager;

use super::pipeline::SurveyedNotebook;

/// Direct package names of an environment; empty when there is none.
pub fn probe<P>(pm: &P, env: Option<&Environment>) -> Result<BTreeSet<String>>
where
    P: PackageManager + ?Sized,
{
    match env {
        Some(env) => pm.direct_dependencies(env),
        None => Ok(BTreeSet::new()),
    }
}

/// One notebook's contribution to the merge.
#[derive(Debug, Clone, Copy)]
pub struct MergeInput<'a> {
    pub env: Option<&'a Environment>,
    pub packages: &'a BTreeSet<String>,
}

/// Union of all package sets.
pub fn union_of<'a, I>(sets: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a BTreeSet<String>>,
{
    sets.into_iter().flatten().cloned().collect()
}

/// Union of the package sets of inputs that have an environment.
pub fn present_union(inputs: &[MergeInput<'_>]) -> BTreeSet<String> {
    union_of(inputs.iter().filter(|i| i.env.is_some()).map(|i| i.packages))
}

/// Index of the present environment with the most packages.
///
/// Ties go to the earliest input.
pub fn select_seed(inputs: &[MergeInput<'_>]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, input) in inputs.iter().enumerate() {
        if input.env.is_none() {
            continue;
        }
        let size = input.packages.len();
        match best {
            Some((_, best_size)) if size <= best_size => {}
            _ => best = Some((index, size)),
        }
    }
    best.map(|(index, _)| index)
}

/// What a merge over a survey would start from.
#[derive(Debug)]
pub struct MergePlan<'a> {
    /// One input per surveyed notebook, in survey order.
    pub inputs: Vec<MergeInput<'a>>,
    pub union: BTreeSet<String>,
    /// Notebook the merge is seeded from.
    pub seed: Option<&'a Path>,
}

impl<'a> MergePlan<'a> {
    pub fn from_survey(surveyed: &'a [SurveyedNotebook]) -> Self {
        let inputs: Vec<MergeInput<'a>> = surveyed
            .iter()
            .map(|n| MergeInput {
                env: n.extraction.environment(),
                packages: &n.packages,
            })
            .collect();
        let union = present_union(&inputs);
        let seed = select_seed(&inputs).map(|i| surveyed[i].path.as_path());
        Self {
            inputs,
            union,
            seed,
        }
    }

    /// Number of notebooks taking part in the merge.
    pub fn environment_count(&self) -> usize {
        self.inputs.iter().filter(|i| i.env.is_some()).count()
    }
}

/// The environment every notebook environment is pruned from.
#[derive(Debug)]
pub struct MegaEnvironment {
    env: Environment,
    union: BTreeSet<String>,
    seed: usize,
}

impl MegaEnvironment {
    /// The merged environment.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Every package declared by any notebook.
    pub fn union(&self) -> &BTreeSet<String> {
        &self.union
    }

    /// Index of the input the merge started from.
    pub fn seed(&self) -> usize {
        self.seed
    }
}

/// Merge all notebook environments into one.
///
/// Starts from a copy of the largest environment, adds the union of all
/// package sets and, when `upgrade` is set, upgrades everything. Returns
/// `None` when no notebook has an environment. A resolution failure is
/// returned as is: nothing after the merge can run without it.
pub fn merge<P>(
    pm: &P,
    inputs: &[MergeInput<'_>],
    upgrade: bool,
    policy: WorkdirPolicy,
) -> Result<Option<MegaEnvironment>>
where
    P: PackageManager + ?Sized,
{
    let Some(seed) = select_seed(inputs) else {
        return Ok(None);
    };
    let Some(seed_env) = inputs[seed].env else {
        return Ok(None);
    };

    let union = present_union(inputs);
    debug!(
        "Merging {} package(s), seeded from input {} ({} package(s))",
        union.len(),
        seed,
        inputs[seed].packages.len()
    );

    let env = seed_env.duplicate(policy)?;
    let names: Vec<String> = union.iter().cloned().collect();
    pm.add(&env, &names)?;
    if upgrade {
        pm.upgrade(&env)?;
    }

    let declared = pm.direct_dependencies(&env)?;
    if declared != union {
        let missing: Vec<String> = union.difference(&declared).cloned().collect();
        let extra: Vec<String> = declared.difference(&union).cloned().collect();
        return Err(NbenvError::ResolutionFailed {
            packages: missing.iter().chain(&extra).cloned().collect::<Vec<_>>().join(", "),
            message: format!(
                "merged environment does not declare exactly the requested packages (missing: [{}], unexpected: [{}])",
                missing.join(", "),
                extra.join(", ")
            ),
        });
    }

    Ok(Some(MegaEnvironment { env, union, seed }))
}
