//! The sync pipeline.
//!
//! Phases run strictly in order:
//!
//! 1. Extract, materialize and probe every notebook
//! 2. Merge all environments into one (a barrier: a failure here ends the run)
//! 3. Prune and rewrite every notebook with a non-empty package set
//!
//! Per-notebook problems in phases 1 and 3 are recorded in the
//! [`SyncReport`] and never stop the batch.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::environment::WorkdirPolicy;
use crate::error::Result;
use crate::pkg::PackageManager;
use crate::ui::{OutputMode, UserInterface};

use super::extract::{extract_environment, Extraction, SkipReason};
use super::merge::{merge, probe, MergePlan};
use super::prune::prune;
use super::rewrite::{rewrite_notebook, RewriteOutcome};

/// Options for one sync run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Upgrade every package to its newest compatible version while merging.
    pub upgrade: bool,
    /// Compute everything but do not write notebooks.
    pub dry_run: bool,
    /// What happens to work directories afterwards.
    pub workdirs: WorkdirPolicy,
}

/// A notebook after extraction and probing.
#[derive(Debug)]
pub struct SurveyedNotebook {
    pub path: PathBuf,
    pub extraction: Extraction,
    /// Direct packages; empty when skipped.
    pub packages: BTreeSet<String>,
}

impl SurveyedNotebook {
    /// Why the notebook is skipped, if it is.
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.extraction {
            Extraction::Skipped(reason) => Some(reason),
            Extraction::Ready(_) => None,
        }
    }
}

/// Final state of one notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotebookStatus {
    /// Not part of the sync (no usable manifests or no packages).
    Skipped(String),
    /// Already consistent with the merged environment.
    Unchanged,
    /// Manifest blocks were replaced.
    Rewritten,
    /// Manifest blocks would be replaced (dry run).
    WouldRewrite,
    /// Pruning or rewriting failed; the file was not modified.
    Failed(String),
}

impl fmt::Display for NotebookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Unchanged => write!(f, "up to date"),
            Self::Rewritten => write!(f, "updated"),
            Self::WouldRewrite => write!(f, "would update"),
            Self::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// Outcome of one notebook.
#[derive(Debug, Clone)]
pub struct NotebookOutcome {
    pub path: PathBuf,
    pub packages: BTreeSet<String>,
    pub status: NotebookStatus,
}

/// Outcome of a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub notebooks: Vec<NotebookOutcome>,
    /// Every package declared by a synced notebook.
    pub union: BTreeSet<String>,
    /// Notebook the merged environment was seeded from.
    pub seed: Option<PathBuf>,
}

impl SyncReport {
    /// Whether any notebook failed.
    pub fn has_failures(&self) -> bool {
        self.notebooks
            .iter()
            .any(|n| matches!(n.status, NotebookStatus::Failed(_)))
    }

    /// Number of notebooks matching `pred`.
    pub fn count(&self, pred: impl Fn(&NotebookStatus) -> bool) -> usize {
        self.notebooks.iter().filter(|n| pred(&n.status)).count()
    }

    /// Outcome for a given notebook path.
    pub fn outcome(&self, path: &Path) -> Option<&NotebookOutcome> {
        self.notebooks.iter().find(|n| n.path == path)
    }
}

/// Runs the sync phases against a package manager.
pub struct Pipeline<'a, P: PackageManager + ?Sized> {
    pm: &'a P,
    options: SyncOptions,
}

impl<'a, P: PackageManager + ?Sized> Pipeline<'a, P> {
    /// Create a pipeline.
    pub fn new(pm: &'a P, options: SyncOptions) -> Self {
        Self { pm, options }
    }

    /// The run options.
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Extract, materialize and probe every notebook, in the given order.
    pub fn survey(&self, notebooks: &[PathBuf]) -> Result<Vec<SurveyedNotebook>> {
        let mut surveyed = Vec::with_capacity(notebooks.len());

        for path in notebooks {
            let mut extraction = extract_environment(path, self.options.workdirs)?;
            let packages = match probe(self.pm, extraction.environment()) {
                Ok(packages) => packages,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    extraction = Extraction::Skipped(SkipReason::Unparseable(e.to_string()));
                    BTreeSet::new()
                }
            };
            debug!("{}: {} package(s)", path.display(), packages.len());

            surveyed.push(SurveyedNotebook {
                path: path.clone(),
                extraction,
                packages,
            });
        }

        Ok(surveyed)
    }

    /// Run every phase over `notebooks`.
    ///
    /// Returns an error only when the merge fails or a work directory cannot
    /// be created; in that case no notebook has been written.
    pub fn run(&self, notebooks: &[PathBuf], ui: &mut dyn UserInterface) -> Result<SyncReport> {
        let surveyed = self.survey(notebooks)?;
        for notebook in &surveyed {
            if let Some(reason) = notebook.skip_reason() {
                ui.warning(&format!("Skipping {}: {}", notebook.path.display(), reason));
            }
        }

        let plan = MergePlan::from_survey(&surveyed);
        let mut report = SyncReport {
            union: plan.union.clone(),
            seed: plan.seed.map(Path::to_path_buf),
            ..Default::default()
        };

        let mut spinner = ui.start_spinner(&format!(
            "Resolving {} package(s) across {} notebook(s) with {}",
            report.union.len(),
            plan.environment_count(),
            self.pm.name()
        ));
        let mega = match merge(self.pm, &plan.inputs, self.options.upgrade, self.options.workdirs) {
            Ok(Some(mega)) => {
                spinner.finish_success(&format!(
                    "Resolved {} package(s)",
                    mega.union().len()
                ));
                Some(mega)
            }
            Ok(None) => {
                spinner.finish_skipped("No notebook environments to merge");
                None
            }
            Err(e) => {
                spinner.finish_error("Resolution failed");
                return Err(e);
            }
        };

        let total = surveyed.len();
        for (index, notebook) in surveyed.iter().enumerate() {
            let status = match (&mega, notebook.skip_reason()) {
                (_, Some(reason)) => NotebookStatus::Skipped(reason.to_string()),
                (None, None) => NotebookStatus::Skipped("nothing to merge".to_string()),
                (Some(mega), None) => {
                    ui.show_progress(index + 1, total);
                    match prune(self.pm, mega, &notebook.packages, self.options.workdirs) {
                        Ok(None) => NotebookStatus::Skipped("declares no packages".to_string()),
                        Ok(Some(env)) => {
                            match rewrite_notebook(&notebook.path, &env, self.options.dry_run) {
                                Ok(RewriteOutcome::Rewritten) => NotebookStatus::Rewritten,
                                Ok(RewriteOutcome::Unchanged) => NotebookStatus::Unchanged,
                                Ok(RewriteOutcome::WouldRewrite) => NotebookStatus::WouldRewrite,
                                Err(e) => NotebookStatus::Failed(e.to_string()),
                            }
                        }
                        Err(e) => NotebookStatus::Failed(e.to_string()),
                    }
                }
            };

            match &status {
                NotebookStatus::Rewritten | NotebookStatus::WouldRewrite => {
                    ui.success(&format!("{} {}", notebook.path.display(), status));
                }
                NotebookStatus::Unchanged if ui.output_mode() == OutputMode::Verbose => {
                    ui.message(&format!("{} {}", notebook.path.display(), status));
                }
                NotebookStatus::Failed(_) => {
                    ui.error(&format!("{} {}", notebook.path.display(), status));
                }
                _ => {}
            }

            report.notebooks.push(NotebookOutcome {
                path: notebook.path.clone(),
                packages: notebook.packages.clone(),
                status,
            });
        }

        Ok(report)
    }
}
