//! List command implementation.
//!
//! The `nbenv list` command shows which packages each notebook declares,
//! their union, and the notebook a sync would seed the merge from. It only
//! reads manifests and never starts Julia.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::cli::args::ListArgs;
use crate::error::{NbenvError, Result};
use crate::notebook::discover_notebooks;
use crate::pkg::{JuliaPkg, PackageManager};
use crate::sync::{MergePlan, Pipeline, SyncOptions};
use crate::ui::theme::NbenvTheme;
use crate::ui::{should_use_colors, UserInterface};

use super::dispatcher::{Command, CommandResult, ProjectContext};

/// One notebook in the listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotebookListing {
    pub path: PathBuf,
    pub packages: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

/// Everything `nbenv list` reports.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Listing {
    pub notebooks: Vec<NotebookListing>,
    pub union: BTreeSet<String>,
    pub seed: Option<PathBuf>,
}

/// The list command implementation.
pub struct ListCommand {
    context: ProjectContext,
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(context: ProjectContext, args: ListArgs) -> Self {
        Self { context, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ListArgs {
        &self.args
    }

    /// Survey the notebooks under the roots.
    pub fn listing(&self, pm: &dyn PackageManager) -> Result<Listing> {
        let notebooks = discover_notebooks(&self.context.roots(&self.args.roots))?;
        let surveyed = Pipeline::new(pm, SyncOptions::default()).survey(&notebooks)?;

        let plan = MergePlan::from_survey(&surveyed);
        let seed = plan.seed.map(|p| p.to_path_buf());
        let union = plan.union;

        let notebooks = surveyed
            .iter()
            .map(|n| NotebookListing {
                path: n.path.clone(),
                packages: n.packages.clone(),
                skipped: n.skip_reason().map(|r| r.to_string()),
            })
            .collect();

        Ok(Listing {
            notebooks,
            union,
            seed,
        })
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let listing = self.listing(&JuliaPkg::default())?;

        if self.args.json {
            let json = serde_json::to_string_pretty(&listing)
                .map_err(|e| NbenvError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        if listing.notebooks.is_empty() {
            ui.warning("No Pluto notebooks found");
            return Ok(CommandResult::success());
        }

        let theme = if should_use_colors() {
            NbenvTheme::new()
        } else {
            NbenvTheme::plain()
        };

        ui.show_header("Notebooks");
        for notebook in &listing.notebooks {
            let marker = if listing.seed.as_ref() == Some(&notebook.path) {
                format!(" {}", theme.dim.apply_to("(seed)"))
            } else {
                String::new()
            };
            ui.message(&format!(
                "  {}{}",
                theme.highlight.apply_to(notebook.path.display()),
                marker
            ));
            match &notebook.skipped {
                Some(reason) => ui.message(&format!(
                    "    {}",
                    theme.dim.apply_to(format!("skipped: {}", reason))
                )),
                None => ui.message(&format!("    {}", join_packages(&theme, &notebook.packages))),
            }
        }

        ui.message("");
        ui.message(&format!(
            "  {} {}",
            theme.highlight.apply_to(format!("Union ({}):", listing.union.len())),
            join_packages(&theme, &listing.union)
        ));

        Ok(CommandResult::success())
    }
}

fn join_packages(theme: &NbenvTheme, packages: &BTreeSet<String>) -> String {
    if packages.is_empty() {
        return theme.dim.apply_to("(none)").to_string();
    }
    packages
        .iter()
        .map(|p| theme.package.apply_to(p).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
