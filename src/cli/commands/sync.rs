//! Sync command implementation.
//!
//! The `nbenv sync` command merges the environments embedded in every
//! notebook under the configured roots, then writes each notebook back with
//! its share of the merged environment.

use tracing::debug;

use crate::cli::args::SyncArgs;
use crate::environment::WorkdirPolicy;
use crate::error::{NbenvError, Result};
use crate::notebook::discover_notebooks;
use crate::pkg::{JuliaPkg, PackageManager};
use crate::sync::{NotebookStatus, Pipeline, SyncOptions, SyncReport};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, ProjectContext};

/// Julia executable used when neither flag, environment nor config names one.
pub const DEFAULT_JULIA: &str = "julia";

/// The sync command implementation.
pub struct SyncCommand {
    context: ProjectContext,
    args: SyncArgs,
}

impl SyncCommand {
    /// Create a new sync command.
    pub fn new(context: ProjectContext, args: SyncArgs) -> Self {
        Self { context, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &SyncArgs {
        &self.args
    }

    /// Options for the pipeline, combining flags and settings.
    pub fn options(&self) -> SyncOptions {
        let keep = self.args.keep_workdirs || self.context.config.settings.keep_workdirs;
        SyncOptions {
            upgrade: self.args.upgrade,
            dry_run: self.args.dry_run,
            workdirs: WorkdirPolicy { keep },
        }
    }

    /// The Julia package manager this run would use.
    pub fn julia(&self) -> JuliaPkg {
        let settings = &self.context.config.settings;
        let program = self
            .args
            .julia
            .clone()
            .or_else(|| settings.julia.clone())
            .unwrap_or_else(|| DEFAULT_JULIA.to_string());
        JuliaPkg::new(program).with_args(settings.julia_args.clone())
    }

    /// Fail unless the project root holds the package-environment directory.
    pub fn check_environment_dir(&self) -> Result<()> {
        let path = self
            .context
            .root
            .join(&self.context.config.settings.environment_dir);
        if path.is_dir() {
            Ok(())
        } else {
            Err(NbenvError::EnvironmentDirMissing { path })
        }
    }

    /// Run against a specific package manager.
    pub fn run_with(
        &self,
        pm: &dyn PackageManager,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        if let Err(e) = self.check_environment_dir() {
            ui.error(&e.to_string());
            return Ok(CommandResult::failure(2));
        }

        let roots = self.context.roots(&self.args.roots);
        debug!("Scanning roots: {:?}", roots);
        let notebooks = discover_notebooks(&roots)?;
        if notebooks.is_empty() {
            ui.warning("No Pluto notebooks found");
            return Ok(CommandResult::success());
        }

        if let Err(e) = pm.ensure_available() {
            ui.error(&e.to_string());
            return Ok(CommandResult::failure(1));
        }

        let options = self.options();
        let verb = if options.dry_run { "Checking" } else { "Syncing" };
        ui.show_header(&format!("{} {} notebook(s)", verb, notebooks.len()));

        let report = match Pipeline::new(pm, options).run(&notebooks, ui) {
            Ok(report) => report,
            Err(e) if e.is_fatal() => {
                ui.error(&format!("Sync aborted, no notebook was written: {}", e));
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };
        show_summary(&report, options.dry_run, ui);

        if report.has_failures() {
            Ok(CommandResult::failure(1))
        } else {
            Ok(CommandResult::success())
        }
    }
}

impl Command for SyncCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        self.run_with(&self.julia(), ui)
    }
}

fn show_summary(report: &SyncReport, dry_run: bool, ui: &mut dyn UserInterface) {
    let changed = report.count(|s| {
        matches!(s, NotebookStatus::Rewritten | NotebookStatus::WouldRewrite)
    });
    let unchanged = report.count(|s| matches!(s, NotebookStatus::Unchanged));
    let skipped = report.count(|s| matches!(s, NotebookStatus::Skipped(_)));
    let failed = report.count(|s| matches!(s, NotebookStatus::Failed(_)));

    let changed_label = if dry_run { "would update" } else { "updated" };
    let line = format!(
        "{} {}, {} up to date, {} skipped, {} failed",
        changed, changed_label, unchanged, skipped, failed
    );

    if failed > 0 {
        ui.error(&line);
    } else {
        ui.success(&line);
    }
}
