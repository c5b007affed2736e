//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, SyncArgs};
use crate::config::{load_config, NbenvConfig};
use crate::error::Result;
use crate::ui::{OutputMode, UserInterface};

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Project root and loaded configuration shared by commands.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub config: NbenvConfig,
}

impl ProjectContext {
    /// Load the configuration for `root`, or only `config_override` if given.
    pub fn load(root: &Path, config_override: Option<&Path>) -> Result<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            config: load_config(root, config_override)?,
        })
    }

    /// Resolve the roots to scan: command-line roots win over configured ones.
    ///
    /// Relative roots, from either source, are relative to the project root.
    pub fn roots(&self, cli_roots: &[PathBuf]) -> Vec<PathBuf> {
        let roots = if cli_roots.is_empty() {
            self.config.roots.as_slice()
        } else {
            cli_roots
        };
        roots
            .iter()
            .map(|root| self.root.join(root).components().collect())
            .collect()
    }

    /// Apply the configured output mode when no CLI flag was set.
    pub fn apply_output_mode(&self, ui: &mut dyn UserInterface) {
        if ui.output_mode() == OutputMode::Normal {
            ui.set_output_mode(self.config.settings.default_output.into());
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            config_path: None,
        }
    }

    /// Load only this config file instead of discovering project config.
    pub fn with_config(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if let Some(Commands::Completions(args)) = &cli.command {
            return super::completions::CompletionsCommand::new(args.clone()).execute(ui);
        }

        let context = ProjectContext::load(&self.project_root, self.config_path.as_deref())?;
        context.apply_output_mode(ui);

        match &cli.command {
            Some(Commands::Sync(args)) => {
                super::sync::SyncCommand::new(context, args.clone()).execute(ui)
            }
            Some(Commands::List(args)) => {
                super::list::ListCommand::new(context, args.clone()).execute(ui)
            }
            Some(Commands::Completions(_)) => Ok(CommandResult::success()),
            None => super::sync::SyncCommand::new(context, SyncArgs::default()).execute(ui),
        }
    }
}
