//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// nbenv - Keep the package environments of Pluto notebooks in step.
#[derive(Debug, Parser)]
#[command(name = "nbenv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (only this file is loaded)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge and prune notebook environments (default if no command specified)
    Sync(SyncArgs),

    /// Show the packages each notebook declares
    List(ListArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `sync` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SyncArgs {
    /// Directories or notebook files to scan (defaults to the configured roots)
    pub roots: Vec<PathBuf>,

    /// Upgrade every package to its newest compatible version
    #[arg(short, long)]
    pub upgrade: bool,

    /// Resolve everything but leave notebooks untouched
    #[arg(long)]
    pub dry_run: bool,

    /// Keep temporary work directories for inspection
    #[arg(long)]
    pub keep_workdirs: bool,

    /// Julia executable to run Pkg with
    #[arg(long, env = "NBENV_JULIA", value_name = "BIN")]
    pub julia: Option<String>,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Directories or notebook files to scan (defaults to the configured roots)
    pub roots: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
