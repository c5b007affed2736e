//! Consolidating notebook environments.
//!
//! - [`extract`] - Reading a notebook's manifests into a work directory
//! - [`merge`] - Probing package sets and building the merged environment
//! - [`prune`] - Cutting the merged environment down per notebook
//! - [`rewrite`] - Embedding an environment back into its notebook
//! - [`pipeline`] - Running the phases in order over a set of notebooks

pub mod extract;
pub mod merge;
pub mod pipeline;
pub mod prune;
pub mod rewrite;

pub use extract::{extract_environment, Extraction, SkipReason};
pub use merge::{
    merge, present_union, probe, select_seed, union_of, MegaEnvironment, MergeInput, MergePlan,
};
pub use pipeline::{
    NotebookOutcome, NotebookStatus, Pipeline, SurveyedNotebook, SyncOptions, SyncReport,
};
pub use prune::prune;
pub use rewrite::{rewrite_notebook, RewriteOutcome};
