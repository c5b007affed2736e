//! Notebook documents and their embedded manifests.
//!
//! - [`blocks`] - Locating, extracting and replacing the manifest blocks
//! - [`discovery`] - Finding notebook files under a set of roots

pub mod blocks;
pub mod discovery;

pub use blocks::{
    extract_manifests, replace_manifests, BlockKind, BlockSpan, NotebookDocument, Segment, FENCE,
    MANIFEST_MARKER, PROJECT_MARKER,
};
pub use discovery::{discover_notebooks, is_notebook, NOTEBOOK_HEADER};
