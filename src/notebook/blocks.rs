//! Embedded manifest blocks.
//!
//! A notebook carries its package environment as two fenced string
//! assignments:
//!
//! ```text
//! PLUTO_PROJECT_TOML_CONTENTS = """
//! [deps]
//! Plots = "91a5bcdd-55d7-5caf-9e0b-520d859cae80"
//! """
//! ```
//!
//! [`NotebookDocument::parse`] splits a document into a span list
//! (text, block, text, block, text) so that rewriting is plain
//! concatenation and everything outside the two block bodies is kept
//! byte-for-byte.

use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{NbenvError, Result};

/// Marker of the project manifest block.
pub const PROJECT_MARKER: &str = "PLUTO_PROJECT_TOML_CONTENTS";

/// Marker of the lock manifest block.
pub const MANIFEST_MARKER: &str = "PLUTO_MANIFEST_TOML_CONTENTS";

/// Triple-quote fence that opens and closes a block.
pub const FENCE: &str = "\"\"\"";

static PROJECT_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bPLUTO_PROJECT_TOML_CONTENTS[ \t]*=[ \t]*"""(?:\r?\n)?"#)
        .expect("PROJECT_OPEN must compile")
});

static MANIFEST_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bPLUTO_MANIFEST_TOML_CONTENTS[ \t]*=[ \t]*"""(?:\r?\n)?"#)
        .expect("MANIFEST_OPEN must compile")
});

/// Which of the two embedded manifests a block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Direct dependencies with compatibility bounds (`Project.toml`).
    Project,
    /// Fully resolved dependency graph (`Manifest.toml`).
    Manifest,
}

impl BlockKind {
    /// The marker name that introduces this block.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Project => PROJECT_MARKER,
            Self::Manifest => MANIFEST_MARKER,
        }
    }

    fn opening(&self) -> &'static Regex {
        match self {
            Self::Project => &PROJECT_OPEN,
            Self::Manifest => &MANIFEST_OPEN,
        }
    }
}

/// Byte ranges of one block inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    pub kind: BlockKind,
    /// Marker, assignment, opening fence and the line break after it.
    pub open: Range<usize>,
    /// Manifest text.
    pub body: Range<usize>,
    /// Closing fence.
    pub close: Range<usize>,
}

impl BlockSpan {
    fn whole(&self) -> Range<usize> {
        self.open.start..self.close.end
    }

    fn overlaps(&self, other: &BlockSpan) -> bool {
        let a = self.whole();
        let b = other.whole();
        a.start < b.end && b.start < a.end
    }
}

/// One piece of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Ordinary notebook content.
    Text(&'a str),
    /// An embedded manifest block.
    Block {
        kind: BlockKind,
        open: &'a str,
        body: &'a str,
        close: &'a str,
    },
}

/// A notebook's text with its manifest blocks located.
#[derive(Debug, Clone)]
pub struct NotebookDocument<'a> {
    text: &'a str,
    project: Option<BlockSpan>,
    manifest: Option<BlockSpan>,
}

impl<'a> NotebookDocument<'a> {
    /// Locate the first project block and the first manifest block.
    ///
    /// A block runs from its opening fence to the first following `"""`.
    /// A marker without a closing fence counts as absent.
    pub fn parse(text: &'a str) -> Self {
        let project = find_block(text, BlockKind::Project);
        let mut manifest = find_block(text, BlockKind::Manifest);

        if let (Some(p), Some(m)) = (&project, &manifest) {
            if p.overlaps(m) {
                manifest = None;
            }
        }

        Self {
            text,
            project,
            manifest,
        }
    }

    /// The original text.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Span of the block of the given kind, if present.
    pub fn block(&self, kind: BlockKind) -> Option<&BlockSpan> {
        match kind {
            BlockKind::Project => self.project.as_ref(),
            BlockKind::Manifest => self.manifest.as_ref(),
        }
    }

    /// Manifest text of the block of the given kind, if present.
    pub fn body(&self, kind: BlockKind) -> Option<&'a str> {
        self.block(kind).map(|span| &self.text[span.body.clone()])
    }

    /// Whether both blocks were found.
    pub fn is_complete(&self) -> bool {
        self.project.is_some() && self.manifest.is_some()
    }

    /// The first block kind that is missing, if any.
    pub fn missing(&self) -> Option<BlockKind> {
        if self.project.is_none() {
            Some(BlockKind::Project)
        } else if self.manifest.is_none() {
            Some(BlockKind::Manifest)
        } else {
            None
        }
    }

    /// Split the document into text and block segments, in document order.
    pub fn segments(&self) -> Vec<Segment<'a>> {
        let mut spans: Vec<&BlockSpan> = self.project.iter().chain(&self.manifest).collect();
        spans.sort_by_key(|span| span.open.start);

        let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
        let mut cursor = 0;
        for span in spans {
            if span.open.start > cursor {
                segments.push(Segment::Text(&self.text[cursor..span.open.start]));
            }
            segments.push(Segment::Block {
                kind: span.kind,
                open: &self.text[span.open.clone()],
                body: &self.text[span.body.clone()],
                close: &self.text[span.close.clone()],
            });
            cursor = span.close.end;
        }
        if cursor < self.text.len() {
            segments.push(Segment::Text(&self.text[cursor..]));
        }
        segments
    }

    /// Rebuild the document with new block bodies.
    ///
    /// `body` receives each block's kind and current text and returns the
    /// replacement. Everything else is copied unchanged.
    pub fn render<'b, F>(&self, mut body: F) -> String
    where
        F: FnMut(BlockKind, &'a str) -> &'b str,
    {
        let mut out = String::with_capacity(self.text.len());
        for segment in self.segments() {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Block {
                    kind,
                    open,
                    body: current,
                    close,
                } => {
                    out.push_str(open);
                    out.push_str(body(kind, current));
                    out.push_str(close);
                }
            }
        }
        out
    }
}

fn find_block(text: &str, kind: BlockKind) -> Option<BlockSpan> {
    let open = kind.opening().find(text)?;
    let body_start = open.end();
    let close_start = body_start + text[body_start..].find(FENCE)?;
    Some(BlockSpan {
        kind,
        open: open.start()..body_start,
        body: body_start..close_start,
        close: close_start..close_start + FENCE.len(),
    })
}

/// Extract the project and lock manifest texts from a notebook.
///
/// Either side is `None` when its block is absent.
pub fn extract_manifests(text: &str) -> (Option<String>, Option<String>) {
    let doc = NotebookDocument::parse(text);
    (
        doc.body(BlockKind::Project).map(str::to_string),
        doc.body(BlockKind::Manifest).map(str::to_string),
    )
}

/// Replace both manifest blocks of a notebook.
///
/// `path` is only used in error messages. Fails without producing output
/// when either block is missing or when a new manifest contains the
/// closing fence.
pub fn replace_manifests(path: &Path, text: &str, project: &str, manifest: &str) -> Result<String> {
    for (kind, new_text) in [(BlockKind::Project, project), (BlockKind::Manifest, manifest)] {
        if new_text.contains(FENCE) {
            return Err(NbenvError::FenceInManifest {
                marker: kind.marker().to_string(),
            });
        }
    }

    let doc = NotebookDocument::parse(text);
    if let Some(kind) = doc.missing() {
        return Err(NbenvError::RewriteTargetMissing {
            path: path.to_path_buf(),
            marker: kind.marker().to_string(),
        });
    }

    Ok(doc.render(|kind, _| match kind {
        BlockKind::Project => project,
        BlockKind::Manifest => manifest,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTEBOOK: &str = r#"### A Pluto.jl notebook ###
# v0.19.40

using Markdown

# ╔═╡ 5e8f6c1a-0000-0000-0000-000000000000
using Plots

# ╔═╡ 00000000-0000-0000-0000-000000000001
PLUTO_PROJECT_TOML_CONTENTS = """
[deps]
Plots = "91a5bcdd-55d7-5caf-9e0b-520d859cae80"
"""

# ╔═╡ 00000000-0000-0000-0000-000000000002
PLUTO_MANIFEST_TOML_CONTENTS = """
# This file is machine-generated - editing it directly is not advised

julia_version = "1.10.0"
manifest_format = "2.0"
"""

# ╔═╡ Cell order:
# ╠═5e8f6c1a-0000-0000-0000-000000000000
"#;

    #[test]
    fn extracts_both_blocks() {
        let (project, manifest) = extract_manifests(NOTEBOOK);
        assert_eq!(
            project.as_deref(),
            Some("[deps]\nPlots = \"91a5bcdd-55d7-5caf-9e0b-520d859cae80\"\n")
        );
        let manifest = manifest.unwrap();
        assert!(manifest.starts_with("# This file is machine-generated"));
        assert!(manifest.ends_with("manifest_format = \"2.0\"\n"));
    }

    #[test]
    fn missing_blocks_extract_as_none() {
        let (project, manifest) = extract_manifests("### A Pluto.jl notebook ###\n1 + 1\n");
        assert!(project.is_none());
        assert!(manifest.is_none());
    }

    #[test]
    fn marker_without_fence_is_absent() {
        let doc = NotebookDocument::parse("PLUTO_PROJECT_TOML_CONTENTS = \"oops\"\n");
        assert!(doc.block(BlockKind::Project).is_none());
    }

    #[test]
    fn unterminated_block_is_absent() {
        let doc = NotebookDocument::parse("PLUTO_PROJECT_TOML_CONTENTS = \"\"\"\n[deps]\n");
        assert!(doc.block(BlockKind::Project).is_none());
    }

    #[test]
    fn first_occurrence_wins() {
        let text = "PLUTO_PROJECT_TOML_CONTENTS = \"\"\"\nfirst\n\"\"\"\nPLUTO_PROJECT_TOML_CONTENTS = \"\"\"\nsecond\n\"\"\"\n";
        let doc = NotebookDocument::parse(text);
        assert_eq!(doc.body(BlockKind::Project), Some("first\n"));
    }

    #[test]
    fn tolerates_spacing_around_assignment() {
        let text = "PLUTO_MANIFEST_TOML_CONTENTS\t=  \"\"\"\nbody\n\"\"\"";
        let doc = NotebookDocument::parse(text);
        assert_eq!(doc.body(BlockKind::Manifest), Some("body\n"));
    }

    #[test]
    fn longer_identifier_is_not_a_marker() {
        let text = "MY_PLUTO_PROJECT_TOML_CONTENTS = \"\"\"\nbody\n\"\"\"";
        let doc = NotebookDocument::parse(text);
        assert!(doc.block(BlockKind::Project).is_none());
    }

    #[test]
    fn segments_cover_the_whole_document() {
        let doc = NotebookDocument::parse(NOTEBOOK);
        let segments = doc.segments();
        assert_eq!(segments.len(), 5);
        assert!(matches!(segments[0], Segment::Text(_)));
        assert!(matches!(
            segments[1],
            Segment::Block {
                kind: BlockKind::Project,
                ..
            }
        ));
        assert!(matches!(
            segments[3],
            Segment::Block {
                kind: BlockKind::Manifest,
                ..
            }
        ));
    }

    #[test]
    fn blocks_in_reverse_order_are_handled() {
        let text = "a\nPLUTO_MANIFEST_TOML_CONTENTS = \"\"\"\nM\n\"\"\"\nb\nPLUTO_PROJECT_TOML_CONTENTS = \"\"\"\nP\n\"\"\"\nc\n";
        let doc = NotebookDocument::parse(text);
        assert!(doc.is_complete());
        let out = replace_manifests(Path::new("nb.jl"), text, "P2\n", "M2\n").unwrap();
        assert_eq!(
            out,
            "a\nPLUTO_MANIFEST_TOML_CONTENTS = \"\"\"\nM2\n\"\"\"\nb\nPLUTO_PROJECT_TOML_CONTENTS = \"\"\"\nP2\n\"\"\"\nc\n"
        );
    }

    #[test]
    fn reembedding_unchanged_bodies_is_byte_identical() {
        let (project, manifest) = extract_manifests(NOTEBOOK);
        let out = replace_manifests(
            Path::new("nb.jl"),
            NOTEBOOK,
            &project.unwrap(),
            &manifest.unwrap(),
        )
        .unwrap();
        assert_eq!(out, NOTEBOOK);
    }

    #[test]
    fn reembedding_preserves_crlf_documents() {
        let text = "x\r\nPLUTO_PROJECT_TOML_CONTENTS = \"\"\"\r\n[deps]\r\n\"\"\"\r\nPLUTO_MANIFEST_TOML_CONTENTS = \"\"\"\r\n\"\"\"\r\n";
        let (project, manifest) = extract_manifests(text);
        assert_eq!(project.as_deref(), Some("[deps]\r\n"));
        assert_eq!(manifest.as_deref(), Some(""));
        let out = replace_manifests(Path::new("nb.jl"), text, "[deps]\r\n", "").unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn replacement_only_touches_block_bodies() {
        let out = replace_manifests(Path::new("nb.jl"), NOTEBOOK, "[deps]\n", "new lock\n").unwrap();
        assert!(out.contains("PLUTO_PROJECT_TOML_CONTENTS = \"\"\"\n[deps]\n\"\"\"\n"));
        assert!(out.contains("PLUTO_MANIFEST_TOML_CONTENTS = \"\"\"\nnew lock\n\"\"\"\n"));
        assert!(out.starts_with("### A Pluto.jl notebook ###\n# v0.19.40\n"));
        assert!(out.ends_with("# ╔═╡ Cell order:\n# ╠═5e8f6c1a-0000-0000-0000-000000000000\n"));
    }

    #[test]
    fn replacement_fails_when_block_is_missing() {
        let text = "PLUTO_PROJECT_TOML_CONTENTS = \"\"\"\n\"\"\"\n";
        let err = replace_manifests(Path::new("nb.jl"), text, "", "").unwrap_err();
        match err {
            NbenvError::RewriteTargetMissing { marker, .. } => {
                assert_eq!(marker, MANIFEST_MARKER);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn replacement_rejects_fence_in_manifest() {
        let err = replace_manifests(Path::new("nb.jl"), NOTEBOOK, "x = \"\"\"\n", "").unwrap_err();
        assert!(matches!(err, NbenvError::FenceInManifest { .. }));
    }
}
