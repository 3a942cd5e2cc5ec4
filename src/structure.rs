//! In-memory model of one PDF's extracted structure.
//!
//! Everything here is built once per request by [`crate::pipeline::extract`],
//! rendered into a prompt string by [`crate::pipeline::format`], and then
//! dropped. Nothing is cached or persisted across requests.
//!
//! The types are deliberately flat and engine-agnostic: the extraction walk
//! reduces whatever the parsing engine reports to three categorised element
//! lists plus per-table and per-image summaries. The downstream consumer is a
//! generative agent, so the model keeps only what the agent can reason about:
//! element kinds, nesting levels, page locations, and presence booleans for
//! table headers and image captions.

use serde::Serialize;

/// Maximum characters of element text carried into a [`StructureElement`].
pub const ELEMENT_TEXT_CAP: usize = 200;

/// Maximum characters of element text carried into a reading-order tag.
pub const TAG_TEXT_CAP: usize = 50;

/// What kind of structural element was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Heading,
    Paragraph,
    ListItem,
}

/// Axis-aligned bounding box in page coordinates (points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// One detected document element (heading, paragraph, or list item).
///
/// Text is truncated to [`ELEMENT_TEXT_CAP`] characters with a trailing
/// ellipsis marker. `page` and `bbox` are `None` when the engine reports no
/// location for the element.
#[derive(Debug, Clone, Serialize)]
pub struct StructureElement {
    pub kind: ElementKind,
    pub text: String,
    /// Heading level for headings, list nesting depth for list items, 0 for
    /// plain paragraphs.
    pub level: u32,
    pub page: Option<u32>,
    pub bbox: Option<BoundingBox>,
}

/// Per-table summary: dimensions plus whether a header row was detected.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub num_rows: usize,
    pub num_cols: usize,
    pub has_header: bool,
    pub page: Option<u32>,
}

/// Per-image summary: whether a caption / alt description was detected.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub page: Option<u32>,
    pub has_caption: bool,
    pub bbox: Option<BoundingBox>,
}

/// The full extraction result for one PDF.
///
/// Invariant: `reading_order.len()` equals
/// `headings.len() + paragraphs.len() + lists.len()`; one compact tag is
/// appended per classified element, in document order. Tables and images are
/// summarised separately and do not appear in the reading order.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentStructure {
    pub filename: String,
    pub page_count: usize,
    pub headings: Vec<StructureElement>,
    pub paragraphs: Vec<StructureElement>,
    pub lists: Vec<StructureElement>,
    pub tables: Vec<TableSummary>,
    pub images: Vec<ImageSummary>,
    /// Short human-readable tags ("H2: Intro...", "P: Lorem...", "LIST: ..."),
    /// one per classified element, in traversal order.
    pub reading_order: Vec<String>,
    /// Full document text in markdown form, as rendered by the engine.
    pub markdown: String,
}

impl DocumentStructure {
    /// An empty structure for the given filename: what extraction of a
    /// zero-content document produces.
    pub fn empty(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            page_count: 0,
            headings: Vec::new(),
            paragraphs: Vec::new(),
            lists: Vec::new(),
            tables: Vec::new(),
            images: Vec::new(),
            reading_order: Vec::new(),
            markdown: String::new(),
        }
    }

    /// Total number of classified elements (headings + paragraphs + lists).
    pub fn element_count(&self) -> usize {
        self.headings.len() + self.paragraphs.len() + self.lists.len()
    }
}

/// Truncate `text` to at most `cap` characters, appending an ellipsis marker
/// when anything was cut. Operates on `char` boundaries, never bytes.
pub(crate) fn truncate_chars(text: &str, cap: usize) -> String {
    match text.char_indices().nth(cap) {
        Some((byte_idx, _)) => {
            let mut s = text[..byte_idx].to_string();
            s.push_str("...");
            s
        }
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_text_unchanged() {
        assert_eq!(truncate_chars("hello", 200), "hello");
        assert_eq!(truncate_chars("", 200), "");
    }

    #[test]
    fn truncate_long_text_appends_marker() {
        let long = "x".repeat(250);
        let out = truncate_chars(&long, 200);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn truncate_exact_cap_unchanged() {
        let text = "y".repeat(200);
        assert_eq!(truncate_chars(&text, 200), text);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // multi-byte chars, cap at 2: must not panic on a byte boundary
        let text = "ありがとう";
        let out = truncate_chars(text, 2);
        assert_eq!(out, "あり...");
    }

    #[test]
    fn empty_structure_counts() {
        let s = DocumentStructure::empty("doc.pdf");
        assert_eq!(s.element_count(), 0);
        assert_eq!(s.reading_order.len(), 0);
        assert_eq!(s.filename, "doc.pdf");
    }
}
