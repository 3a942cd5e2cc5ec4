//! Structure extraction: reduce a parsed PDF to a [`DocumentStructure`].
//!
//! ## Why spawn_blocking?
//!
//! unpdf parses the whole document eagerly: content streams are inflated and
//! every page is laid out before `parse()` returns. That is CPU-bound work,
//! so it runs on the blocking thread pool instead of stalling Tokio workers
//! that are relaying other requests' SSE frames.
//!
//! ## Why a semaphore?
//!
//! Each extraction can occupy a blocking thread for seconds on a large
//! document. The [`Extractor`] holds a bounded permit pool so a burst of
//! uploads queues instead of saturating the thread pool. Each request
//! acquires one permit for the duration of its parse; there is no shared
//! engine handle, so requests never contend on parser state.
//!
//! ## Classification walk
//!
//! The engine reports pages of typed blocks. The walk visits them in document
//! order and keeps three kinds: headings, list items, and plain paragraphs.
//! Everything else (horizontal rules, page breaks, raw fragments) is skipped
//! without error. Tables and images are summarised separately and do not
//! enter the reading order.

use crate::error::ExtractError;
use crate::structure::{
    truncate_chars, BoundingBox, DocumentStructure, ElementKind, ImageSummary, StructureElement,
    TableSummary, ELEMENT_TEXT_CAP, TAG_TEXT_CAP,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};
use unpdf::model::{Block, Document};
use unpdf::render::RenderOptions;
use unpdf::ParseOptions;

/// Bounded-concurrency front end to the parsing engine.
///
/// Cheap to clone; clones share the same permit pool.
#[derive(Clone)]
pub struct Extractor {
    permits: Arc<Semaphore>,
}

impl Extractor {
    /// Create an extractor allowing `concurrency` simultaneous parses.
    pub fn new(concurrency: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Extract the structure of the PDF at `path`.
    ///
    /// `filename` is the client-supplied upload name, carried through for the
    /// report header; the temp-file path the engine reads from is an
    /// implementation detail the agent never sees.
    pub async fn extract(
        &self,
        path: &Path,
        filename: &str,
    ) -> Result<DocumentStructure, ExtractError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ExtractError::Task("permit pool closed".to_string()))?;

        let path = path.to_path_buf();
        let filename = filename.to_string();
        tokio::task::spawn_blocking(move || extract_blocking(&path, &filename))
            .await
            .map_err(|e| ExtractError::Task(format!("extraction task panicked: {e}")))?
    }
}

/// Blocking implementation: parse, walk, render markdown.
fn extract_blocking(path: &Path, filename: &str) -> Result<DocumentStructure, ExtractError> {
    // Lenient mode: recover what we can from slightly-malformed uploads
    // instead of rejecting them outright.
    let options = ParseOptions::new().lenient();
    let doc = unpdf::parse_file_with_options(path, options).map_err(|e| ExtractError::Parse {
        filename: filename.to_string(),
        detail: e.to_string(),
    })?;

    let markdown =
        unpdf::render::to_markdown(&doc, &RenderOptions::default()).map_err(|e| {
            ExtractError::Render {
                filename: filename.to_string(),
                detail: e.to_string(),
            }
        })?;

    let mut structure = structure_from_document(&doc, filename);
    structure.markdown = markdown;

    info!(
        filename,
        pages = structure.page_count,
        headings = structure.headings.len(),
        tables = structure.tables.len(),
        images = structure.images.len(),
        "extracted document structure"
    );

    Ok(structure)
}

/// Walk the parsed document and categorise its blocks.
///
/// Pure with respect to the document: does not touch the file system and
/// leaves `markdown` empty for the caller to fill in.
pub fn structure_from_document(doc: &Document, filename: &str) -> DocumentStructure {
    let mut structure = DocumentStructure::empty(filename);
    structure.page_count = doc.pages.len();

    for page in &doc.pages {
        for block in &page.elements {
            match block {
                Block::Paragraph(p) => {
                    let text = p.plain_text();
                    if let Some(level) = p.heading_level() {
                        structure
                            .reading_order
                            .push(tag(&format!("H{level}"), &text));
                        structure.headings.push(element(
                            ElementKind::Heading,
                            &text,
                            u32::from(level),
                            page.number,
                        ));
                    } else if let Some(list) = &p.style.list_info {
                        structure.reading_order.push(tag("LIST", &text));
                        structure.lists.push(element(
                            ElementKind::ListItem,
                            &text,
                            u32::from(list.level),
                            page.number,
                        ));
                    } else {
                        structure.reading_order.push(tag("P", &text));
                        structure.paragraphs.push(element(
                            ElementKind::Paragraph,
                            &text,
                            0,
                            page.number,
                        ));
                    }
                }
                Block::Table(t) => {
                    structure.tables.push(TableSummary {
                        num_rows: t.row_count(),
                        num_cols: t.column_count(),
                        has_header: t.header_rows > 0,
                        page: Some(page.number),
                    });
                }
                Block::Image {
                    alt_text,
                    width,
                    height,
                    x,
                    y,
                    ..
                } => {
                    structure.images.push(ImageSummary {
                        page: Some(page.number),
                        has_caption: alt_text
                            .as_deref()
                            .is_some_and(|t| !t.trim().is_empty()),
                        bbox: image_bbox(*x, *y, *width, *height),
                    });
                }
                // Rules, breaks, and raw fragments carry no structure the
                // report cares about. Candidate for a future "other" bucket
                // so uncategorised content is at least counted.
                Block::HorizontalRule
                | Block::PageBreak
                | Block::SectionBreak
                | Block::Raw { .. } => {
                    debug!(page = page.number, "skipping unclassified block");
                }
            }
        }
    }

    debug_assert_eq!(structure.reading_order.len(), structure.element_count());
    structure
}

fn element(kind: ElementKind, text: &str, level: u32, page: u32) -> StructureElement {
    StructureElement {
        kind,
        text: truncate_chars(text, ELEMENT_TEXT_CAP),
        level,
        page: Some(page),
        // unpdf reports no coordinates for text blocks.
        bbox: None,
    }
}

/// Compact reading-order tag: "H2: First fifty chars...".
fn tag(prefix: &str, text: &str) -> String {
    let head: String = text.chars().take(TAG_TEXT_CAP).collect();
    format!("{prefix}: {head}...")
}

/// Engine image placement → bounding box, when fully reported.
fn image_bbox(
    x: Option<f32>,
    y: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
) -> Option<BoundingBox> {
    match (x, y, width, height) {
        (Some(x), Some(y), Some(w), Some(h)) => Some(BoundingBox {
            left: x,
            top: y,
            right: x + w,
            bottom: y + h,
        }),
        _ => None,
    }
}
