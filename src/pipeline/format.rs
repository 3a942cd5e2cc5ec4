//! Prompt rendering: one bounded-length text block per [`DocumentStructure`].
//!
//! Pure function, no failure modes: an empty structure still renders a
//! complete report with zero counts. Section order is fixed so the agent's
//! instruction templates can reference sections by name.
//!
//! ## Why explicit "NOT DETECTED" flags?
//!
//! The consumer is a generative agent. If a table line simply omitted header
//! information, the agent could read that as "not checked" rather than
//! "absent". Spelling out `NO HEADER ROW DETECTED` / `NO CAPTION/ALT TEXT
//! DETECTED` makes the negative finding unambiguous.

use crate::structure::DocumentStructure;

/// How many reading-order entries the report lists before summarising.
pub const READING_ORDER_PREVIEW: usize = 50;

/// Cap on embedded document text, in characters (roughly 4 000 tokens).
pub const MAX_CONTENT_CHARS: usize = 15_000;

/// Render the extracted structure as a prompt-friendly report.
///
/// Sections, in order: header, summary counts, heading outline (if any),
/// tables (if any), images (if any), reading-order preview, document text.
/// Formatting the same structure twice yields byte-identical output.
pub fn format_structure(structure: &DocumentStructure) -> String {
    let mut lines: Vec<String> = vec![
        "# PDF STRUCTURAL ANALYSIS".to_string(),
        String::new(),
        format!("**Filename:** {}", structure.filename),
        format!("**Pages:** {}", structure.page_count),
        String::new(),
        "## Document Structure Summary".to_string(),
        String::new(),
        format!("- **Headings detected:** {}", structure.headings.len()),
        format!("- **Paragraphs:** {}", structure.paragraphs.len()),
        format!("- **List items:** {}", structure.lists.len()),
        format!("- **Tables:** {}", structure.tables.len()),
        format!("- **Images:** {}", structure.images.len()),
        String::new(),
    ];

    if !structure.headings.is_empty() {
        lines.push("## Heading Structure".to_string());
        lines.push(String::new());
        for h in &structure.headings {
            let indent = "  ".repeat(h.level.saturating_sub(1) as usize);
            lines.push(format!(
                "{indent}- (level {}): \"{}\"{}",
                h.level,
                h.text,
                page_suffix(h.page)
            ));
        }
        lines.push(String::new());
    }

    if !structure.tables.is_empty() {
        lines.push("## Tables".to_string());
        lines.push(String::new());
        for (i, t) in structure.tables.iter().enumerate() {
            let header_status = if t.has_header {
                "has header row"
            } else {
                "NO HEADER ROW DETECTED"
            };
            lines.push(format!(
                "- Table {}: {} rows x {} cols, {}{}",
                i + 1,
                t.num_rows,
                t.num_cols,
                header_status,
                page_suffix(t.page)
            ));
        }
        lines.push(String::new());
    }

    if !structure.images.is_empty() {
        lines.push("## Images".to_string());
        lines.push(String::new());
        for (i, img) in structure.images.iter().enumerate() {
            let caption_status = if img.has_caption {
                "has caption"
            } else {
                "NO CAPTION/ALT TEXT DETECTED"
            };
            lines.push(format!(
                "- Image {}: {}{}",
                i + 1,
                caption_status,
                page_suffix(img.page)
            ));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "## Reading Order (first {READING_ORDER_PREVIEW} elements)"
    ));
    lines.push(String::new());
    for (i, tag) in structure
        .reading_order
        .iter()
        .take(READING_ORDER_PREVIEW)
        .enumerate()
    {
        lines.push(format!("{}. {}", i + 1, tag));
    }
    if structure.reading_order.len() > READING_ORDER_PREVIEW {
        lines.push(format!(
            "... and {} more elements",
            structure.reading_order.len() - READING_ORDER_PREVIEW
        ));
    }
    lines.push(String::new());

    lines.push("## Document Content (Markdown)".to_string());
    lines.push(String::new());

    let total_chars = structure.markdown.chars().count();
    if total_chars <= MAX_CONTENT_CHARS {
        lines.push(structure.markdown.clone());
    } else {
        // char_indices, not byte slicing: the cap is in characters and must
        // never split a multi-byte sequence.
        let cut = structure
            .markdown
            .char_indices()
            .nth(MAX_CONTENT_CHARS)
            .map(|(idx, _)| idx)
            .unwrap_or(structure.markdown.len());
        lines.push(structure.markdown[..cut].to_string());
        lines.push(String::new());
        lines.push(format!(
            "... [Content truncated - showing first {} of {} characters]",
            thousands(MAX_CONTENT_CHARS),
            thousands(total_chars)
        ));
        lines.push(
            "*Note: The structural metadata above (headings, tables, images) covers the COMPLETE document.*"
                .to_string(),
        );
    }

    lines.join("\n")
}

fn page_suffix(page: Option<u32>) -> String {
    match page {
        Some(p) => format!(" (page {p})"),
        None => String::new(),
    }
}

/// Group digits in threes: 15000 → "15,000".
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
