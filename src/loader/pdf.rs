//! PDF decoding via the embedded text layer. Scanned PDFs without a text
//! layer come out empty and are reported as such; no OCR is attempted.

use super::{LoaderError, StructuredView, TextBlock};

pub(super) fn load(bytes: &[u8]) -> Result<StructuredView, LoaderError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| LoaderError::CorruptDocument(e.to_string()))?;

    let mut blocks = Vec::new();
    // extract_text emits a form feed between pages
    for (page_idx, page) in text.split('\u{0c}').enumerate() {
        blocks.extend(blocks_from_page(page_idx + 1, page));
    }
    Ok(StructuredView {
        text_blocks: blocks,
        grids: Vec::new(),
    })
}

/// Split a page's text into paragraph-level blocks on blank lines, keeping
/// line breaks inside a block so row-shaped lines survive intact.
fn blocks_from_page(page: usize, text: &str) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            flush(page, &mut current, &mut blocks);
        } else {
            current.push(line.trim());
        }
    }
    flush(page, &mut current, &mut blocks);
    blocks
}

fn flush(page: usize, current: &mut Vec<&str>, blocks: &mut Vec<TextBlock>) {
    if current.is_empty() {
        return;
    }
    blocks.push(TextBlock {
        page,
        index: blocks.len(),
        text: current.join("\n"),
    });
    current.clear();
}
