//! Document loading: byte-level gates plus per-format decoding into a
//! format-neutral [`StructuredView`] that area extractors consume.
//!
//! The loader never interprets domain content. It only answers "what text
//! blocks and cell grids does this document contain".

mod docx;
mod pdf;
mod xlsx;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::models::enums::{DocumentFormat, ErrorCode};

// ── Structured view ─────────────────────────────────────────────────────────

/// A contiguous run of text from the document, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// 1-based page (PDF) or section (DOCX) the block came from.
    pub page: usize,
    /// 0-based position within the page, for stable source references.
    pub index: usize,
    pub text: String,
}

/// A rectangular grid of cell values from a table or worksheet.
/// Cells are raw strings; numeric typing happens downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellGrid {
    /// Sheet name (XLSX) or a synthetic table label (DOCX).
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl CellGrid {
    pub fn is_empty(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.iter().all(|cell| cell.trim().is_empty()))
    }
}

/// Format-neutral document content. A PDF yields only text blocks, an
/// XLSX only grids, a DOCX may yield both. Extractors branch on what is
/// present rather than on the original format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredView {
    pub text_blocks: Vec<TextBlock>,
    pub grids: Vec<CellGrid>,
}

impl StructuredView {
    pub fn is_empty(&self) -> bool {
        self.text_blocks.iter().all(|b| b.text.trim().is_empty())
            && self.grids.iter().all(CellGrid::is_empty)
    }
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("format '{0}' is not accepted by this deployment")]
    UnsupportedFormat(String),

    #[error("document could not be decoded: {0}")]
    CorruptDocument(String),

    #[error("document contains no content")]
    EmptyDocument,

    #[error("document is {size} bytes, limit is {max}")]
    PayloadTooLarge { size: u64, max: u64 },
}

impl LoaderError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedFormat(_) => ErrorCode::UnsupportedFormat,
            Self::CorruptDocument(_) => ErrorCode::CorruptDocument,
            Self::EmptyDocument => ErrorCode::EmptyDocument,
            Self::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
        }
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Decode `bytes` as the declared `format` into a [`StructuredView`].
///
/// Gate order is fixed: size, then format allow-list, then emptiness,
/// then decoding. The size gate runs first so oversized payloads are
/// rejected without touching a parser.
pub fn load_document(
    bytes: &[u8],
    format: DocumentFormat,
    config: &PipelineConfig,
) -> Result<StructuredView, LoaderError> {
    let size = bytes.len() as u64;
    if size > config.max_document_bytes {
        return Err(LoaderError::PayloadTooLarge {
            size,
            max: config.max_document_bytes,
        });
    }
    if !config.allows(format) {
        return Err(LoaderError::UnsupportedFormat(format.to_string()));
    }
    if bytes.is_empty() {
        return Err(LoaderError::EmptyDocument);
    }

    let view = match format {
        DocumentFormat::Pdf => pdf::load(bytes)?,
        DocumentFormat::Docx => docx::load(bytes)?,
        DocumentFormat::Xlsx => xlsx::load(bytes)?,
    };

    if view.is_empty() {
        return Err(LoaderError::EmptyDocument);
    }
    tracing::debug!(
        format = %format,
        text_blocks = view.text_blocks.len(),
        grids = view.grids.len(),
        "document decoded"
    );
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_config() -> PipelineConfig {
        PipelineConfig {
            max_document_bytes: 16,
            ..Default::default()
        }
    }

    #[test]
    fn oversized_payload_rejected_before_parsing() {
        let bytes = vec![0u8; 32];
        let err = load_document(&bytes, DocumentFormat::Pdf, &tiny_config()).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::PayloadTooLarge { size: 32, max: 16 }
        ));
        assert_eq!(err.code(), ErrorCode::PayloadTooLarge);
    }

    #[test]
    fn disallowed_format_rejected() {
        let config = PipelineConfig {
            allowed_formats: [DocumentFormat::Xlsx].into_iter().collect(),
            ..Default::default()
        };
        let err = load_document(b"%PDF-1.4", DocumentFormat::Pdf, &config).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedFormat);
    }

    #[test]
    fn empty_payload_rejected() {
        let err =
            load_document(&[], DocumentFormat::Xlsx, &PipelineConfig::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmptyDocument);
    }

    #[test]
    fn garbage_bytes_are_corrupt_not_empty() {
        let err = load_document(
            b"definitely not a zip archive",
            DocumentFormat::Xlsx,
            &PipelineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CorruptDocument);
    }

    #[test]
    fn blank_grid_counts_as_empty_view() {
        let view = StructuredView {
            text_blocks: vec![],
            grids: vec![CellGrid {
                name: "Sheet1".into(),
                rows: vec![vec!["".into(), "  ".into()]],
            }],
        };
        assert!(view.is_empty());
    }
}
