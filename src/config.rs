use std::collections::HashSet;
use std::time::Duration;

use crate::models::enums::DocumentFormat;

/// Application-level constants
pub const APP_NAME: &str = "statuspipe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default upload ceiling: 25MB. Status reports are small; anything bigger
/// is almost certainly a mis-upload.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 25 * 1024 * 1024;

/// Ceiling on wall-clock time for one submission, intake to terminal state.
pub const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 60;

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "statuspipe=info"
}

/// Immutable pipeline options, established once at process startup.
///
/// `max_document_bytes` rejects oversized uploads before any parsing;
/// `allowed_formats` gates which declared formats the loader will decode.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_document_bytes: u64,
    pub allowed_formats: HashSet<DocumentFormat>,
    /// A submission still running past this bound is marked failed with a
    /// timeout; the worker is not interrupted, its late writes are
    /// rejected by the terminal state.
    pub processing_timeout: Duration,
}

impl PipelineConfig {
    pub fn allows(&self, format: DocumentFormat) -> bool {
        self.allowed_formats.contains(&format)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            allowed_formats: [
                DocumentFormat::Pdf,
                DocumentFormat::Docx,
                DocumentFormat::Xlsx,
            ]
            .into_iter()
            .collect(),
            processing_timeout: Duration::from_secs(DEFAULT_PROCESSING_TIMEOUT_SECS),
        }
    }
}
