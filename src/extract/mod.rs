//! Area-specific extraction: turning a format-neutral document view into
//! an unvalidated draft of KPI and milestone candidates.

pub mod registry;
pub mod ti;
pub mod vocab;

use crate::loader::StructuredView;
use crate::models::enums::{Area, ErrorCode};
use crate::models::records::ExtractionDraft;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("document decoded but no KPIs, milestones or period were found")]
    NoExtractableContent,

    #[error("document declares multiple distinct periods: {}", candidates.join(", "))]
    AmbiguousPeriod { candidates: Vec<String> },
}

impl ExtractError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoExtractableContent => ErrorCode::NoExtractableContent,
            Self::AmbiguousPeriod { .. } => ErrorCode::AmbiguousPeriod,
        }
    }
}

/// One business area's extraction strategy. Implementations must be pure:
/// same view in, same draft out, no I/O and no shared mutable state.
pub trait AreaExtractor: Send + Sync {
    fn area(&self) -> Area;

    /// Scan the view and collect candidates. Returns
    /// [`ExtractError::NoExtractableContent`] when nothing recognizable
    /// is present, never an empty draft.
    fn extract(&self, view: &StructuredView) -> Result<ExtractionDraft, ExtractError>;
}

impl std::fmt::Debug for dyn AreaExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AreaExtractor({})", self.area())
    }
}
