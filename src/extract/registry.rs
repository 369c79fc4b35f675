//! Routing from (declared area, declared format) to the extractor that
//! handles that combination. Resolution happens before any document
//! bytes are parsed, so a misrouted submission fails without paying the
//! decoding cost.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::enums::{Area, DocumentFormat, ErrorCode};

use super::ti::TiExtractor;
use super::AreaExtractor;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no extractor registered for area '{0}'")]
    UnknownArea(String),

    #[error("area '{area}' does not accept '{format}' documents")]
    UnsupportedCombination {
        area: Area,
        format: DocumentFormat,
    },
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownArea(_) => ErrorCode::UnknownArea,
            Self::UnsupportedCombination { .. } => ErrorCode::UnsupportedAreaFormatCombination,
        }
    }
}

/// Immutable after startup: built once, then shared read-only across
/// pipeline runs.
pub struct ExtractorRegistry {
    table: HashMap<(Area, DocumentFormat), Arc<dyn AreaExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        format: DocumentFormat,
        extractor: Arc<dyn AreaExtractor>,
    ) -> &mut Self {
        self.table.insert((extractor.area(), format), extractor);
        self
    }

    /// Resolve a raw area tag and parsed format to an extractor.
    ///
    /// An area tag that matches no registration at all (for any format)
    /// is an unknown area, even if it happens to spell a valid area
    /// name; a known area without this format is the combination error.
    pub fn resolve(
        &self,
        area_tag: &str,
        format: DocumentFormat,
    ) -> Result<Arc<dyn AreaExtractor>, RegistryError> {
        let Ok(area) = Area::from_tag(area_tag) else {
            return Err(RegistryError::UnknownArea(area_tag.to_string()));
        };
        if let Some(extractor) = self.table.get(&(area, format)) {
            return Ok(Arc::clone(extractor));
        }
        if self.table.keys().any(|(a, _)| *a == area) {
            Err(RegistryError::UnsupportedCombination { area, format })
        } else {
            Err(RegistryError::UnknownArea(area_tag.to_string()))
        }
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The registry this deployment ships with: the TI extractor for all
/// three document formats. Other areas onboard by adding registrations
/// here.
pub fn default_registry() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();
    let ti = Arc::new(TiExtractor);
    registry
        .register(DocumentFormat::Pdf, ti.clone())
        .register(DocumentFormat::Docx, ti.clone())
        .register(DocumentFormat::Xlsx, ti);
    registry
}
