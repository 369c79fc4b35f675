//! Persistence boundary. The pipeline hands a validated record set to a
//! [`PersistenceAdapter`] and gets back an opaque reference; what sits
//! behind the trait (a database, a queue, the in-memory store below) is
//! a deployment decision.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::enums::ErrorCode;
use crate::models::records::ValidatedRecordSet;

/// Opaque handle to a persisted record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordSetRef(Uuid);

impl RecordSetRef {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RecordSetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("persistence backend unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unavailable(_) => ErrorCode::PersistenceUnavailable,
        }
    }
}

pub trait PersistenceAdapter: Send + Sync {
    /// Store the record set atomically: either the whole set is stored
    /// and a reference returned, or nothing is.
    fn persist(&self, set: &ValidatedRecordSet) -> Result<RecordSetRef, PersistenceError>;
}

/// Default adapter: keeps record sets in process memory. Suitable for
/// tests and single-node deployments.
#[derive(Default)]
pub struct InMemoryPersistence {
    sets: Mutex<HashMap<RecordSetRef, ValidatedRecordSet>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, set_ref: RecordSetRef) -> Option<ValidatedRecordSet> {
        self.sets.lock().ok()?.get(&set_ref).cloned()
    }

    pub fn len(&self) -> usize {
        self.sets.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistenceAdapter for InMemoryPersistence {
    fn persist(&self, set: &ValidatedRecordSet) -> Result<RecordSetRef, PersistenceError> {
        let mut sets = self
            .sets
            .lock()
            .map_err(|_| PersistenceError::Unavailable("store lock poisoned".into()))?;
        let set_ref = RecordSetRef::new();
        sets.insert(set_ref, set.clone());
        tracing::info!(
            record_set_ref = %set_ref,
            area = %set.area,
            period = %set.period.label,
            kpis = set.kpis.len(),
            milestones = set.milestones.len(),
            "record set persisted"
        );
        Ok(set_ref)
    }
}

/// Adapter that always refuses, for exercising the failure path.
pub struct UnavailablePersistence;

impl PersistenceAdapter for UnavailablePersistence {
    fn persist(&self, _set: &ValidatedRecordSet) -> Result<RecordSetRef, PersistenceError> {
        Err(PersistenceError::Unavailable(
            "backend is offline".into(),
        ))
    }
}
