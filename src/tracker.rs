//! In-memory submission tracking. Clients poll here; the pipeline writes
//! here. All state lives behind one RwLock so status reads never block
//! each other.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::enums::ErrorCode;
use crate::models::records::DefectList;
use crate::models::submission::{ProcessingState, Submission};
use crate::persist::RecordSetRef;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("unknown submission: {0}")]
    UnknownSubmission(Uuid),

    #[error("submission {0} is already registered")]
    DuplicateSubmission(Uuid),

    #[error("illegal transition {from} -> {to}")]
    InvalidTransition {
        from: ProcessingState,
        to: ProcessingState,
    },

    #[error("tracker lock poisoned")]
    LockPoisoned,
}

/// What a status poll returns. `defects` and `error_code` are populated
/// only in the failed state; `record_set_ref` only in the succeeded one.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub submission_id: Uuid,
    pub state: ProcessingState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defects: Option<DefectList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_set_ref: Option<RecordSetRef>,
    pub updated_at: DateTime<Utc>,
}

struct TrackedSubmission {
    submission: Submission,
    state: ProcessingState,
    error_code: Option<ErrorCode>,
    error_detail: Option<String>,
    defects: Option<DefectList>,
    record_set_ref: Option<RecordSetRef>,
    updated_at: DateTime<Utc>,
}

impl TrackedSubmission {
    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            submission_id: self.submission.id,
            state: self.state,
            error_code: self.error_code,
            error_detail: self.error_detail.clone(),
            defects: self.defects.clone(),
            record_set_ref: self.record_set_ref,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Default)]
pub struct SubmissionTracker {
    entries: RwLock<HashMap<Uuid, TrackedSubmission>>,
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh submission in the queued state.
    pub fn register(&self, submission: Submission) -> Result<(), TrackerError> {
        let mut entries = self.entries.write().map_err(|_| TrackerError::LockPoisoned)?;
        if entries.contains_key(&submission.id) {
            return Err(TrackerError::DuplicateSubmission(submission.id));
        }
        tracing::info!(
            submission_id = %submission.id,
            area = %submission.area,
            format = %submission.format,
            "submission registered"
        );
        entries.insert(
            submission.id,
            TrackedSubmission {
                submission,
                state: ProcessingState::Queued,
                error_code: None,
                error_detail: None,
                defects: None,
                record_set_ref: None,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Advance to the next non-terminal stage. The transition is checked
    /// and applied under one write lock, so a poll sees either the old
    /// state or the new one, never an intermediate.
    pub fn advance(&self, id: Uuid, to: ProcessingState) -> Result<(), TrackerError> {
        self.transition(id, to, |_| {})
    }

    /// Terminal success, carrying the persistence reference.
    pub fn succeed(&self, id: Uuid, record_set_ref: RecordSetRef) -> Result<(), TrackerError> {
        self.transition(id, ProcessingState::Succeeded, |entry| {
            entry.record_set_ref = Some(record_set_ref);
        })
    }

    /// Terminal failure from validation defects.
    pub fn fail_with_defects(&self, id: Uuid, defects: DefectList) -> Result<(), TrackerError> {
        self.transition(id, ProcessingState::Failed, |entry| {
            entry.defects = Some(defects);
        })
    }

    /// Terminal failure from a stage error.
    pub fn fail_with_error(
        &self,
        id: Uuid,
        code: ErrorCode,
        detail: impl Into<String>,
    ) -> Result<(), TrackerError> {
        self.transition(id, ProcessingState::Failed, |entry| {
            entry.error_code = Some(code);
            entry.error_detail = Some(detail.into());
        })
    }

    pub fn status(&self, id: Uuid) -> Result<StatusSnapshot, TrackerError> {
        let entries = self.entries.read().map_err(|_| TrackerError::LockPoisoned)?;
        entries
            .get(&id)
            .map(TrackedSubmission::snapshot)
            .ok_or(TrackerError::UnknownSubmission(id))
    }

    fn transition(
        &self,
        id: Uuid,
        to: ProcessingState,
        apply: impl FnOnce(&mut TrackedSubmission),
    ) -> Result<(), TrackerError> {
        let mut entries = self.entries.write().map_err(|_| TrackerError::LockPoisoned)?;
        let entry = entries
            .get_mut(&id)
            .ok_or(TrackerError::UnknownSubmission(id))?;
        if !entry.state.can_advance(to) {
            return Err(TrackerError::InvalidTransition {
                from: entry.state,
                to,
            });
        }
        tracing::debug!(submission_id = %id, from = %entry.state, to = %to, "state transition");
        entry.state = to;
        entry.updated_at = Utc::now();
        apply(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::DefectCode;
    use crate::models::records::Defect;
    use std::sync::Arc;

    fn registered(tracker: &SubmissionTracker) -> Uuid {
        let submission = Submission::new("TI", "pdf", "user:1");
        let id = submission.id;
        tracker.register(submission).unwrap();
        id
    }

    #[test]
    fn full_success_path() {
        let tracker = SubmissionTracker::new();
        let id = registered(&tracker);
        assert_eq!(tracker.status(id).unwrap().state, ProcessingState::Queued);

        tracker.advance(id, ProcessingState::Parsing).unwrap();
        tracker.advance(id, ProcessingState::Validating).unwrap();
        tracker.advance(id, ProcessingState::Persisting).unwrap();
        let set_ref = RecordSetRef::new();
        tracker.succeed(id, set_ref).unwrap();

        let snapshot = tracker.status(id).unwrap();
        assert_eq!(snapshot.state, ProcessingState::Succeeded);
        assert_eq!(snapshot.record_set_ref, Some(set_ref));
        assert!(snapshot.defects.is_none());
    }

    #[test]
    fn failure_keeps_defects_for_polling() {
        let tracker = SubmissionTracker::new();
        let id = registered(&tracker);
        tracker.advance(id, ProcessingState::Parsing).unwrap();
        tracker.advance(id, ProcessingState::Validating).unwrap();
        let defects = vec![Defect::new(
            "period",
            DefectCode::MissingPeriod,
            "no period found",
        )];
        tracker.fail_with_defects(id, defects).unwrap();

        let snapshot = tracker.status(id).unwrap();
        assert_eq!(snapshot.state, ProcessingState::Failed);
        assert_eq!(snapshot.defects.unwrap().len(), 1);
        assert!(snapshot.record_set_ref.is_none());
    }

    #[test]
    fn terminal_state_rejects_further_transitions() {
        let tracker = SubmissionTracker::new();
        let id = registered(&tracker);
        tracker
            .fail_with_error(id, ErrorCode::UnknownArea, "no extractor for 'finance'")
            .unwrap();
        let err = tracker.advance(id, ProcessingState::Parsing).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidTransition { .. }));
        // failure payload is untouched by the rejected transition
        let snapshot = tracker.status(id).unwrap();
        assert_eq!(snapshot.error_code, Some(ErrorCode::UnknownArea));
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let tracker = SubmissionTracker::new();
        let id = registered(&tracker);
        let err = tracker
            .advance(id, ProcessingState::Persisting)
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::InvalidTransition {
                from: ProcessingState::Queued,
                to: ProcessingState::Persisting,
            }
        ));
    }

    #[test]
    fn unknown_id_reported_as_such() {
        let tracker = SubmissionTracker::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            tracker.status(id).unwrap_err(),
            TrackerError::UnknownSubmission(_)
        ));
        assert!(matches!(
            tracker.advance(id, ProcessingState::Parsing).unwrap_err(),
            TrackerError::UnknownSubmission(_)
        ));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let tracker = SubmissionTracker::new();
        let submission = Submission::new("TI", "pdf", "user:1");
        tracker.register(submission.clone()).unwrap();
        assert!(matches!(
            tracker.register(submission).unwrap_err(),
            TrackerError::DuplicateSubmission(_)
        ));
    }

    #[test]
    fn concurrent_polls_see_consistent_states() {
        let tracker = Arc::new(SubmissionTracker::new());
        let id = registered(&tracker);

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let state = tracker.status(id).unwrap().state;
                        // every observed state is a real stage, never torn
                        assert!(state.rank() <= 4);
                    }
                })
            })
            .collect();

        tracker.advance(id, ProcessingState::Parsing).unwrap();
        tracker.advance(id, ProcessingState::Validating).unwrap();
        tracker.advance(id, ProcessingState::Persisting).unwrap();
        tracker.succeed(id, RecordSetRef::new()).unwrap();

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(tracker.status(id).unwrap().state, ProcessingState::Succeeded);
    }
}
