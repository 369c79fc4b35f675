use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One uploaded document. Created at intake; immutable except for the
/// tracked processing state and terminal result, which live in the
/// tracker. A re-submission always mints a new `Submission` with a new
/// id; audit history is never overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    /// Area tag exactly as declared by the caller. Kept raw so an
    /// unrecognized tag still produces an auditable submission that
    /// fails closed at registry resolution.
    pub area: String,
    /// Declared format tag, raw for the same reason.
    pub format: String,
    /// Opaque reference to the uploading principal; never interpreted here.
    pub principal: String,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(area: &str, format: &str, principal: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            area: area.trim().to_string(),
            format: format.trim().to_string(),
            principal: principal.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Per-submission lifecycle state. Transitions are monotonic: rank never
/// decreases, exactly one terminal state is reached, no state is revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Queued,
    Parsing,
    Validating,
    Persisting,
    Succeeded,
    Failed,
}

impl ProcessingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Parsing => "parsing",
            Self::Validating => "validating",
            Self::Persisting => "persisting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Position in the forward order. Both terminal states share the top
    /// rank: once terminal, nothing is ordered after.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Parsing => 1,
            Self::Validating => 2,
            Self::Persisting => 3,
            Self::Succeeded | Self::Failed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// `Failed` is reachable from any non-terminal state (errors
    /// short-circuit); every other step advances by exactly one rank.
    pub fn can_advance(&self, next: ProcessingState) -> bool {
        if self.is_terminal() || next == Self::Queued {
            return false;
        }
        next == Self::Failed || next.rank() == self.rank() + 1
    }
}

impl std::fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
