//! Domain records flowing through the pipeline: unvalidated candidates
//! produced by area extractors, and the validated records handed to the
//! persistence boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{Area, DefectCode, MilestoneStatus};

/// One KPI occurrence as found in the document, before validation.
/// All fields are raw strings; typing happens in the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiCandidate {
    /// Canonical vocabulary name the label resolved to (e.g. "velocity").
    pub name: String,
    /// Raw value text as written in the document.
    pub value: String,
    /// Raw unit text; may be empty when the document omits it.
    pub unit: String,
    /// Raw per-entry period/date text, if the row carried one.
    pub period: Option<String>,
    /// Where in the document this came from (page/sheet/row), for defect paths.
    pub source: String,
}

/// One milestone occurrence as found in the document, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneCandidate {
    pub name: String,
    /// Free-text status word, mapped to the enumeration by the validator.
    pub status: String,
    pub planned_date: Option<String>,
    pub actual_date: Option<String>,
    pub source: String,
}

/// Unvalidated output of one area extractor run. Owned by the pipeline
/// run and discarded after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionDraft {
    pub area: Area,
    pub kpis: Vec<KpiCandidate>,
    pub milestones: Vec<MilestoneCandidate>,
    /// Resolved period label candidate (already canonicalized), if any.
    /// Absence is a validation defect, not a silent default.
    pub period: Option<String>,
}

impl ExtractionDraft {
    pub fn is_empty(&self) -> bool {
        self.kpis.is_empty() && self.milestones.is_empty() && self.period.is_none()
    }
}

/// The single resolved reporting period for a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodInfo {
    pub label: String,
}

/// A validated, normalized KPI reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    pub name: String,
    pub value: f64,
    /// Canonical unit for this KPI name after conversion.
    pub unit: String,
    /// Canonical period label this reading belongs to.
    pub period: String,
}

/// A validated milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRecord {
    pub name: String,
    pub status: MilestoneStatus,
    pub planned_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
}

/// The all-or-nothing output of a successful validation pass, handed to
/// the persistence boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecordSet {
    pub area: Area,
    pub period: PeriodInfo,
    pub kpis: Vec<KpiRecord>,
    pub milestones: Vec<MilestoneRecord>,
}

/// One reason a draft failed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defect {
    /// Path to the offending field, e.g. `milestones[0].actual_date`.
    pub field: String,
    pub code: DefectCode,
    pub detail: String,
}

impl Defect {
    pub fn new(field: impl Into<String>, code: DefectCode, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            detail: detail.into(),
        }
    }
}

/// Ordered list of validation defects. Non-empty implies the submission's
/// terminal state is `failed`.
pub type DefectList = Vec<Defect>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_detected() {
        let draft = ExtractionDraft {
            area: Area::Ti,
            kpis: vec![],
            milestones: vec![],
            period: None,
        };
        assert!(draft.is_empty());
    }

    #[test]
    fn draft_with_only_period_is_not_empty() {
        let draft = ExtractionDraft {
            area: Area::Ti,
            kpis: vec![],
            milestones: vec![],
            period: Some("sprint-12".into()),
        };
        assert!(!draft.is_empty());
    }

    #[test]
    fn defect_serializes_with_code_string() {
        let defect = Defect::new(
            "kpis[0].value",
            DefectCode::NotNumeric,
            "value 'abc' is not numeric",
        );
        let json = serde_json::to_string(&defect).unwrap();
        assert!(json.contains("kpis[0].value"));
        assert!(json.contains("not_numeric"));
    }
}
