//! Draft validation and normalization. All checks run even after the
//! first failure so one pass reports every defect; a draft either
//! becomes a fully typed record set or is rejected whole.

use chrono::NaiveDate;

use crate::extract::vocab;
use crate::models::enums::DefectCode;
use crate::models::records::{
    Defect, DefectList, ExtractionDraft, KpiRecord, MilestoneRecord, PeriodInfo,
    ValidatedRecordSet,
};

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];

pub fn validate(draft: &ExtractionDraft) -> Result<ValidatedRecordSet, DefectList> {
    let mut defects = DefectList::new();

    let period = resolve_period(draft, &mut defects);
    let kpis = validate_kpis(draft, period.as_deref(), &mut defects);
    let milestones = validate_milestones(draft, &mut defects);

    if !defects.is_empty() {
        return Err(defects);
    }
    // period is Some here: a missing or unrecognized period is a defect
    let period = period.unwrap_or_default();
    Ok(ValidatedRecordSet {
        area: draft.area,
        period: PeriodInfo { label: period },
        kpis,
        milestones,
    })
}

fn resolve_period(draft: &ExtractionDraft, defects: &mut DefectList) -> Option<String> {
    match &draft.period {
        None => {
            defects.push(Defect::new(
                "period",
                DefectCode::MissingPeriod,
                "no reporting period was found in the document",
            ));
            None
        }
        Some(raw) => match vocab::normalize_period(raw) {
            Some(canonical) => Some(canonical),
            None => {
                defects.push(Defect::new(
                    "period",
                    DefectCode::UnrecognizedPeriod,
                    format!("'{raw}' is not a recognized period form"),
                ));
                None
            }
        },
    }
}

fn validate_kpis(
    draft: &ExtractionDraft,
    period: Option<&str>,
    defects: &mut DefectList,
) -> Vec<KpiRecord> {
    let mut records: Vec<KpiRecord> = Vec::new();

    for (idx, candidate) in draft.kpis.iter().enumerate() {
        let field = |name: &str| format!("kpis[{idx}].{name}");

        let Some(spec) = vocab::lookup_kpi(draft.area, &candidate.name) else {
            defects.push(Defect::new(
                field("name"),
                DefectCode::UnknownKpi,
                format!("'{}' is not in the {} vocabulary", candidate.name, draft.area),
            ));
            continue;
        };

        if vocab::is_absent(&candidate.value) {
            defects.push(Defect::new(
                field("value"),
                DefectCode::MissingField,
                format!("KPI '{}' has no value ({})", spec.name, candidate.source),
            ));
            continue;
        }
        let Some(raw_value) = vocab::parse_numeric(&candidate.value) else {
            defects.push(Defect::new(
                field("value"),
                DefectCode::NotNumeric,
                format!("'{}' is not numeric ({})", candidate.value, candidate.source),
            ));
            continue;
        };

        let Some(value) = vocab::convert_unit(spec, &candidate.unit, raw_value) else {
            defects.push(Defect::new(
                field("unit"),
                DefectCode::UnknownUnit,
                format!(
                    "unit '{}' is not accepted for '{}' ({})",
                    candidate.unit, spec.name, candidate.source
                ),
            ));
            continue;
        };

        let kpi_period = candidate
            .period
            .clone()
            .or_else(|| period.map(str::to_string))
            .unwrap_or_default();

        let record = KpiRecord {
            name: spec.name.to_string(),
            value,
            unit: spec.canonical_unit.to_string(),
            period: kpi_period,
        };

        // exact repeats collapse; same name+period with a different value
        // means the document contradicts itself
        let existing = records
            .iter()
            .position(|r| r.name == record.name && r.period == record.period);
        match existing {
            Some(i) if records[i].value == record.value => {}
            Some(i) => {
                defects.push(Defect::new(
                    field("value"),
                    DefectCode::ConflictingValues,
                    format!(
                        "KPI '{}' reported as both {} and {} for {}",
                        record.name, records[i].value, record.value, record.period
                    ),
                ));
            }
            None => records.push(record),
        }
    }

    records
}

fn validate_milestones(draft: &ExtractionDraft, defects: &mut DefectList) -> Vec<MilestoneRecord> {
    let mut records = Vec::new();

    for (idx, candidate) in draft.milestones.iter().enumerate() {
        let field = |name: &str| format!("milestones[{idx}].{name}");
        let mut ok = true;

        if candidate.name.trim().is_empty() {
            defects.push(Defect::new(
                field("name"),
                DefectCode::MissingField,
                format!("milestone has no name ({})", candidate.source),
            ));
            ok = false;
        }

        let status = match vocab::lookup_status(&candidate.status) {
            Some(status) => Some(status),
            None => {
                defects.push(Defect::new(
                    field("status"),
                    DefectCode::UnknownStatus,
                    format!(
                        "status '{}' is not recognized ({})",
                        candidate.status, candidate.source
                    ),
                ));
                ok = false;
                None
            }
        };

        let planned_date = parse_date(candidate.planned_date.as_deref(), || {
            defects.push(Defect::new(
                field("planned_date"),
                DefectCode::InvalidDate,
                format!(
                    "'{}' is not a valid date ({})",
                    candidate.planned_date.as_deref().unwrap_or(""),
                    candidate.source
                ),
            ));
        });
        let actual_date = parse_date(candidate.actual_date.as_deref(), || {
            defects.push(Defect::new(
                field("actual_date"),
                DefectCode::InvalidDate,
                format!(
                    "'{}' is not a valid date ({})",
                    candidate.actual_date.as_deref().unwrap_or(""),
                    candidate.source
                ),
            ));
        });
        if planned_date.is_err() || actual_date.is_err() {
            ok = false;
        }

        if status == Some(crate::models::enums::MilestoneStatus::Completed)
            && matches!(actual_date, Ok(None))
        {
            defects.push(Defect::new(
                field("actual_date"),
                DefectCode::MissingActualDate,
                format!(
                    "milestone '{}' is completed but has no actual date ({})",
                    candidate.name, candidate.source
                ),
            ));
            ok = false;
        }

        if !ok {
            continue;
        }
        let record = MilestoneRecord {
            name: candidate.name.trim().to_string(),
            status: status.unwrap_or(crate::models::enums::MilestoneStatus::Planned),
            planned_date: planned_date.unwrap_or(None),
            actual_date: actual_date.unwrap_or(None),
        };

        // exact repeats collapse; a reappearing name+planned date with a
        // different status or actual date contradicts itself
        let existing = records
            .iter()
            .position(|r: &MilestoneRecord| {
                r.name == record.name && r.planned_date == record.planned_date
            });
        match existing {
            Some(i) if records[i] == record => {}
            Some(_) => {
                defects.push(Defect::new(
                    field("status"),
                    DefectCode::ConflictingValues,
                    format!(
                        "milestone '{}' appears twice with differing fields ({})",
                        record.name, candidate.source
                    ),
                ));
            }
            None => records.push(record),
        }
    }

    records
}

/// `Ok(None)` when absent, `Ok(Some(date))` when parseable in any of the
/// accepted formats, `Err(())` (after invoking `on_invalid`) otherwise.
fn parse_date(raw: Option<&str>, on_invalid: impl FnOnce()) -> Result<Option<NaiveDate>, ()> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), format) {
            return Ok(Some(date));
        }
    }
    on_invalid();
    Err(())
}
