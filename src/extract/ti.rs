//! Extractor for TI (technology) status reports.
//!
//! TI reports arrive in three shapes: narrative PDFs with "Label: value"
//! lines and pipe-delimited milestone rows, DOCX files mixing paragraphs
//! and tables, and XLSX workbooks with KPI and milestone sheets. All
//! three funnel through the same candidate collection below.

use std::sync::LazyLock;

use regex::Regex;

use crate::loader::{CellGrid, StructuredView, TextBlock};
use crate::models::enums::Area;
use crate::models::records::{ExtractionDraft, KpiCandidate, MilestoneCandidate};

use super::vocab::{self, KpiSpec};
use super::{AreaExtractor, ExtractError};

static SPRINT_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsprint\s*[:#]?\s*(?:sprint\s*)?(\d{1,4})\b").unwrap()
});
static QUARTER_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(20\d{2})\s*[-/]\s*q([1-4])\b").unwrap());

pub struct TiExtractor;

impl AreaExtractor for TiExtractor {
    fn area(&self) -> Area {
        Area::Ti
    }

    fn extract(&self, view: &StructuredView) -> Result<ExtractionDraft, ExtractError> {
        let mut collector = Collector::default();
        for block in &view.text_blocks {
            collector.scan_text_block(block);
        }
        for grid in &view.grids {
            collector.scan_grid(grid);
        }
        collector.into_draft()
    }
}

#[derive(Default)]
struct Collector {
    kpis: Vec<KpiCandidate>,
    milestones: Vec<MilestoneCandidate>,
    /// Canonicalized period candidates, first-seen order, deduplicated.
    periods: Vec<String>,
    /// A labeled period that did not canonicalize; alone it reaches
    /// validation as unrecognized, next to a recognized candidate it
    /// makes the period ambiguous.
    raw_period: Option<String>,
}

impl Collector {
    fn into_draft(self) -> Result<ExtractionDraft, ExtractError> {
        let Collector {
            kpis,
            milestones,
            mut periods,
            raw_period,
        } = self;
        // a labeled period that did not canonicalize disagrees with any
        // recognized candidate by construction; alone, it flows to
        // validation as unrecognized rather than being guessed at
        if let Some(raw) = raw_period {
            if !periods.contains(&raw) {
                periods.push(raw);
            }
        }
        if periods.len() > 1 {
            return Err(ExtractError::AmbiguousPeriod {
                candidates: periods,
            });
        }
        let draft = ExtractionDraft {
            area: Area::Ti,
            kpis,
            milestones,
            period: periods.into_iter().next(),
        };
        if draft.is_empty() {
            return Err(ExtractError::NoExtractableContent);
        }
        Ok(draft)
    }

    fn push_period(&mut self, candidate: String) {
        if !self.periods.contains(&candidate) {
            self.periods.push(candidate);
        }
    }

    // ---- text blocks -------------------------------------------------------

    fn scan_text_block(&mut self, block: &TextBlock) {
        let source = format!("page {} block {}", block.page, block.index);
        for line in block.text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if self.try_milestone_line(line, &source) {
                continue;
            }
            if self.try_kpi_line(line, &source) {
                continue;
            }
            self.scan_period_text(line);
        }
    }

    /// Pipe-delimited milestone rows:
    /// `Milestone: Go-live | Status: Em Risco | Prevista: 12/05/2024 | Data Realizada: —`
    fn try_milestone_line(&mut self, line: &str, source: &str) -> bool {
        if !line.contains('|') {
            return false;
        }
        let mut name = None;
        let mut status = None;
        let mut planned = None;
        let mut actual = None;
        for segment in line.split('|') {
            let Some((label, value)) = segment.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match vocab::normalize_label(label).as_str() {
                "milestone" | "marco" => name = Some(value.to_string()),
                "status" | "estado" => status = Some(value.to_string()),
                "prevista" | "data prevista" | "planned" | "planned date" => {
                    planned = optional_field(value);
                }
                "realizada" | "data realizada" | "actual" | "actual date" => {
                    actual = optional_field(value);
                }
                _ => {}
            }
        }
        match (name, status) {
            (Some(name), Some(status)) => {
                self.milestones.push(MilestoneCandidate {
                    name,
                    status,
                    planned_date: planned,
                    actual_date: actual,
                    source: source.to_string(),
                });
                true
            }
            _ => false,
        }
    }

    /// `Label: value [unit]` lines where the label is in the KPI vocabulary.
    fn try_kpi_line(&mut self, line: &str, source: &str) -> bool {
        let Some((label, rest)) = line.split_once(':') else {
            return false;
        };
        let Some(spec) = vocab::lookup_kpi(Area::Ti, label) else {
            return false;
        };
        let (value, unit) = split_trailing_unit(rest.trim(), spec);
        self.kpis.push(KpiCandidate {
            name: spec.name.to_string(),
            value,
            unit,
            period: None,
            source: source.to_string(),
        });
        true
    }

    fn scan_period_text(&mut self, line: &str) {
        if let Some((label, rest)) = line.split_once(':') {
            let label = vocab::normalize_label(label);
            if label == "period" || label == "periodo" {
                match vocab::normalize_period(rest.trim()) {
                    Some(canonical) => self.push_period(canonical),
                    None => {
                        if self.raw_period.is_none() {
                            self.raw_period = Some(rest.trim().to_string());
                        }
                    }
                }
                return;
            }
        }
        if let Some(caps) = SPRINT_TEXT_RE.captures(line) {
            self.push_period(format!("sprint-{}", &caps[1]));
        }
        if let Some(caps) = QUARTER_TEXT_RE.captures(line) {
            self.push_period(format!("{}-Q{}", &caps[1], &caps[2]));
        }
    }

    // ---- grids -------------------------------------------------------------

    fn scan_grid(&mut self, grid: &CellGrid) {
        if is_milestone_grid(grid) {
            self.scan_milestone_grid(grid);
            return;
        }
        for (row_idx, row) in grid.rows.iter().enumerate() {
            let source = format!("sheet {} row {}", grid.name, row_idx + 1);
            let label = row.first().map(String::as_str).unwrap_or("");
            if let Some(spec) = vocab::lookup_kpi(Area::Ti, label) {
                let value = row.get(1).cloned().unwrap_or_default();
                let unit = row.get(2).cloned().unwrap_or_default();
                let period_cell = row.get(3).map(String::as_str).unwrap_or("");
                let period = vocab::normalize_period(period_cell);
                if let Some(ref canonical) = period {
                    self.push_period(canonical.clone());
                }
                self.kpis.push(KpiCandidate {
                    name: spec.name.to_string(),
                    value,
                    unit,
                    period,
                    source,
                });
                continue;
            }
            let normalized_label = vocab::normalize_label(label);
            if normalized_label == "period" || normalized_label == "periodo" {
                let cell = row.get(1).map(String::as_str).unwrap_or("");
                match vocab::normalize_period(cell) {
                    Some(canonical) => self.push_period(canonical),
                    None if !cell.trim().is_empty() => {
                        if self.raw_period.is_none() {
                            self.raw_period = Some(cell.trim().to_string());
                        }
                    }
                    None => {}
                }
                continue;
            }
            // standalone period cells, e.g. a header cell "Sprint 12"
            for cell in row {
                if let Some(canonical) = vocab::normalize_period(cell) {
                    self.push_period(canonical);
                }
            }
        }
    }

    fn scan_milestone_grid(&mut self, grid: &CellGrid) {
        let header = &grid.rows[0];
        let col = |names: &[&str]| {
            header.iter().position(|h| {
                let h = vocab::normalize_label(h);
                names.contains(&h.as_str())
            })
        };
        let name_col = col(&["milestone", "marco", "descricao", "description"]);
        let status_col = col(&["status", "estado"]);
        let planned_col = col(&["prevista", "data prevista", "planned", "planned date"]);
        let actual_col = col(&["realizada", "data realizada", "actual", "actual date"]);
        let (Some(name_col), Some(status_col)) = (name_col, status_col) else {
            return;
        };

        for (row_idx, row) in grid.rows.iter().enumerate().skip(1) {
            let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).cloned();
            let Some(name) = cell(Some(name_col)).filter(|n| !n.trim().is_empty()) else {
                continue;
            };
            self.milestones.push(MilestoneCandidate {
                name: name.trim().to_string(),
                status: cell(Some(status_col)).unwrap_or_default(),
                planned_date: cell(planned_col).and_then(|v| optional_field(&v)),
                actual_date: cell(actual_col).and_then(|v| optional_field(&v)),
                source: format!("sheet {} row {}", grid.name, row_idx + 1),
            });
        }
    }
}

fn is_milestone_grid(grid: &CellGrid) -> bool {
    let Some(header) = grid.rows.first() else {
        return false;
    };
    let has = |names: &[&str]| {
        header.iter().any(|h| {
            let h = vocab::normalize_label(h);
            names.contains(&h.as_str())
        })
    };
    has(&["milestone", "marco", "descricao", "description"]) && has(&["status", "estado"])
}

/// An absent marker becomes `None`; anything else is kept raw for the
/// validator to judge.
fn optional_field(value: &str) -> Option<String> {
    if vocab::is_absent(value) {
        None
    } else {
        Some(value.trim().to_string())
    }
}

/// Split `42 pts` into ("42", "pts") when the trailing token is a unit
/// this KPI accepts; otherwise the whole text is the value.
fn split_trailing_unit(rest: &str, spec: &KpiSpec) -> (String, String) {
    if let Some((head, tail)) = rest.rsplit_once(char::is_whitespace) {
        let tail_norm = vocab::normalize_label(tail);
        if spec.conversions.iter().any(|(u, _)| *u == tail_norm) {
            return (head.trim().to_string(), tail.trim().to_string());
        }
    }
    (rest.to_string(), String::new())
}
