//! Controlled vocabulary and normalization rules: KPI names and units per
//! area, milestone status words, period canonicalization, and the numeric
//! cleanup applied to financial values.
//!
//! Reports arrive in Portuguese and English; all matching happens on
//! accent-folded lowercase labels so "Orçamento Total" and "budget total"
//! resolve to the same KPI.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::enums::{Area, MilestoneStatus};

// ── KPI vocabulary ──────────────────────────────────────────────────────────

/// One recognized KPI: its canonical name, the labels that resolve to it,
/// and the units accepted for it with their conversion factor into the
/// canonical unit.
pub struct KpiSpec {
    pub name: &'static str,
    /// Normalized (lowercase, accent-folded) label aliases.
    pub aliases: &'static [&'static str],
    pub canonical_unit: &'static str,
    /// Accepted unit spellings and the factor that converts a value in
    /// that unit into the canonical one.
    pub conversions: &'static [(&'static str, f64)],
}

const TI_KPIS: &[KpiSpec] = &[
    KpiSpec {
        name: "velocity",
        aliases: &["velocity", "velocidade"],
        canonical_unit: "points",
        conversions: &[("points", 1.0), ("pts", 1.0), ("story points", 1.0)],
    },
    KpiSpec {
        name: "budget_total",
        aliases: &["budget_total", "budget total", "orcamento total", "orcamento"],
        canonical_unit: "eur",
        conversions: &[("eur", 1.0), ("€", 1.0), ("keur", 1000.0), ("k€", 1000.0)],
    },
    KpiSpec {
        name: "cost_realized",
        aliases: &["cost_realized", "cost realized", "custo realizado", "custo"],
        canonical_unit: "eur",
        conversions: &[("eur", 1.0), ("€", 1.0), ("keur", 1000.0), ("k€", 1000.0)],
    },
    KpiSpec {
        name: "story_points_delivered",
        aliases: &[
            "story_points_delivered",
            "story points delivered",
            "pontos entregues",
            "story points entregues",
        ],
        canonical_unit: "points",
        conversions: &[("points", 1.0), ("pts", 1.0), ("story points", 1.0)],
    },
];

/// Resolve a document label to a KPI spec for the given area. Matching is
/// accent- and case-insensitive; unknown labels return `None`.
pub fn lookup_kpi(area: Area, label: &str) -> Option<&'static KpiSpec> {
    let table: &[KpiSpec] = match area {
        Area::Ti => TI_KPIS,
        // Other areas have no vocabulary registered yet.
        _ => &[],
    };
    let normalized = normalize_label(label);
    table
        .iter()
        .find(|spec| spec.aliases.contains(&normalized.as_str()))
}

/// Convert `value` expressed in `unit` into the spec's canonical unit.
/// An empty unit means the document omitted it; the value is taken as
/// already canonical. Unknown units return `None`.
pub fn convert_unit(spec: &KpiSpec, unit: &str, value: f64) -> Option<f64> {
    let normalized = normalize_label(unit);
    if normalized.is_empty() {
        return Some(value);
    }
    spec.conversions
        .iter()
        .find(|(u, _)| *u == normalized)
        .map(|(_, factor)| value * factor)
}

// ── Status vocabulary ───────────────────────────────────────────────────────

/// Map a free-text status word to the status enumeration. "Em risco" maps
/// to delayed: a milestone flagged at risk is reported as behind plan
/// rather than silently on track.
pub fn lookup_status(raw: &str) -> Option<MilestoneStatus> {
    match normalize_label(raw).as_str() {
        "concluido" | "concluida" | "completo" | "completa" | "completed" | "done" => {
            Some(MilestoneStatus::Completed)
        }
        "em andamento" | "andamento" | "em progresso" | "in progress" => {
            Some(MilestoneStatus::InProgress)
        }
        "em risco" | "atrasado" | "atrasada" | "delayed" | "at risk" => {
            Some(MilestoneStatus::Delayed)
        }
        "planejado" | "planejada" | "planeado" | "pendente" | "planned" | "pending" => {
            Some(MilestoneStatus::Planned)
        }
        "cancelado" | "cancelada" | "cancelled" | "canceled" => Some(MilestoneStatus::Cancelled),
        _ => None,
    }
}

// ── Period canonicalization ─────────────────────────────────────────────────

static SPRINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^sprint\s*[:#\-]?\s*(?:sprint\s*)?(\d{1,4})$").unwrap()
});
static QUARTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(20\d{2})\s*[-/ ]?\s*q([1-4])$").unwrap());
static QUARTER_FIRST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^q([1-4])\s*[-/ ]?\s*(20\d{2})$").unwrap());
static MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(20\d{2})[-/](0[1-9]|1[0-2])$").unwrap());
static MONTH_FIRST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/(20\d{2})$").unwrap());

/// Canonicalize a period expression. Recognized forms:
/// sprint numbers ("Sprint 12" -> "sprint-12"), quarters
/// ("Q1 2024" / "2024-Q1" -> "2024-Q1") and months
/// ("03/2024" / "2024-03" -> "2024-03"). Anything else returns `None`.
pub fn normalize_period(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if let Some(caps) = SPRINT_RE.captures(trimmed) {
        let n: u32 = caps[1].parse().ok()?;
        return Some(format!("sprint-{n}"));
    }
    if let Some(caps) = QUARTER_RE.captures(trimmed) {
        return Some(format!("{}-Q{}", &caps[1], &caps[2]));
    }
    if let Some(caps) = QUARTER_FIRST_RE.captures(trimmed) {
        return Some(format!("{}-Q{}", &caps[2], &caps[1]));
    }
    if let Some(caps) = MONTH_RE.captures(trimmed) {
        return Some(format!("{}-{}", &caps[1], &caps[2]));
    }
    if let Some(caps) = MONTH_FIRST_RE.captures(trimmed) {
        return Some(format!("{}-{}", &caps[2], &caps[1]));
    }
    None
}

// ── Normalization helpers ───────────────────────────────────────────────────

/// Lowercase, collapse internal whitespace and fold the accented letters
/// that appear in Portuguese report labels.
pub fn normalize_label(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let folded: String = lowered
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a cell value means "no value": empty, a lone dash in any of
/// the dash glyphs documents actually use, or an explicit n/a.
pub fn is_absent(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }
    matches!(trimmed, "-" | "‐" | "–" | "—" | "―" | "n/a" | "N/A" | "NA")
}

/// Clean a numeric value as written in reports and parse it.
///
/// Handles currency markers ("€ 1.234,56", "R$ 500"), space grouping,
/// and both decimal conventions: when both separators appear, the last
/// one is the decimal mark; a lone comma is a decimal mark; dots in
/// three-digit groups are thousands separators.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let mut s: String = raw
        .trim()
        .replace("R$", "")
        .replace(['€', '$', '%'], "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if s.is_empty() {
        return None;
    }

    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');
    match (last_dot, last_comma) {
        (Some(d), Some(c)) => {
            if c > d {
                // pt style: dots group, comma is decimal
                s = s.replace('.', "").replace(',', ".");
            } else {
                s = s.replace(',', "");
            }
        }
        (None, Some(_)) => {
            if s.matches(',').count() == 1 {
                s = s.replace(',', ".");
            } else {
                s = s.replace(',', "");
            }
        }
        (Some(_), None) => {
            if looks_like_dot_grouping(&s) {
                s = s.replace('.', "");
            }
        }
        (None, None) => {}
    }

    s.parse::<f64>().ok()
}

/// "1.234" or "12.345.678": every dot-delimited group after the first has
/// exactly three digits, so the dots are thousands separators.
fn looks_like_dot_grouping(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let parts: Vec<&str> = body.split('.').collect();
    parts.len() > 1
        && parts[0].len() <= 3
        && !parts[0].is_empty()
        && parts[1..].iter().all(|p| p.len() == 3)
        && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_fold_accents_and_case() {
        assert_eq!(normalize_label("  Orçamento   Total "), "orcamento total");
        assert_eq!(normalize_label("CONCLUÍDO"), "concluido");
    }

    #[test]
    fn kpi_lookup_matches_portuguese_and_english() {
        assert_eq!(lookup_kpi(Area::Ti, "Orçamento Total").unwrap().name, "budget_total");
        assert_eq!(lookup_kpi(Area::Ti, "budget total").unwrap().name, "budget_total");
        assert_eq!(lookup_kpi(Area::Ti, "Velocity").unwrap().name, "velocity");
        assert!(lookup_kpi(Area::Ti, "headcount").is_none());
        assert!(lookup_kpi(Area::Marketing, "velocity").is_none());
    }

    #[test]
    fn unit_conversion_scales_keur() {
        let spec = lookup_kpi(Area::Ti, "custo realizado").unwrap();
        assert_eq!(convert_unit(spec, "kEUR", 12.5), Some(12_500.0));
        assert_eq!(convert_unit(spec, "€", 100.0), Some(100.0));
        assert_eq!(convert_unit(spec, "", 100.0), Some(100.0));
        assert_eq!(convert_unit(spec, "usd", 100.0), None);
    }

    #[test]
    fn status_words_map_in_both_languages() {
        assert_eq!(lookup_status("Concluído"), Some(MilestoneStatus::Completed));
        assert_eq!(lookup_status("completo"), Some(MilestoneStatus::Completed));
        assert_eq!(lookup_status("Em Andamento"), Some(MilestoneStatus::InProgress));
        assert_eq!(lookup_status("Em Risco"), Some(MilestoneStatus::Delayed));
        assert_eq!(lookup_status("Atrasado"), Some(MilestoneStatus::Delayed));
        assert_eq!(lookup_status("Pendente"), Some(MilestoneStatus::Planned));
        assert_eq!(lookup_status("cancelled"), Some(MilestoneStatus::Cancelled));
        assert_eq!(lookup_status("???"), None);
    }

    #[test]
    fn period_forms_canonicalize() {
        assert_eq!(normalize_period("Sprint 12"), Some("sprint-12".into()));
        assert_eq!(normalize_period("sprint: Sprint 12"), Some("sprint-12".into()));
        assert_eq!(normalize_period("SPRINT-7"), Some("sprint-7".into()));
        assert_eq!(normalize_period("2024-Q1"), Some("2024-Q1".into()));
        assert_eq!(normalize_period("q1 2024"), Some("2024-Q1".into()));
        assert_eq!(normalize_period("2024-03"), Some("2024-03".into()));
        assert_eq!(normalize_period("03/2024"), Some("2024-03".into()));
        assert_eq!(normalize_period("last week"), None);
    }

    #[test]
    fn absent_markers_recognized() {
        for raw in ["", "  ", "-", "–", "—", "n/a", "N/A"] {
            assert!(is_absent(raw), "{raw:?}");
        }
        assert!(!is_absent("12/05/2024"));
    }

    #[test]
    fn numeric_cleanup_handles_both_conventions() {
        assert_eq!(parse_numeric("€ 1.234,56"), Some(1234.56));
        assert_eq!(parse_numeric("1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric("R$ 500"), Some(500.0));
        assert_eq!(parse_numeric("12,5"), Some(12.5));
        assert_eq!(parse_numeric("1.234"), Some(1234.0));
        assert_eq!(parse_numeric("1.23"), Some(1.23));
        assert_eq!(parse_numeric("42"), Some(42.0));
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric(""), None);
    }
}
