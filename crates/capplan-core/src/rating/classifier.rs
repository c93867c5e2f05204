use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Score;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Traffic-light status band derived from a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Green,
    Yellow,
    Orange,
    Red,
}

/// Direction of the scale a score lives on. Inverted scales (e.g. FCI,
/// where lower is better) get a structurally different threshold table;
/// the score itself is never transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    HigherIsBetter,
    LowerIsBetter,
}

/// One letter-grade band. Bands are ordered best-first; adjacent bands may
/// share a boundary — the first containing band wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeBand {
    pub min: Decimal,
    pub max: Decimal,
    pub grade: String,
}

/// One status-zone band, ordered best-first like [`GradeBand`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneBand {
    pub min: Decimal,
    pub max: Decimal,
    pub zone: Zone,
    pub label: String,
    pub description: String,
}

/// The full threshold model for one scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingThresholds {
    pub grades: Vec<GradeBand>,
    pub zones: Vec<ZoneBand>,
}

/// A classified score. Stateless and recomputed on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingOutput {
    pub score: Score,
    pub letter_grade: String,
    pub zone: Zone,
    pub zone_label: String,
    pub zone_description: String,
}

// ---------------------------------------------------------------------------
// Built-in threshold tables
// ---------------------------------------------------------------------------

impl RatingThresholds {
    /// The built-in table for the given scale direction.
    pub fn for_scale(scale: ScaleType) -> Self {
        match scale {
            ScaleType::HigherIsBetter => Self::higher_is_better(),
            ScaleType::LowerIsBetter => Self::lower_is_better(),
        }
    }

    /// Standard 0–100 priority/performance scale.
    fn higher_is_better() -> Self {
        Self {
            grades: vec![
                grade(dec!(90), dec!(100), "A"),
                grade(dec!(80), dec!(90), "B"),
                grade(dec!(70), dec!(80), "C"),
                grade(dec!(60), dec!(70), "D"),
                grade(dec!(0), dec!(60), "F"),
            ],
            zones: vec![
                zone_band(
                    dec!(85),
                    dec!(100),
                    Zone::Green,
                    "Healthy",
                    "Performing well; no intervention needed.",
                ),
                zone_band(
                    dec!(70),
                    dec!(85),
                    Zone::Yellow,
                    "Watch",
                    "Acceptable but trending toward concern; monitor.",
                ),
                zone_band(
                    dec!(55),
                    dec!(70),
                    Zone::Orange,
                    "At Risk",
                    "Below target; plan corrective action.",
                ),
                zone_band(
                    dec!(0),
                    dec!(55),
                    Zone::Red,
                    "Critical",
                    "Far below target; immediate attention required.",
                ),
            ],
        }
    }

    /// Condition-index scale (percent of replacement value in deferred
    /// repairs): low is good, industry FCI bands.
    fn lower_is_better() -> Self {
        Self {
            grades: vec![
                grade(dec!(0), dec!(5), "A"),
                grade(dec!(5), dec!(10), "B"),
                grade(dec!(10), dec!(30), "C"),
                grade(dec!(30), dec!(60), "D"),
                grade(dec!(60), dec!(100), "F"),
            ],
            zones: vec![
                zone_band(
                    dec!(0),
                    dec!(5),
                    Zone::Green,
                    "Good",
                    "Condition is within acceptable limits; routine maintenance only.",
                ),
                zone_band(
                    dec!(5),
                    dec!(10),
                    Zone::Yellow,
                    "Fair",
                    "Deferred repairs accumulating; schedule renewal work.",
                ),
                zone_band(
                    dec!(10),
                    dec!(30),
                    Zone::Orange,
                    "Poor",
                    "Substantial renewal backlog; capital investment needed.",
                ),
                zone_band(
                    dec!(30),
                    dec!(100),
                    Zone::Red,
                    "Critical",
                    "Backlog approaches replacement value; consider replacement.",
                ),
            ],
        }
    }
}

fn grade(min: Decimal, max: Decimal, letter: &str) -> GradeBand {
    GradeBand {
        min,
        max,
        grade: letter.to_string(),
    }
}

fn zone_band(min: Decimal, max: Decimal, zone: Zone, label: &str, description: &str) -> ZoneBand {
    ZoneBand {
        min,
        max,
        zone,
        label: label.to_string(),
        description: description.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Map a score onto a letter grade and status zone.
///
/// Linear scan, first containing band wins. Scores no band contains
/// (out-of-range inputs, gapped custom tables) fall back to the table's
/// worst grade and zone; this function never fails.
pub fn classify_rating(
    score: Score,
    scale: ScaleType,
    thresholds: Option<&RatingThresholds>,
) -> RatingOutput {
    let built_in;
    let table = match thresholds {
        Some(t) => t,
        None => {
            built_in = RatingThresholds::for_scale(scale);
            &built_in
        }
    };

    let letter_grade = table
        .grades
        .iter()
        .find(|b| score >= b.min && score <= b.max)
        .map(|b| b.grade.clone())
        .or_else(|| table.grades.last().map(|b| b.grade.clone()))
        .unwrap_or_else(|| "F".to_string());

    let (zone, zone_label, zone_description) = table
        .zones
        .iter()
        .find(|b| score >= b.min && score <= b.max)
        .or_else(|| table.zones.last())
        .map(|b| (b.zone, b.label.clone(), b.description.clone()))
        .unwrap_or_else(|| {
            (
                Zone::Red,
                "Critical".to_string(),
                "Score outside every configured band.".to_string(),
            )
        });

    RatingOutput {
        score,
        letter_grade,
        zone,
        zone_label,
        zone_description,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
