use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CapPlanError;
use crate::scoring::criteria::{Criterion, CriterionScore};
use crate::types::Score;
use crate::CapPlanResult;

/// Fixed composite divisor. The composite score is on a 0–100 scale only
/// when the active weights sum to 100 — callers normalize first.
const COMPOSITE_DIVISOR: Decimal = dec!(100);

const RAW_SCORE_MAX: Decimal = dec!(10);

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Input for a single project's composite score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeScoreInput {
    pub project_id: i64,
    /// The full criteria model; inactive criteria are ignored.
    pub criteria: Vec<Criterion>,
    /// This project's raw criterion scores. Criteria without a row score 0.
    pub scores: Vec<CriterionScore>,
}

/// One criterion's contribution to the composite score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionContribution {
    pub criteria_id: i64,
    pub criteria_name: String,
    /// Raw score, 0–10.
    pub score: Score,
    pub weight: Decimal,
    /// weight × score.
    pub weighted_score: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

/// A project's composite score with its per-criterion breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeScoreOutput {
    pub project_id: i64,
    /// Σ (weight × score) / 100.
    pub composite_score: Score,
    pub criteria_scores: Vec<CriterionContribution>,
    /// Sum of active criterion weights as supplied.
    pub total_weight: Decimal,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Compute the weighted composite score for one project.
///
/// Returns `Ok(None)` when no criteria are active: "no prioritization
/// model" is distinct from a score of zero. A project with no score rows
/// is a valid input and scores 0 on every criterion.
///
/// Pure function of its inputs; never touches the score cache.
pub fn calculate_composite_score(
    input: &CompositeScoreInput,
) -> CapPlanResult<Option<CompositeScoreOutput>> {
    let mut active: Vec<&Criterion> = input.criteria.iter().filter(|c| c.is_active).collect();
    if active.is_empty() {
        return Ok(None);
    }
    active.sort_by_key(|c| c.display_order);

    for c in &active {
        if c.weight < Decimal::ZERO {
            return Err(CapPlanError::InvalidInput {
                field: format!("criteria[{}].weight", c.id),
                reason: "Criterion weights must be non-negative".into(),
            });
        }
    }
    for s in &input.scores {
        if s.score < Decimal::ZERO || s.score > RAW_SCORE_MAX {
            return Err(CapPlanError::InvalidInput {
                field: format!("scores[criteria_id={}]", s.criteria_id),
                reason: "Raw criterion scores must be between 0 and 10".into(),
            });
        }
    }

    let by_criterion: HashMap<i64, &CriterionScore> = input
        .scores
        .iter()
        .filter(|s| s.project_id == input.project_id)
        .map(|s| (s.criteria_id, s))
        .collect();

    let mut criteria_scores = Vec::with_capacity(active.len());
    let mut weighted_sum = Decimal::ZERO;
    let mut total_weight = Decimal::ZERO;

    for criterion in &active {
        let row = by_criterion.get(&criterion.id);
        let raw = row.map(|s| s.score).unwrap_or(Decimal::ZERO);
        let weighted = criterion.weight * raw;

        weighted_sum += weighted;
        total_weight += criterion.weight;

        criteria_scores.push(CriterionContribution {
            criteria_id: criterion.id,
            criteria_name: criterion.name.clone(),
            score: raw,
            weight: criterion.weight,
            weighted_score: weighted,
            justification: row.and_then(|s| s.justification.clone()),
        });
    }

    Ok(Some(CompositeScoreOutput {
        project_id: input.project_id,
        composite_score: weighted_sum / COMPOSITE_DIVISOR,
        criteria_scores,
        total_weight,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
