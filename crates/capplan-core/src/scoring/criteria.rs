use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CapPlanError;
use crate::types::Score;
use crate::CapPlanResult;

/// Target sum for active criterion weights.
pub const WEIGHT_TOTAL: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A scoring criterion in the prioritization model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Relative importance, 0–100. Active criteria should sum to 100.
    pub weight: Decimal,
    pub is_active: bool,
    pub display_order: u32,
}

/// A single project's raw score against one criterion (0–10 scale).
/// A missing row for a (project, criterion) pair means a score of 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionScore {
    pub project_id: i64,
    pub criteria_id: i64,
    pub score: Score,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

// ---------------------------------------------------------------------------
// Weight normalization
// ---------------------------------------------------------------------------

/// Rescale active criterion weights proportionally so they sum to exactly
/// 100. When every active weight is zero, redistribute equally instead —
/// a zero total would otherwise leave the composite divisor invariant
/// unsatisfiable. Inactive criteria are untouched.
///
/// Returns the new active total (always exactly 100).
pub fn normalize_weights(criteria: &mut [Criterion]) -> CapPlanResult<Decimal> {
    let active: Vec<usize> = criteria
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_active)
        .map(|(i, _)| i)
        .collect();

    if active.is_empty() {
        return Err(CapPlanError::InsufficientData(
            "Weight normalization requires at least one active criterion".into(),
        ));
    }

    for &i in &active {
        if criteria[i].weight < Decimal::ZERO {
            return Err(CapPlanError::InvalidInput {
                field: format!("criteria[{}].weight", criteria[i].id),
                reason: "Criterion weights must be non-negative".into(),
            });
        }
    }

    let total: Decimal = active.iter().map(|&i| criteria[i].weight).sum();

    // The last active criterion absorbs the division remainder so the sum
    // lands on exactly 100.
    let (last, rest) = active.split_last().expect("active set is non-empty");
    let mut assigned = Decimal::ZERO;

    if total.is_zero() {
        let share = WEIGHT_TOTAL / Decimal::from(active.len() as u64);
        for &i in rest {
            criteria[i].weight = share;
            assigned += share;
        }
    } else {
        for &i in rest {
            let scaled = criteria[i].weight * WEIGHT_TOTAL / total;
            criteria[i].weight = scaled;
            assigned += scaled;
        }
    }
    criteria[*last].weight = WEIGHT_TOTAL - assigned;

    Ok(WEIGHT_TOTAL)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn criterion(id: i64, weight: Decimal, is_active: bool) -> Criterion {
        Criterion {
            id,
            name: format!("Criterion {id}"),
            category: None,
            weight,
            is_active,
            display_order: id as u32,
        }
    }

    fn active_total(criteria: &[Criterion]) -> Decimal {
        criteria
            .iter()
            .filter(|c| c.is_active)
            .map(|c| c.weight)
            .sum()
    }

    #[test]
    fn test_proportional_rescale_sums_to_100() {
        let mut criteria = vec![
            criterion(1, dec!(30), true),
            criterion(2, dec!(30), true),
            criterion(3, dec!(30), true),
        ];
        normalize_weights(&mut criteria).unwrap();
        assert_eq!(active_total(&criteria), dec!(100));
    }

    #[test]
    fn test_rescale_preserves_proportions() {
        let mut criteria = vec![criterion(1, dec!(20), true), criterion(2, dec!(60), true)];
        normalize_weights(&mut criteria).unwrap();
        assert_eq!(criteria[0].weight, dec!(25));
        assert_eq!(criteria[1].weight, dec!(75));
    }

    #[test]
    fn test_all_zero_weights_redistributed_equally() {
        let mut criteria = vec![
            criterion(1, dec!(0), true),
            criterion(2, dec!(0), true),
            criterion(3, dec!(0), true),
            criterion(4, dec!(0), true),
        ];
        normalize_weights(&mut criteria).unwrap();
        for c in &criteria {
            assert_eq!(c.weight, dec!(25));
        }
    }

    #[test]
    fn test_all_zero_weights_with_remainder_still_exact() {
        // 100 / 3 does not terminate; the last criterion absorbs the gap.
        let mut criteria = vec![
            criterion(1, dec!(0), true),
            criterion(2, dec!(0), true),
            criterion(3, dec!(0), true),
        ];
        normalize_weights(&mut criteria).unwrap();
        assert_eq!(active_total(&criteria), dec!(100));
    }

    #[test]
    fn test_nonterminating_rescale_still_exact() {
        let mut criteria = vec![
            criterion(1, dec!(1), true),
            criterion(2, dec!(1), true),
            criterion(3, dec!(1), true),
        ];
        normalize_weights(&mut criteria).unwrap();
        assert_eq!(active_total(&criteria), dec!(100));
    }

    #[test]
    fn test_inactive_criteria_untouched() {
        let mut criteria = vec![
            criterion(1, dec!(40), true),
            criterion(2, dec!(40), true),
            criterion(3, dec!(7), false),
        ];
        normalize_weights(&mut criteria).unwrap();
        assert_eq!(criteria[2].weight, dec!(7));
        assert_eq!(active_total(&criteria), dec!(100));
    }

    #[test]
    fn test_no_active_criteria_rejected() {
        let mut criteria = vec![criterion(1, dec!(50), false)];
        assert!(normalize_weights(&mut criteria).is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut criteria = vec![criterion(1, dec!(-5), true), criterion(2, dec!(50), true)];
        assert!(normalize_weights(&mut criteria).is_err());
    }
}
