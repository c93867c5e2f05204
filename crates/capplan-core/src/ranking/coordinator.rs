use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use crate::error::CapPlanError;
use crate::ranking::cache::{CachedScore, RecalculationEpoch, ScoreCache};
use crate::scoring::composite::{calculate_composite_score, CompositeScoreInput, CompositeScoreOutput};
use crate::scoring::criteria::{Criterion, CriterionScore, WEIGHT_TOTAL};
use crate::types::{with_metadata, ComputationOutput, Money, Score};
use crate::CapPlanResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// The coordinator's view of a project under consideration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project_id: i64,
    pub project_name: String,
    /// Estimated total project cost, when recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Money>,
}

/// A rank-ordered entry as consumers receive it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedProject {
    pub project_id: i64,
    pub project_name: String,
    pub composite_score: Score,
    pub rank: u32,
    /// Raw criterion scores keyed by criterion name.
    pub criteria_scores: BTreeMap<String, Score>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Money>,
    /// composite × 1000 / total_cost; 0 for zero-cost projects, absent when
    /// no cost is recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_effectiveness_score: Option<Decimal>,
}

/// Outcome of one recalculation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalculationSummary {
    pub epoch: RecalculationEpoch,
    /// Projects scored and cached in this pass.
    pub processed: u32,
    /// Projects skipped after a scoring or cache failure.
    pub failed: u32,
    pub ranked: Vec<RankedProject>,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Sole owner of the score cache. Recalculation is two-phase: every
/// scoreable project is scored and ranked in memory first, then rows are
/// upserted under a fresh epoch and the epoch committed — readers never
/// observe a half-finished pass.
#[derive(Debug)]
pub struct RankingCoordinator<C: ScoreCache> {
    cache: C,
}

impl<C: ScoreCache> RankingCoordinator<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn into_cache(self) -> C {
        self.cache
    }

    /// Score and rank every scoreable project, replacing the cached ranking.
    ///
    /// A project is scoreable when it has at least one raw criterion score;
    /// unscored projects are excluded from the ranking rather than ranked at
    /// zero. Per-project failures are recorded as warnings and skipped — a
    /// single bad record does not abort the pass.
    pub fn recalculate_all(
        &mut self,
        projects: &[ProjectRecord],
        criteria: &[Criterion],
        scores: &[CriterionScore],
    ) -> CapPlanResult<ComputationOutput<RecalculationSummary>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        let active_count = criteria.iter().filter(|c| c.is_active).count();
        if active_count == 0 {
            return Err(CapPlanError::NotFound(
                "No active criteria; cannot rank projects without a prioritization model".into(),
            ));
        }

        let active_weight: Decimal = criteria
            .iter()
            .filter(|c| c.is_active)
            .map(|c| c.weight)
            .sum();
        if active_weight != WEIGHT_TOTAL {
            warnings.push(format!(
                "Active criterion weights sum to {active_weight}, not 100; composite scores are not on a 0–100 scale"
            ));
        }

        let scored_ids: HashSet<i64> = scores.iter().map(|s| s.project_id).collect();
        let excluded = projects
            .iter()
            .filter(|p| !scored_ids.contains(&p.project_id))
            .count();
        if excluded > 0 {
            warnings.push(format!(
                "{excluded} project(s) excluded from ranking: no criterion scores recorded"
            ));
        }

        // Phase 1: score everything in memory.
        let mut failed: u32 = 0;
        let mut scored: Vec<(&ProjectRecord, CompositeScoreOutput)> = Vec::new();
        for project in projects.iter().filter(|p| scored_ids.contains(&p.project_id)) {
            let input = CompositeScoreInput {
                project_id: project.project_id,
                criteria: criteria.to_vec(),
                scores: scores
                    .iter()
                    .filter(|s| s.project_id == project.project_id)
                    .cloned()
                    .collect(),
            };
            match calculate_composite_score(&input) {
                Ok(Some(output)) => scored.push((project, output)),
                Ok(None) => {
                    // Unreachable given the active-criteria check above.
                    failed += 1;
                    warnings.push(format!(
                        "Project {}: no active criteria at scoring time; skipped",
                        project.project_id
                    ));
                }
                Err(e) => {
                    failed += 1;
                    warnings.push(format!("Project {}: {e}; skipped", project.project_id));
                }
            }
        }

        scored.sort_by(|a, b| {
            b.1.composite_score
                .cmp(&a.1.composite_score)
                .then(a.0.project_id.cmp(&b.0.project_id))
        });

        // Phase 2: upsert under the new epoch, then commit.
        let epoch = self.cache.committed_epoch().map_or(1, |e| e + 1);
        let calculated_at = Utc::now();
        let mut processed: u32 = 0;
        let mut ranked: Vec<RankedProject> = Vec::with_capacity(scored.len());

        for (position, (project, output)) in scored.into_iter().enumerate() {
            let rank = (position + 1) as u32;
            let criteria_scores: BTreeMap<String, Score> = output
                .criteria_scores
                .iter()
                .map(|c| (c.criteria_name.clone(), c.score))
                .collect();
            let cost_effectiveness_score = project.total_cost.map(|cost| {
                if cost.is_zero() {
                    Decimal::ZERO
                } else {
                    output.composite_score * dec!(1000) / cost
                }
            });

            let row = CachedScore {
                project_id: project.project_id,
                project_name: project.project_name.clone(),
                composite_score: output.composite_score,
                rank,
                criteria_scores: criteria_scores.clone(),
                total_weight: output.total_weight,
                total_cost: project.total_cost,
                cost_effectiveness_score,
                epoch,
                calculated_at,
            };

            match self.cache.upsert(row) {
                Ok(()) => {
                    processed += 1;
                    ranked.push(RankedProject {
                        project_id: project.project_id,
                        project_name: project.project_name.clone(),
                        composite_score: output.composite_score,
                        rank,
                        criteria_scores,
                        total_cost: project.total_cost,
                        cost_effectiveness_score,
                    });
                }
                Err(e) => {
                    failed += 1;
                    warnings.push(format!(
                        "Project {}: cache upsert failed ({e}); skipped",
                        project.project_id
                    ));
                }
            }
        }

        self.cache.commit_epoch(epoch)?;

        let summary = RecalculationSummary {
            epoch,
            processed,
            failed,
            ranked,
        };

        let elapsed = start.elapsed().as_micros() as u64;
        let assumptions = serde_json::json!({
            "active_criteria": active_count,
            "scoreable_projects": summary.processed + summary.failed,
            "tie_break": "descending composite score, then ascending project id",
            "epoch": epoch,
        });

        Ok(with_metadata(
            "Weighted multi-criteria composite ranking",
            &assumptions,
            warnings,
            elapsed,
            summary,
        ))
    }

    /// The current ranking, served straight from the cache. Never recomputes:
    /// consumers see identical ranks between recalculation passes.
    pub fn ranked_projects(&self) -> CapPlanResult<Vec<RankedProject>> {
        let rows = self.cache.ranked()?;
        Ok(rows
            .into_iter()
            .map(|row| RankedProject {
                project_id: row.project_id,
                project_name: row.project_name,
                composite_score: row.composite_score,
                rank: row.rank,
                criteria_scores: row.criteria_scores,
                total_cost: row.total_cost,
                cost_effectiveness_score: row.cost_effectiveness_score,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::cache::InMemoryScoreCache;
    use rust_decimal_macros::dec;

    fn criterion(id: i64, name: &str, weight: Decimal) -> Criterion {
        Criterion {
            id,
            name: name.to_string(),
            category: None,
            weight,
            is_active: true,
            display_order: id as u32,
        }
    }

    fn score(project_id: i64, criteria_id: i64, raw: Decimal) -> CriterionScore {
        CriterionScore {
            project_id,
            criteria_id,
            score: raw,
            justification: None,
        }
    }

    fn project(id: i64, name: &str) -> ProjectRecord {
        ProjectRecord {
            project_id: id,
            project_name: name.to_string(),
            total_cost: None,
        }
    }

    fn model() -> Vec<Criterion> {
        vec![
            criterion(1, "Urgency", dec!(50)),
            criterion(2, "Safety", dec!(50)),
        ]
    }

    #[test]
    fn test_ranking_descending_with_contiguous_ranks() {
        let mut coordinator = RankingCoordinator::new(InMemoryScoreCache::new());
        let projects = vec![project(1, "Roof"), project(2, "Boiler"), project(3, "HVAC")];
        let scores = vec![
            score(1, 1, dec!(4)),
            score(2, 1, dec!(9)),
            score(3, 1, dec!(6)),
        ];
        let result = coordinator
            .recalculate_all(&projects, &model(), &scores)
            .unwrap();
        let ranked = &result.result.ranked;

        assert_eq!(result.result.processed, 3);
        assert_eq!(result.result.failed, 0);
        let ids: Vec<i64> = ranked.iter().map(|r| r.project_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        let ranks: Vec<u32> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_ties_break_by_ascending_project_id() {
        let mut coordinator = RankingCoordinator::new(InMemoryScoreCache::new());
        let projects = vec![project(30, "C"), project(10, "A"), project(20, "B")];
        let scores = vec![
            score(30, 1, dec!(5)),
            score(10, 1, dec!(5)),
            score(20, 1, dec!(5)),
        ];
        let result = coordinator
            .recalculate_all(&projects, &model(), &scores)
            .unwrap();
        let ids: Vec<i64> = result.result.ranked.iter().map(|r| r.project_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_unscored_projects_excluded_not_zero_ranked() {
        let mut coordinator = RankingCoordinator::new(InMemoryScoreCache::new());
        let projects = vec![project(1, "Scored"), project(2, "Unscored")];
        let scores = vec![score(1, 1, dec!(2))];
        let result = coordinator
            .recalculate_all(&projects, &model(), &scores)
            .unwrap();

        assert_eq!(result.result.ranked.len(), 1);
        assert_eq!(result.result.ranked[0].project_id, 1);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("excluded from ranking")));
    }

    #[test]
    fn test_no_active_criteria_is_not_found() {
        let mut coordinator = RankingCoordinator::new(InMemoryScoreCache::new());
        let mut criteria = model();
        for c in &mut criteria {
            c.is_active = false;
        }
        let projects = vec![project(1, "Roof")];
        let scores = vec![score(1, 1, dec!(2))];
        let err = coordinator
            .recalculate_all(&projects, &criteria, &scores)
            .unwrap_err();
        assert!(matches!(err, CapPlanError::NotFound(_)));
    }

    #[test]
    fn test_bad_project_skipped_not_fatal() {
        let mut coordinator = RankingCoordinator::new(InMemoryScoreCache::new());
        let projects = vec![project(1, "Good"), project(2, "Bad")];
        let scores = vec![score(1, 1, dec!(5)), score(2, 1, dec!(99))];
        let result = coordinator
            .recalculate_all(&projects, &model(), &scores)
            .unwrap();

        assert_eq!(result.result.processed, 1);
        assert_eq!(result.result.failed, 1);
        assert_eq!(result.result.ranked.len(), 1);
        assert_eq!(result.result.ranked[0].project_id, 1);
        assert!(result.warnings.iter().any(|w| w.contains("skipped")));
    }

    #[test]
    fn test_read_path_serves_cache_between_passes() {
        let mut coordinator = RankingCoordinator::new(InMemoryScoreCache::new());
        let projects = vec![project(1, "Roof"), project(2, "Boiler")];
        let scores = vec![score(1, 1, dec!(9)), score(2, 1, dec!(3))];
        coordinator
            .recalculate_all(&projects, &model(), &scores)
            .unwrap();

        let before = coordinator.ranked_projects().unwrap();
        // Source data changes; the cached ranking must not.
        let after = coordinator.ranked_projects().unwrap();
        assert_eq!(before.len(), after.len());
        assert_eq!(before[0].project_id, after[0].project_id);
        assert_eq!(before[0].composite_score, after[0].composite_score);
    }

    #[test]
    fn test_epoch_increments_per_pass() {
        let mut coordinator = RankingCoordinator::new(InMemoryScoreCache::new());
        let projects = vec![project(1, "Roof")];
        let scores = vec![score(1, 1, dec!(5))];

        let first = coordinator
            .recalculate_all(&projects, &model(), &scores)
            .unwrap();
        let second = coordinator
            .recalculate_all(&projects, &model(), &scores)
            .unwrap();
        assert_eq!(first.result.epoch, 1);
        assert_eq!(second.result.epoch, 2);
    }

    #[test]
    fn test_cost_effectiveness_guarded_against_zero_cost() {
        let mut coordinator = RankingCoordinator::new(InMemoryScoreCache::new());
        let projects = vec![
            ProjectRecord {
                project_id: 1,
                project_name: "Costed".into(),
                total_cost: Some(dec!(50000)),
            },
            ProjectRecord {
                project_id: 2,
                project_name: "Free".into(),
                total_cost: Some(dec!(0)),
            },
            project(3, "Uncosted"),
        ];
        let scores = vec![
            score(1, 1, dec!(10)),
            score(2, 1, dec!(10)),
            score(3, 1, dec!(10)),
        ];
        let result = coordinator
            .recalculate_all(&projects, &model(), &scores)
            .unwrap();
        let by_id = |id: i64| {
            result
                .result
                .ranked
                .iter()
                .find(|r| r.project_id == id)
                .unwrap()
                .clone()
        };

        // composite 5.0 → 5 × 1000 / 50000 = 0.1
        assert_eq!(by_id(1).cost_effectiveness_score, Some(dec!(0.1)));
        assert_eq!(by_id(2).cost_effectiveness_score, Some(Decimal::ZERO));
        assert_eq!(by_id(3).cost_effectiveness_score, None);
    }

    #[test]
    fn test_weight_drift_warned() {
        let mut coordinator = RankingCoordinator::new(InMemoryScoreCache::new());
        let criteria = vec![criterion(1, "Urgency", dec!(80))];
        let projects = vec![project(1, "Roof")];
        let scores = vec![score(1, 1, dec!(5))];
        let result = coordinator
            .recalculate_all(&projects, &criteria, &scores)
            .unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("not 100")));
    }
}
