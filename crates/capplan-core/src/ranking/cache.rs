use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::CapPlanError;
use crate::types::{Money, Score};
use crate::CapPlanResult;

/// One complete recalculation pass over all scoreable projects.
pub type RecalculationEpoch = u64;

// ---------------------------------------------------------------------------
// Cache rows
// ---------------------------------------------------------------------------

/// A denormalized, rank-ordered score row. Written only by the ranking
/// coordinator; read paths serve these rows verbatim and never recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedScore {
    pub project_id: i64,
    pub project_name: String,
    pub composite_score: Score,
    /// 1-based position in the descending-score order of its epoch.
    pub rank: u32,
    /// Raw criterion scores keyed by criterion name.
    pub criteria_scores: BTreeMap<String, Score>,
    pub total_weight: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_effectiveness_score: Option<Decimal>,
    pub epoch: RecalculationEpoch,
    pub calculated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Cache abstraction
// ---------------------------------------------------------------------------

/// Keyed store for cached scores. Any backend that can upsert by project id
/// and return rows ordered by rank qualifies; the engine ships an in-memory
/// reference implementation.
///
/// Rows from an epoch become visible to `ranked` only once that epoch is
/// committed, so a reader never sees two recalculation passes mixed in one
/// rank list.
pub trait ScoreCache {
    /// Insert or replace the row for `row.project_id`.
    fn upsert(&mut self, row: CachedScore) -> CapPlanResult<()>;

    /// Fetch one project's row regardless of epoch, if present.
    fn get(&self, project_id: i64) -> CapPlanResult<CachedScore>;

    /// All rows of the latest committed epoch, ordered by ascending rank.
    fn ranked(&self) -> CapPlanResult<Vec<CachedScore>>;

    /// The latest committed epoch, if any pass has completed.
    fn committed_epoch(&self) -> Option<RecalculationEpoch>;

    /// Mark an epoch as complete, exposing its rows to `ranked`.
    fn commit_epoch(&mut self, epoch: RecalculationEpoch) -> CapPlanResult<()>;
}

/// HashMap-backed reference implementation of [`ScoreCache`].
#[derive(Debug, Default)]
pub struct InMemoryScoreCache {
    rows: HashMap<i64, CachedScore>,
    committed: Option<RecalculationEpoch>,
}

impl InMemoryScoreCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreCache for InMemoryScoreCache {
    fn upsert(&mut self, row: CachedScore) -> CapPlanResult<()> {
        self.rows.insert(row.project_id, row);
        Ok(())
    }

    fn get(&self, project_id: i64) -> CapPlanResult<CachedScore> {
        self.rows
            .get(&project_id)
            .cloned()
            .ok_or_else(|| CapPlanError::NotFound(format!("No cached score for project {project_id}")))
    }

    fn ranked(&self) -> CapPlanResult<Vec<CachedScore>> {
        let Some(epoch) = self.committed else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<CachedScore> = self
            .rows
            .values()
            .filter(|r| r.epoch == epoch)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.rank);
        Ok(rows)
    }

    fn committed_epoch(&self) -> Option<RecalculationEpoch> {
        self.committed
    }

    fn commit_epoch(&mut self, epoch: RecalculationEpoch) -> CapPlanResult<()> {
        self.committed = Some(epoch);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
