use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use capplan_core::ranking::cache::InMemoryScoreCache;
use capplan_core::ranking::coordinator::{ProjectRecord, RankingCoordinator};
use capplan_core::scoring::criteria::{self, Criterion, CriterionScore};

use crate::input;

/// Arguments for portfolio ranking
#[derive(Args)]
pub struct RankArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Rescale active criterion weights to sum to exactly 100 before scoring
    #[arg(long)]
    pub normalize_weights: bool,
}

/// A complete ranking universe: projects, the criteria model, and every raw
/// criterion score.
#[derive(Debug, Deserialize)]
struct RankInput {
    projects: Vec<ProjectRecord>,
    criteria: Vec<Criterion>,
    scores: Vec<CriterionScore>,
}

pub fn run_rank(args: RankArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut rank_input: RankInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for ranking".into());
    };

    if args.normalize_weights {
        criteria::normalize_weights(&mut rank_input.criteria)?;
    }

    let mut coordinator = RankingCoordinator::new(InMemoryScoreCache::new());
    let result = coordinator.recalculate_all(
        &rank_input.projects,
        &rank_input.criteria,
        &rank_input.scores,
    )?;
    Ok(serde_json::to_value(result)?)
}
