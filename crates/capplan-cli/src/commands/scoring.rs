use clap::Args;
use serde_json::Value;

use capplan_core::scoring::composite::{calculate_composite_score, CompositeScoreInput};

use crate::input;

/// Arguments for composite scoring
#[derive(Args)]
pub struct CompositeScoreArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_composite_score(
    args: CompositeScoreArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let score_input: CompositeScoreInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for composite scoring".into());
    };

    match calculate_composite_score(&score_input)? {
        Some(result) => Ok(serde_json::to_value(result)?),
        None => Err("No active criteria: there is no prioritization model to score against".into()),
    }
}
