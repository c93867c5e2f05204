use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use capplan_core::rating::classifier::{classify_rating, RatingThresholds, ScaleType};

use crate::input;

/// Arguments for score classification
#[derive(Args)]
pub struct ClassifyArgs {
    /// Score to classify
    #[arg(long, allow_hyphen_values = true)]
    pub score: Decimal,

    /// Scale direction the score lives on
    #[arg(long, default_value = "higher")]
    pub scale: ScaleArg,

    /// Path to a JSON file with custom grade/zone threshold bands
    #[arg(long)]
    pub input: Option<String>,
}

/// Higher-is-better priority scores, or lower-is-better condition indexes
/// (FCI). Selects the built-in threshold table; the score is never inverted.
#[derive(Debug, Clone, ValueEnum)]
pub enum ScaleArg {
    Higher,
    Lower,
}

impl From<ScaleArg> for ScaleType {
    fn from(arg: ScaleArg) -> Self {
        match arg {
            ScaleArg::Higher => ScaleType::HigherIsBetter,
            ScaleArg::Lower => ScaleType::LowerIsBetter,
        }
    }
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let thresholds: Option<RatingThresholds> = match args.input {
        Some(ref path) => Some(input::file::read_json(path)?),
        None => input::stdin::read_stdin()?
            .map(serde_json::from_value)
            .transpose()?,
    };

    let result = classify_rating(args.score, args.scale.into(), thresholds.as_ref());
    Ok(serde_json::to_value(result)?)
}
