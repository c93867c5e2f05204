use clap::{Args, ValueEnum};
use serde_json::Value;

use capplan_core::forecasting::forecast::{
    generate_forecast, ForecastInput, PortfolioSnapshot, ScenarioType,
};

use crate::input;

/// Arguments for portfolio forecasting
#[derive(Args)]
pub struct ForecastArgs {
    /// Path to a JSON array of historical portfolio snapshots
    #[arg(long)]
    pub input: Option<String>,

    /// Forecast horizon in years
    #[arg(long, default_value = "5")]
    pub years: u32,

    /// Forecast scenario
    #[arg(long, default_value = "most-likely")]
    pub scenario: ScenarioArg,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ScenarioArg {
    BestCase,
    MostLikely,
    WorstCase,
}

impl From<ScenarioArg> for ScenarioType {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::BestCase => ScenarioType::BestCase,
            ScenarioArg::MostLikely => ScenarioType::MostLikely,
            ScenarioArg::WorstCase => ScenarioType::WorstCase,
        }
    }
}

pub fn run_forecast(args: ForecastArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshots: Vec<PortfolioSnapshot> = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <snapshots.json> or stdin required for forecasting".into());
    };

    let forecast_input = ForecastInput {
        snapshots,
        forecast_years: args.years,
        scenario: args.scenario.into(),
    };
    let result = generate_forecast(&forecast_input)?;
    Ok(serde_json::to_value(result)?)
}
