use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use capplan_core::investment::analysis::{analyze_investment, InvestmentAnalysisInput};
use capplan_core::investment::cash_flow::{build_cash_flow_series, CashFlowAssumptions};

use crate::input;

/// Arguments for single-investment analysis. The cash-flow series comes from
/// a JSON file, piped stdin, an explicit --cash-flow list, or the annual
/// benefit flags expanded over --horizon.
#[derive(Args)]
pub struct InvestmentArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Up-front outflow at year 0
    #[arg(long)]
    pub investment: Option<Decimal>,

    /// Comma-separated net annual inflows (e.g. "25000,25000,26000")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flow: Option<Vec<Decimal>>,

    /// Discount rate as a percentage (5 = 5%)
    #[arg(long, default_value = "5")]
    pub discount_rate: Decimal,

    /// Annual energy savings
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub energy_savings: Decimal,

    /// Annual maintenance savings
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub maintenance_savings: Decimal,

    /// Annual operating savings
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub operating_savings: Decimal,

    /// Annual cost avoidance
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub cost_avoidance: Decimal,

    /// Annual escalation on the combined benefit, percent (year 1 unescalated)
    #[arg(long, allow_hyphen_values = true)]
    pub escalation_rate: Option<Decimal>,

    /// Analysis horizon in years when building the series from benefit flags
    #[arg(long)]
    pub horizon: Option<u32>,
}

pub fn run_investment(args: InvestmentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input: InvestmentAnalysisInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else if let Some(investment) = args.investment {
        let annual_cash_flows = match (args.cash_flow, args.horizon) {
            (Some(flows), _) => flows,
            (None, Some(horizon)) => build_cash_flow_series(&CashFlowAssumptions {
                annual_energy_savings: args.energy_savings,
                annual_maintenance_savings: args.maintenance_savings,
                annual_operating_savings: args.operating_savings,
                annual_cost_avoidance: args.cost_avoidance,
                escalation_rate: args.escalation_rate,
                horizon_years: horizon,
            })?,
            (None, None) => {
                return Err(
                    "--cash-flow <a,b,...> or benefit flags with --horizon <years> required".into(),
                )
            }
        };
        InvestmentAnalysisInput {
            initial_investment: investment,
            annual_cash_flows,
            discount_rate: args.discount_rate,
        }
    } else {
        return Err(
            "--input <file.json>, stdin, or --investment with a cash-flow series required".into(),
        );
    };

    let result = analyze_investment(&analysis_input)?;
    Ok(serde_json::to_value(result)?)
}
