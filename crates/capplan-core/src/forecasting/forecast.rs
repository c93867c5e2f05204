use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CapPlanError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::CapPlanResult;

/// Average Gregorian month length in days, for month-normalized trends.
const DAYS_PER_MONTH: Decimal = dec!(30.4375);

const PERCENT_MAX: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Facility counts by condition band at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionBuckets {
    pub good: u32,
    pub fair: u32,
    pub poor: u32,
    pub critical: u32,
}

/// Deficiency backlog counts at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeficiencyCounts {
    pub open: u32,
    pub critical: u32,
}

/// One append-only portfolio metrics observation. Never mutated after
/// insertion; forecasting reads a window of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub snapshot_date: NaiveDate,
    pub total_replacement_value: Money,
    pub total_repair_cost: Money,
    /// Portfolio facility condition index, percent (lower is better).
    pub portfolio_fci: Percent,
    pub condition_buckets: ConditionBuckets,
    pub deficiency_counts: DeficiencyCounts,
    /// Percent, e.g. 2.5 = 2.5%.
    pub inflation_rate: Percent,
    /// Percent, e.g. 5 = 5%.
    pub discount_rate: Percent,
}

/// Forecast scenario. The multiplier scales cost growth and failure
/// probability uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    BestCase,
    MostLikely,
    WorstCase,
}

impl ScenarioType {
    pub fn multiplier(&self) -> Decimal {
        match self {
            ScenarioType::BestCase => dec!(0.90),
            ScenarioType::MostLikely => Decimal::ONE,
            ScenarioType::WorstCase => dec!(1.20),
        }
    }
}

/// Input for a multi-year forecast run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastInput {
    pub snapshots: Vec<PortfolioSnapshot>,
    pub forecast_years: u32,
    pub scenario: ScenarioType,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One projected year. Rows are append-only per scenario/run; a new run
/// produces fresh rows and never rewrites earlier output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub forecast_year: u32,
    pub scenario: ScenarioType,
    pub predicted_maintenance_cost: Money,
    pub predicted_fci: Percent,
    /// 0–100.
    pub failure_probability: Percent,
    /// failure probability × predicted cost / 1000.
    pub risk_score: Decimal,
    /// 0–100, non-increasing with horizon.
    pub confidence_level: Percent,
}

// ---------------------------------------------------------------------------
// Trend derivation
// ---------------------------------------------------------------------------

/// Annualized portfolio deterioration rate between two snapshots, from the
/// FCI delta normalized by elapsed months. A zero baseline FCI yields a
/// zero trend (division guard). The raw rate is unclamped; callers bound it
/// before compounding.
pub fn annualized_deterioration_rate(
    oldest: &PortfolioSnapshot,
    newest: &PortfolioSnapshot,
) -> CapPlanResult<Rate> {
    let days = (newest.snapshot_date - oldest.snapshot_date).num_days();
    let months = Decimal::from(days) / DAYS_PER_MONTH;
    if months < Decimal::ONE {
        return Err(CapPlanError::InvalidInput {
            field: "snapshots".into(),
            reason: "Historical snapshots must span at least one month".into(),
        });
    }

    if oldest.portfolio_fci.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let change = (newest.portfolio_fci - oldest.portfolio_fci) / oldest.portfolio_fci;
    Ok(change * dec!(12) / months)
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

/// Extrapolate portfolio maintenance cost, condition, and risk over the
/// requested horizon under one scenario.
///
/// Requires at least two historical snapshots — a trend is never fabricated
/// from a single observation.
pub fn generate_forecast(
    input: &ForecastInput,
) -> CapPlanResult<ComputationOutput<Vec<ForecastPoint>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.snapshots.len() < 2 {
        return Err(CapPlanError::InsufficientData(
            "Forecasting requires at least two historical snapshots".into(),
        ));
    }
    if input.forecast_years == 0 {
        return Err(CapPlanError::InvalidInput {
            field: "forecast_years".into(),
            reason: "Forecast horizon must be at least one year".into(),
        });
    }

    let oldest = input
        .snapshots
        .iter()
        .min_by_key(|s| s.snapshot_date)
        .expect("snapshots are non-empty");
    let newest = input
        .snapshots
        .iter()
        .max_by_key(|s| s.snapshot_date)
        .expect("snapshots are non-empty");

    let mut deterioration = annualized_deterioration_rate(oldest, newest)?;
    if deterioration < dec!(-1) {
        warnings.push(format!(
            "Deterioration trend {deterioration} clamped at -100%/year"
        ));
        deterioration = dec!(-1);
    }

    if newest.inflation_rate <= dec!(-100) {
        return Err(CapPlanError::InvalidInput {
            field: "inflation_rate".into(),
            reason: "Inflation rate must be greater than -100%".into(),
        });
    }
    let inflation = newest.inflation_rate / dec!(100);

    let multiplier = input.scenario.multiplier();
    let baseline_cost = newest.total_repair_cost;
    let baseline_fci = newest.portfolio_fci;

    if input.forecast_years > 10 {
        warnings.push("Confidence level reaches its floor of 0 beyond year 10".into());
    }

    let mut points = Vec::with_capacity(input.forecast_years as usize);
    let mut inflation_factor = Decimal::ONE;
    let mut deterioration_factor = Decimal::ONE;

    for year in 1..=input.forecast_years {
        inflation_factor *= Decimal::ONE + inflation;
        deterioration_factor *= Decimal::ONE + deterioration;
        let year_dec = Decimal::from(year);

        let growth = inflation_factor * deterioration_factor * multiplier;
        let predicted_maintenance_cost = baseline_cost * growth;
        let predicted_fci = clamp_percent(baseline_fci * deterioration_factor * multiplier);
        let failure_probability =
            clamp_percent(baseline_fci * (Decimal::ONE + year_dec * dec!(0.1)) * multiplier);
        let risk_score = failure_probability * predicted_maintenance_cost / dec!(1000);
        let confidence_level = clamp_percent(PERCENT_MAX - year_dec * dec!(10));

        points.push(ForecastPoint {
            forecast_year: year,
            scenario: input.scenario,
            predicted_maintenance_cost,
            predicted_fci,
            failure_probability,
            risk_score,
            confidence_level,
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "scenario": input.scenario,
        "scenario_multiplier": multiplier.to_string(),
        "annual_deterioration_rate": deterioration.to_string(),
        "inflation_rate_pct": newest.inflation_rate.to_string(),
        "baseline_repair_cost": baseline_cost.to_string(),
        "baseline_fci_pct": baseline_fci.to_string(),
        "snapshots_used": input.snapshots.len(),
    });

    Ok(with_metadata(
        "Trend-extrapolated portfolio liability forecast",
        &assumptions,
        warnings,
        elapsed,
        points,
    ))
}

fn clamp_percent(value: Decimal) -> Percent {
    if value < Decimal::ZERO {
        Decimal::ZERO
    } else if value > PERCENT_MAX {
        PERCENT_MAX
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
