use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CapPlanError;
use crate::types::{Money, Percent};
use crate::CapPlanResult;

/// Annual benefit assumptions from which an investment's cash-flow series
/// is built. Components may be negative (a measure can increase one cost
/// while reducing another); the series carries the net.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowAssumptions {
    pub annual_energy_savings: Money,
    pub annual_maintenance_savings: Money,
    pub annual_operating_savings: Money,
    pub annual_cost_avoidance: Money,
    /// Annual escalation applied to the combined benefit (percent,
    /// e.g. 2.5 = 2.5%/year). Year 1 is unescalated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_rate: Option<Percent>,
    pub horizon_years: u32,
}

/// Expand benefit assumptions into one net annual inflow per year.
pub fn build_cash_flow_series(assumptions: &CashFlowAssumptions) -> CapPlanResult<Vec<Money>> {
    if assumptions.horizon_years == 0 {
        return Err(CapPlanError::InvalidInput {
            field: "horizon_years".into(),
            reason: "Analysis horizon must be at least one year".into(),
        });
    }

    let escalation = assumptions.escalation_rate.unwrap_or(Decimal::ZERO);
    if escalation <= dec!(-100) {
        return Err(CapPlanError::InvalidInput {
            field: "escalation_rate".into(),
            reason: "Escalation rate must be greater than -100%".into(),
        });
    }

    let base = assumptions.annual_energy_savings
        + assumptions.annual_maintenance_savings
        + assumptions.annual_operating_savings
        + assumptions.annual_cost_avoidance;

    let growth = Decimal::ONE + escalation / dec!(100);
    let mut factor = Decimal::ONE;
    let mut series = Vec::with_capacity(assumptions.horizon_years as usize);
    for _ in 0..assumptions.horizon_years {
        series.push(base * factor);
        factor *= growth;
    }

    Ok(series)
}
