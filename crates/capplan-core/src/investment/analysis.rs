use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CapPlanError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate, Years};
use crate::CapPlanResult;

const IRR_CONVERGENCE_TOLERANCE: Decimal = dec!(0.0001);
const MAX_IRR_ITERATIONS: u32 = 100;
const DEFAULT_IRR_GUESS: Decimal = dec!(0.10);

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Input for a single-investment financial analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentAnalysisInput {
    /// Up-front outflow at year 0.
    pub initial_investment: Money,
    /// Net annual inflows, one per year of the analysis horizon.
    pub annual_cash_flows: Vec<Money>,
    /// Discount rate as a percentage (5 = 5%).
    pub discount_rate: Percent,
}

/// Go/no-go classification for an analyzed investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Proceed,
    RequiresReview,
    Defer,
    Reject,
}

/// Complete investment analysis result. Immutable; a new analysis call
/// produces a new, independent result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentAnalysisOutput {
    pub npv: Money,
    /// Internal rate of return as a percentage. Absent when the root-finder
    /// does not converge — a missing IRR is a financial outcome, not a
    /// failure.
    pub irr: Option<Percent>,
    /// (total benefit − total cost) / total cost × 100.
    pub roi: Percent,
    /// Years to recover the initial outlay. Absent means no payback
    /// (annual net cash flow is zero or negative).
    pub payback_period: Option<Years>,
    /// PV of inflows over the initial outlay.
    pub benefit_cost_ratio: Decimal,
    pub recommendation: Recommendation,
}

// ---------------------------------------------------------------------------
// Time-value primitives
// ---------------------------------------------------------------------------

/// Net Present Value of an investment's cash-flow series.
///
/// The first annual flow is one year out: NPV = Σ cf[t] / (1+r)^(t+1) − I,
/// with the rate arriving as a percentage.
pub fn net_present_value(
    initial_investment: Money,
    cash_flows: &[Money],
    discount_rate: Percent,
) -> CapPlanResult<Money> {
    if discount_rate <= dec!(-100) {
        return Err(CapPlanError::InvalidInput {
            field: "discount_rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + discount_rate / dec!(100);
    let mut discount = Decimal::ONE;
    let mut pv = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        discount *= one_plus_r;
        if discount.is_zero() {
            return Err(CapPlanError::DivisionByZero {
                context: format!("NPV discount factor at year {}", t + 1),
            });
        }
        pv += cf / discount;
    }

    Ok(pv - initial_investment)
}

/// Internal Rate of Return via bounded Newton–Raphson.
///
/// `cash_flows[0]` sits at t=0 (the negated investment), subsequent flows
/// one year apart. Converges when |NPV| < 1e-4; a zero derivative, a rate
/// driven to or past -100%, or decimal overflow all yield `None` rather
/// than a bad number. Never exceeds 100 iterations.
pub fn internal_rate_of_return(cash_flows: &[Money], guess: Rate) -> Option<Rate> {
    if cash_flows.len() < 2 {
        return None;
    }

    let mut rate = guess;

    for _ in 0..MAX_IRR_ITERATIONS {
        let one_plus_r = Decimal::ONE + rate;
        if one_plus_r <= Decimal::ZERO {
            return None;
        }

        let mut npv_val = Decimal::ZERO;
        let mut dnpv = Decimal::ZERO;

        for (t, cf) in cash_flows.iter().enumerate() {
            let t_dec = Decimal::from(t as i64);
            let discount = one_plus_r.checked_powd(t_dec)?;
            if discount.is_zero() {
                return None;
            }
            npv_val += cf.checked_div(discount)?;
            if t > 0 {
                let next = one_plus_r.checked_powd(t_dec + Decimal::ONE)?;
                if next.is_zero() {
                    return None;
                }
                dnpv -= t_dec.checked_mul(*cf)?.checked_div(next)?;
            }
        }

        if npv_val.abs() < IRR_CONVERGENCE_TOLERANCE {
            return Some(rate);
        }
        if dnpv.is_zero() {
            return None;
        }

        rate -= npv_val.checked_div(dnpv)?;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Analyze a single investment: NPV, IRR, ROI, payback period,
/// benefit-cost ratio, and a go/no-go recommendation.
pub fn analyze_investment(
    input: &InvestmentAnalysisInput,
) -> CapPlanResult<ComputationOutput<InvestmentAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_cash_flows.is_empty() {
        return Err(CapPlanError::InvalidInput {
            field: "annual_cash_flows".into(),
            reason: "At least one annual cash flow is required".into(),
        });
    }
    if input.initial_investment < Decimal::ZERO {
        return Err(CapPlanError::InvalidInput {
            field: "initial_investment".into(),
            reason: "Initial investment must be non-negative".into(),
        });
    }

    let npv = net_present_value(
        input.initial_investment,
        &input.annual_cash_flows,
        input.discount_rate,
    )?;

    let total_benefit: Money = input.annual_cash_flows.iter().copied().sum();
    let horizon = Decimal::from(input.annual_cash_flows.len() as u64);
    let annual_cash_flow = total_benefit / horizon;

    // Payback: no payback at all when the annual flow never recovers cost.
    let payback_period = if annual_cash_flow <= Decimal::ZERO {
        None
    } else if input.initial_investment.is_zero() {
        Some(Decimal::ZERO)
    } else {
        Some(input.initial_investment / annual_cash_flow)
    };

    let roi = if input.initial_investment.is_zero() {
        Decimal::ZERO
    } else {
        (total_benefit - input.initial_investment) / input.initial_investment * dec!(100)
    };

    let benefit_cost_ratio = if input.initial_investment.is_zero() {
        Decimal::ZERO
    } else {
        (npv + input.initial_investment) / input.initial_investment
    };

    let irr = if annual_cash_flow > Decimal::ZERO {
        let mut flows = Vec::with_capacity(input.annual_cash_flows.len() + 1);
        flows.push(-input.initial_investment);
        flows.extend_from_slice(&input.annual_cash_flows);
        let solved = internal_rate_of_return(&flows, DEFAULT_IRR_GUESS);
        if solved.is_none() {
            warnings.push(format!(
                "IRR did not converge within {MAX_IRR_ITERATIONS} iterations; reported as absent"
            ));
        }
        solved.map(|r| r * dec!(100))
    } else {
        None
    };

    let recommendation = classify_recommendation(npv, roi, payback_period);

    let output = InvestmentAnalysisOutput {
        npv,
        irr,
        roi,
        payback_period,
        benefit_cost_ratio,
        recommendation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "discount_rate_pct": input.discount_rate.to_string(),
        "horizon_years": input.annual_cash_flows.len(),
        "irr_initial_guess": "10%",
        "irr_max_iterations": MAX_IRR_ITERATIONS,
        "recommendation_thresholds": {
            "proceed": "NPV > 0 and ROI > 15 and payback < 5",
            "requires_review": "NPV > 0 and ROI > 5",
            "reject": "NPV < 0 or ROI < 0"
        }
    });

    Ok(with_metadata(
        "Discounted cash flow investment appraisal",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Deterministic thresholds, evaluated strictly in this order.
fn classify_recommendation(npv: Money, roi: Percent, payback: Option<Years>) -> Recommendation {
    let fast_payback = payback.is_some_and(|p| p < dec!(5));
    if npv > Decimal::ZERO && roi > dec!(15) && fast_payback {
        Recommendation::Proceed
    } else if npv > Decimal::ZERO && roi > dec!(5) {
        Recommendation::RequiresReview
    } else if npv < Decimal::ZERO || roi < Decimal::ZERO {
        Recommendation::Reject
    } else {
        Recommendation::Defer
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
