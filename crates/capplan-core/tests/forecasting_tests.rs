use capplan_core::forecasting::forecast::{
    generate_forecast, ConditionBuckets, DeficiencyCounts, ForecastInput, PortfolioSnapshot,
    ScenarioType,
};
use capplan_core::rating::classifier::{classify_rating, ScaleType, Zone};
use capplan_core::CapPlanError;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Helpers
// ===========================================================================

fn snapshot(
    date: (i32, u32, u32),
    fci: Decimal,
    repair_cost: Decimal,
    inflation: Decimal,
) -> PortfolioSnapshot {
    PortfolioSnapshot {
        snapshot_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        total_replacement_value: dec!(25000000),
        total_repair_cost: repair_cost,
        portfolio_fci: fci,
        condition_buckets: ConditionBuckets {
            good: 30,
            fair: 12,
            poor: 6,
            critical: 2,
        },
        deficiency_counts: DeficiencyCounts {
            open: 140,
            critical: 11,
        },
        inflation_rate: inflation,
        discount_rate: dec!(5),
    }
}

/// Three years of quarterly-ish observations on a slowly worsening
/// portfolio.
fn deteriorating_history() -> Vec<PortfolioSnapshot> {
    vec![
        snapshot((2022, 6, 1), dec!(8.0), dec!(2000000), dec!(3)),
        snapshot((2023, 6, 1), dec!(9.1), dec!(2300000), dec!(3)),
        snapshot((2024, 6, 1), dec!(10.4), dec!(2650000), dec!(3)),
    ]
}

// ===========================================================================
// Input validation
// ===========================================================================

#[test]
fn test_single_snapshot_rejected_explicitly() {
    let input = ForecastInput {
        snapshots: vec![snapshot((2024, 1, 1), dec!(10), dec!(2000000), dec!(3))],
        forecast_years: 5,
        scenario: ScenarioType::MostLikely,
    };
    let err = generate_forecast(&input).unwrap_err();
    assert!(matches!(err, CapPlanError::InsufficientData(_)));
}

#[test]
fn test_no_snapshots_rejected() {
    let input = ForecastInput {
        snapshots: vec![],
        forecast_years: 5,
        scenario: ScenarioType::MostLikely,
    };
    assert!(generate_forecast(&input).is_err());
}

// ===========================================================================
// Forecast behavior
// ===========================================================================

#[test]
fn test_horizon_produces_one_point_per_year() {
    let input = ForecastInput {
        snapshots: deteriorating_history(),
        forecast_years: 10,
        scenario: ScenarioType::MostLikely,
    };
    let result = generate_forecast(&input).unwrap();
    assert_eq!(result.result.len(), 10);
    for (i, point) in result.result.iter().enumerate() {
        assert_eq!(point.forecast_year, (i + 1) as u32);
        assert_eq!(point.scenario, ScenarioType::MostLikely);
    }
}

#[test]
fn test_deteriorating_portfolio_costs_grow() {
    let input = ForecastInput {
        snapshots: deteriorating_history(),
        forecast_years: 5,
        scenario: ScenarioType::MostLikely,
    };
    let result = generate_forecast(&input).unwrap();
    let points = &result.result;

    // Inflation and deterioration both compound: strictly increasing cost.
    for pair in points.windows(2) {
        assert!(pair[1].predicted_maintenance_cost > pair[0].predicted_maintenance_cost);
    }
    assert!(points[0].predicted_maintenance_cost > dec!(2650000));
}

#[test]
fn test_scenarios_order_costs_and_risk() {
    let history = deteriorating_history();
    let run = |scenario| {
        generate_forecast(&ForecastInput {
            snapshots: history.clone(),
            forecast_years: 5,
            scenario,
        })
        .unwrap()
        .result
    };
    let best = run(ScenarioType::BestCase);
    let likely = run(ScenarioType::MostLikely);
    let worst = run(ScenarioType::WorstCase);

    for year in 0..5 {
        assert!(
            best[year].predicted_maintenance_cost < likely[year].predicted_maintenance_cost
        );
        assert!(
            likely[year].predicted_maintenance_cost < worst[year].predicted_maintenance_cost
        );
        assert!(best[year].risk_score <= likely[year].risk_score);
        assert!(likely[year].risk_score <= worst[year].risk_score);
    }
}

#[test]
fn test_confidence_monotone_and_never_negative() {
    let input = ForecastInput {
        snapshots: deteriorating_history(),
        forecast_years: 14,
        scenario: ScenarioType::WorstCase,
    };
    let result = generate_forecast(&input).unwrap();
    let points = &result.result;

    for pair in points.windows(2) {
        assert!(pair[1].confidence_level <= pair[0].confidence_level);
    }
    for point in points {
        assert!(point.confidence_level >= Decimal::ZERO);
        assert!(point.confidence_level <= dec!(100));
    }
    // Year 10 onward sits on the floor.
    assert_eq!(points[9].confidence_level, Decimal::ZERO);
    assert_eq!(points[13].confidence_level, Decimal::ZERO);
}

#[test]
fn test_failure_probability_bounded() {
    let input = ForecastInput {
        snapshots: vec![
            snapshot((2022, 1, 1), dec!(60), dec!(5000000), dec!(4)),
            snapshot((2024, 1, 1), dec!(85), dec!(8000000), dec!(4)),
        ],
        forecast_years: 8,
        scenario: ScenarioType::WorstCase,
    };
    let result = generate_forecast(&input).unwrap();
    for point in &result.result {
        assert!(point.failure_probability >= Decimal::ZERO);
        assert!(point.failure_probability <= dec!(100));
    }
    assert_eq!(result.result[7].failure_probability, dec!(100));
}

#[test]
fn test_risk_score_couples_probability_and_cost() {
    let input = ForecastInput {
        snapshots: deteriorating_history(),
        forecast_years: 3,
        scenario: ScenarioType::MostLikely,
    };
    let result = generate_forecast(&input).unwrap();
    for point in &result.result {
        assert_eq!(
            point.risk_score,
            point.failure_probability * point.predicted_maintenance_cost / dec!(1000)
        );
    }
}

// ===========================================================================
// Forecast → classification hand-off
// ===========================================================================

#[test]
fn test_predicted_fci_classifies_on_inverted_scale() {
    let input = ForecastInput {
        snapshots: deteriorating_history(),
        forecast_years: 8,
        scenario: ScenarioType::WorstCase,
    };
    let result = generate_forecast(&input).unwrap();

    // Year one is already past the 10% "poor" threshold for this history.
    let first = &result.result[0];
    let rating = classify_rating(first.predicted_fci, ScaleType::LowerIsBetter, None);
    assert_eq!(rating.zone, Zone::Orange);
    assert_eq!(rating.letter_grade, "C");

    // Later years only get worse on an inverted scale.
    let last = &result.result[7];
    assert!(last.predicted_fci >= first.predicted_fci);
}

#[test]
fn test_classifier_total_over_forecast_range() {
    // Whatever the forecast produces, classification must always succeed.
    let input = ForecastInput {
        snapshots: vec![
            snapshot((2020, 1, 1), dec!(2), dec!(400000), dec!(12)),
            snapshot((2024, 1, 1), dec!(55), dec!(9000000), dec!(12)),
        ],
        forecast_years: 12,
        scenario: ScenarioType::WorstCase,
    };
    let result = generate_forecast(&input).unwrap();
    for point in &result.result {
        let rating = classify_rating(point.predicted_fci, ScaleType::LowerIsBetter, None);
        assert!(!rating.letter_grade.is_empty());
    }
}
