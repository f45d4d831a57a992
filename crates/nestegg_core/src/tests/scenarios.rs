//! Tests for what-if scenario analysis

use super::{config, full_market, household};
use crate::analysis::{
    InsightKind, ScenarioBaseline, ScenarioOverrides, YieldSource, analyze_scenario,
    scenario_presets,
};
use crate::error::ConfigurationError;
use crate::model::{AllocationTable, AssumptionWarning, MarketAssumptions};

#[test]
fn test_empty_overrides_match_baseline() {
    let (snapshot, config, market, table) = (
        household(),
        config(),
        full_market(),
        AllocationTable::income_strategy(),
    );
    let baseline = ScenarioBaseline {
        snapshot: &snapshot,
        config: &config,
        market: &market,
        table: &table,
    };
    let result = analyze_scenario(&baseline, &ScenarioOverrides::default()).unwrap();

    assert_eq!(result.scenario, result.baseline);
    assert_eq!(result.diff.final_value, 0.0);
    assert_eq!(result.diff.success_score, 0);
    assert_eq!(result.diff.success_rate, 0.0);
    assert_eq!(result.baseline.yield_source, YieldSource::Market);
    assert_eq!(result.baseline.portfolio_value, snapshot.net_worth());
    assert_eq!(result.baseline.annual_expenses, 150_000.0);
    assert!(
        result
            .insights
            .iter()
            .all(|i| i.kind != InsightKind::BetterThanBaseline
                && i.kind != InsightKind::WorseThanBaseline)
    );
}

#[test]
fn test_yield_falls_back_to_allocation() {
    let (snapshot, config, table) = (household(), config(), AllocationTable::income_strategy());
    let market = MarketAssumptions {
        portfolio_yield: None,
        ..full_market()
    };
    let baseline = ScenarioBaseline {
        snapshot: &snapshot,
        config: &config,
        market: &market,
        table: &table,
    };
    let result = analyze_scenario(&baseline, &ScenarioOverrides::default()).unwrap();

    assert_eq!(result.baseline.yield_source, YieldSource::Allocation);
    let expected = table.expected_yield(0.0425);
    assert!((result.baseline.portfolio_yield - expected).abs() < 1e-12);
    assert!(
        !result
            .warnings
            .iter()
            .any(|w| matches!(w, AssumptionWarning::DefaultPortfolioYield { .. }))
    );
}

#[test]
fn test_yield_override_takes_precedence() {
    let (snapshot, config, market, table) = (
        household(),
        config(),
        full_market(),
        AllocationTable::income_strategy(),
    );
    let baseline = ScenarioBaseline {
        snapshot: &snapshot,
        config: &config,
        market: &market,
        table: &table,
    };
    let overrides = ScenarioOverrides {
        portfolio_yield: Some(0.06),
        ..Default::default()
    };
    let result = analyze_scenario(&baseline, &overrides).unwrap();

    assert_eq!(result.scenario.yield_source, YieldSource::Override);
    assert_eq!(result.scenario.portfolio_yield, 0.06);
    assert!(result.diff.income_at_withdrawal > 0.0);
}

#[test]
fn test_retiring_later_grows_value_at_withdrawal() {
    let (snapshot, config, market, table) = (
        household(),
        config(),
        full_market(),
        AllocationTable::income_strategy(),
    );
    let baseline = ScenarioBaseline {
        snapshot: &snapshot,
        config: &config,
        market: &market,
        table: &table,
    };
    let retire_later = scenario_presets(snapshot.annual_expenses())
        .into_iter()
        .find(|p| p.name.starts_with("Retire Later"))
        .unwrap();
    let result = analyze_scenario(&baseline, &retire_later.overrides).unwrap();

    assert_eq!(result.scenario.config.withdrawal_start_age, 60);
    assert!(result.scenario.value_at_withdrawal > result.baseline.value_at_withdrawal);
    assert!(result.scenario.expenses_at_withdrawal > result.baseline.expenses_at_withdrawal);
}

#[test]
fn test_higher_expenses_never_help() {
    let (snapshot, config, market, table) = (
        household(),
        config(),
        full_market(),
        AllocationTable::income_strategy(),
    );
    let baseline = ScenarioBaseline {
        snapshot: &snapshot,
        config: &config,
        market: &market,
        table: &table,
    };
    let higher = &scenario_presets(snapshot.annual_expenses())[4];
    let result = analyze_scenario(&baseline, &higher.overrides).unwrap();

    assert_eq!(result.scenario.annual_expenses, 187_500.0);
    assert!(result.diff.final_value <= 0.0);
    assert!(result.diff.income_gap_before_ss >= 0.0);
    assert!(result.diff.success_score <= 0);
    assert!(result.scenario.required_yield > result.baseline.required_yield);
}

#[test]
fn test_score_matches_flags() {
    let (snapshot, config, market, table) = (
        household(),
        config(),
        full_market(),
        AllocationTable::income_strategy(),
    );
    let baseline = ScenarioBaseline {
        snapshot: &snapshot,
        config: &config,
        market: &market,
        table: &table,
    };
    let overrides = ScenarioOverrides {
        annual_expenses: Some(10_000.0),
        target_portfolio_value: Some(0.0),
        ..Default::default()
    };
    let result = analyze_scenario(&baseline, &overrides).unwrap();

    assert!(result.scenario.income_sufficient_before_ss);
    assert!(result.scenario.income_sufficient_after_ss);
    assert!(result.scenario.target_met);
    assert_eq!(result.scenario.success_score, 100);
    assert!(result.recommendation.starts_with("Excellent"));
    assert!(
        result
            .insights
            .iter()
            .any(|i| i.kind == InsightKind::IncomeCoversExpenses)
    );
}

#[test]
fn test_invalid_override_ages_rejected() {
    let (snapshot, config, market, table) = (
        household(),
        config(),
        full_market(),
        AllocationTable::income_strategy(),
    );
    let baseline = ScenarioBaseline {
        snapshot: &snapshot,
        config: &config,
        market: &market,
        table: &table,
    };
    let overrides = ScenarioOverrides {
        withdrawal_start_age: Some(70),
        ..Default::default()
    };
    assert!(matches!(
        analyze_scenario(&baseline, &overrides),
        Err(ConfigurationError::InvalidAges { .. })
    ));
}

#[test]
fn test_volatility_moves_success_rate_only() {
    let (snapshot, config, market, table) = (
        household(),
        config(),
        full_market(),
        AllocationTable::income_strategy(),
    );
    let baseline = ScenarioBaseline {
        snapshot: &snapshot,
        config: &config,
        market: &market,
        table: &table,
    };
    let calm = analyze_scenario(
        &baseline,
        &ScenarioOverrides {
            annual_expenses: Some(10_000.0),
            volatility: Some(0.0),
            ..Default::default()
        },
    )
    .unwrap();
    let wild = analyze_scenario(
        &baseline,
        &ScenarioOverrides {
            annual_expenses: Some(10_000.0),
            volatility: Some(0.6),
            ..Default::default()
        },
    )
    .unwrap();

    // The deterministic projection ignores volatility
    assert_eq!(calm.scenario.final_value, wild.scenario.final_value);
    assert_eq!(calm.scenario.success_score, wild.scenario.success_score);

    assert_eq!(calm.scenario.success_rate, 100.0);
    assert!(wild.scenario.success_rate < calm.scenario.success_rate);
    assert_eq!(
        wild.diff.success_rate,
        wild.scenario.success_rate - wild.baseline.success_rate
    );
    assert_eq!(calm.baseline.success_rate, wild.baseline.success_rate);
}
