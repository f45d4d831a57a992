//! Integration tests for the projection engine
//!
//! Tests are organized by topic:
//! - `allocation` - Tax-aware allocation and income estimates
//! - `projection` - Deterministic year-by-year projection
//! - `monte_carlo` - Seeded simulation and percentile aggregation
//! - `rebalancing` - Drift scoring, trades and recommendations
//! - `scenarios` - What-if comparison against the baseline
//! - `properties` - Property-based checks across random inputs

mod scenarios;

use crate::model::{
    AllocationTable, AssetCategory, InstrumentQuote, MarketAssumptions, RetirementConfig,
};
use crate::snapshot::{AccountBuilder, FinancialSnapshot, SnapshotBuilder};

/// Two-account household used across topics
pub(crate) fn household() -> FinancialSnapshot {
    SnapshotBuilder::new()
        .account(
            AccountBuilder::taxable("Brokerage")
                .custodian("Schwab")
                .holding_with_yield("SCHD", AssetCategory::DividendGrowth, 10_000.0, 80.0, 0.035)
                .holding_with_yield("JEPI", AssetCategory::HighYield, 5_000.0, 58.0, 0.072)
                .holding("VOO", AssetCategory::Growth, 1_000.0, 500.0),
        )
        .account(
            AccountBuilder::tax_deferred("401(k)")
                .custodian("Fidelity")
                .manual_balance(1_100_000.0)
                .dividend_yield(0.02),
        )
        .expense_category("Housing", 60_000.0)
        .expense_category("Living", 90_000.0)
        .build()
        .expect("household snapshot is valid")
}

/// Market view with every input supplied so no defaults are used
pub(crate) fn full_market() -> MarketAssumptions {
    MarketAssumptions {
        risk_free_rate: Some(0.0425),
        equity_risk_premium: Some(0.02),
        expected_growth_rate: None,
        volatility: Some(0.12),
        portfolio_yield: Some(0.04),
        ..Default::default()
    }
}

/// Quotes for every instrument in the default table at one price, with
/// each category's instruments yielding `yields[category index]`
pub(crate) fn quotes_for(table: &AllocationTable, price: f64, yields: &[f64]) -> Vec<InstrumentQuote> {
    table
        .targets
        .iter()
        .zip(yields)
        .flat_map(|(target, dividend_yield)| {
            target.instruments.iter().map(move |instrument| InstrumentQuote {
                symbol: instrument.symbol.clone(),
                price: Some(price),
                dividend_yield: Some(*dividend_yield),
            })
        })
        .collect()
}

pub(crate) fn config() -> RetirementConfig {
    RetirementConfig {
        social_security_monthly: 3_000.0,
        ..Default::default()
    }
}
