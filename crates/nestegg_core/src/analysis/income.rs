//! Actual income against the target allocation
//!
//! Compares what today's holdings pay with what the same net worth would
//! pay if it were allocated across the target table at current quotes.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{AllocationTable, AssumptionWarning, MarketAssumptions, TaxRates};
use crate::optimizer::optimize_allocation;
use crate::snapshot::FinancialSnapshot;

/// Progress at or above which income is on track
pub const ON_TRACK_PROGRESS: f64 = 90.0;
/// Progress at or above which income is below target but not alarming
pub const BELOW_TARGET_PROGRESS: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeStatus {
    OnTrack,
    BelowTarget,
    NeedsAttention,
}

impl IncomeStatus {
    pub fn from_progress(progress: f64) -> Self {
        if progress >= ON_TRACK_PROGRESS {
            IncomeStatus::OnTrack
        } else if progress >= BELOW_TARGET_PROGRESS {
            IncomeStatus::BelowTarget
        } else {
            IncomeStatus::NeedsAttention
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IncomeStatus::OnTrack => "On Track",
            IncomeStatus::BelowTarget => "Below Target",
            IncomeStatus::NeedsAttention => "Needs Attention",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeComparison {
    pub net_worth: f64,
    pub current_annual_income: f64,
    pub current_after_tax_income: f64,
    pub current_yield: f64,
    /// Income of the target allocation of today's net worth
    pub expected_annual_income: f64,
    pub expected_after_tax_income: f64,
    pub expected_yield: f64,
    pub income_gap: f64,
    pub after_tax_income_gap: f64,
    pub yield_gap: f64,
    /// Current income as a percentage of expected income
    pub progress_to_target: f64,
    /// Single rate applied to both sides so the gap reflects allocation only
    pub tax_rate: f64,
    pub status: IncomeStatus,
    pub warnings: Vec<AssumptionWarning>,
}

/// Compare current holdings income with the target allocation's income.
///
/// Both sides are taxed at the qualified-dividend rate.
pub fn income_comparison(
    snapshot: &FinancialSnapshot,
    table: &AllocationTable,
    market: &MarketAssumptions,
    tax_rates: &TaxRates,
) -> Result<IncomeComparison> {
    let net_worth = snapshot.net_worth();
    let allocation = optimize_allocation(net_worth, table, market, tax_rates)?;

    let tax_rate = tax_rates.qualified_dividend;
    let current_annual_income = snapshot.current_annual_income();
    let current_yield = snapshot.current_yield();
    let expected_annual_income = allocation.annual_income;
    let expected_yield = allocation.pretax_yield;
    let current_after_tax_income = current_annual_income * (1.0 - tax_rate);
    let expected_after_tax_income = expected_annual_income * (1.0 - tax_rate);

    let progress_to_target = if expected_annual_income > 0.0 {
        current_annual_income / expected_annual_income * 100.0
    } else {
        0.0
    };
    let status = IncomeStatus::from_progress(progress_to_target);

    tracing::debug!(
        progress_to_target,
        status = status.label(),
        "income compared"
    );

    Ok(IncomeComparison {
        net_worth,
        current_annual_income,
        current_after_tax_income,
        current_yield,
        expected_annual_income,
        expected_after_tax_income,
        expected_yield,
        income_gap: expected_annual_income - current_annual_income,
        after_tax_income_gap: expected_after_tax_income - current_after_tax_income,
        yield_gap: expected_yield - current_yield,
        progress_to_target,
        tax_rate,
        status,
        warnings: allocation.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SnapshotBuilder;

    #[test]
    fn test_status_thresholds() {
        assert_eq!(IncomeStatus::from_progress(120.0), IncomeStatus::OnTrack);
        assert_eq!(IncomeStatus::from_progress(90.0), IncomeStatus::OnTrack);
        assert_eq!(IncomeStatus::from_progress(89.99), IncomeStatus::BelowTarget);
        assert_eq!(IncomeStatus::from_progress(70.0), IncomeStatus::BelowTarget);
        assert_eq!(IncomeStatus::from_progress(69.99), IncomeStatus::NeedsAttention);
        assert_eq!(IncomeStatus::from_progress(0.0), IncomeStatus::NeedsAttention);
        assert_eq!(IncomeStatus::BelowTarget.label(), "Below Target");
    }

    #[test]
    fn test_empty_portfolio_needs_attention() {
        let snapshot = SnapshotBuilder::new().build().unwrap();
        let comparison = income_comparison(
            &snapshot,
            &AllocationTable::income_strategy(),
            &MarketAssumptions::default(),
            &TaxRates::default(),
        )
        .unwrap();
        assert_eq!(comparison.expected_annual_income, 0.0);
        assert_eq!(comparison.progress_to_target, 0.0);
        assert_eq!(comparison.status, IncomeStatus::NeedsAttention);
    }
}
