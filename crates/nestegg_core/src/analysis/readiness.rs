//! Retirement readiness snapshot
//!
//! Measures today's portfolio against the plan: how much yield today's net
//! worth would need to cover inflated expenses, how far the portfolio is from
//! its target and what growth would close the gap.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::RetirementConfig;
use crate::snapshot::FinancialSnapshot;

/// Progress toward the target at which a plan counts as on track
pub const ON_TRACK_PROGRESS: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub current_net_worth: f64,
    pub current_annual_expenses: f64,
    pub current_annual_income: f64,
    pub current_yield: f64,

    pub years_to_withdrawal: u32,
    pub years_before_social_security: u32,
    pub years_with_social_security: u32,
    pub years_in_retirement: u32,

    pub expenses_at_withdrawal: f64,
    pub expenses_at_social_security: f64,
    pub social_security_annual: f64,
    /// Expenses at Social Security start minus the benefit, floored at zero
    pub net_expenses_with_social_security: f64,

    /// Yield on today's net worth that would cover expenses at withdrawal
    pub required_yield_at_withdrawal: f64,
    pub required_yield_at_social_security: f64,
    /// Expenses at withdrawal minus today's portfolio income
    pub income_gap: f64,

    /// Net worth as a percentage of the target value
    pub progress_to_target: f64,
    pub gap_to_target: f64,
    /// Annual growth that compounds today's net worth into the target by the
    /// target age
    pub required_growth_rate: f64,

    pub income_sufficient_before_ss: bool,
    pub income_sufficient_after_ss: bool,
    pub on_track: bool,
}

/// Assess today's snapshot against the retirement plan.
pub fn assess_readiness(
    snapshot: &FinancialSnapshot,
    config: &RetirementConfig,
) -> Result<ReadinessReport> {
    config.validate()?;

    let net_worth = snapshot.net_worth();
    let annual_expenses = snapshot.annual_expenses();
    let annual_income = snapshot.current_annual_income();

    let years_to_withdrawal = config.years_to_withdrawal();
    let years_to_social_security = config.social_security_start_age - config.current_age;
    let expenses_at_withdrawal = config.inflate(annual_expenses, years_to_withdrawal);
    let expenses_at_social_security = config.inflate(annual_expenses, years_to_social_security);
    let social_security_annual = config.social_security_annual();
    let net_expenses_with_social_security =
        (expenses_at_social_security - social_security_annual).max(0.0);

    let share_of_net_worth = |amount: f64| {
        if net_worth > 0.0 {
            amount / net_worth
        } else {
            0.0
        }
    };

    let target = config.target_portfolio_value;
    let progress_to_target = if target > 0.0 {
        net_worth / target * 100.0
    } else {
        0.0
    };
    let years_to_target = config.horizon_years();
    let required_growth_rate = if net_worth > 0.0 && target > 0.0 && years_to_target > 0 {
        (target / net_worth).powf(1.0 / f64::from(years_to_target)) - 1.0
    } else {
        0.0
    };

    Ok(ReadinessReport {
        current_net_worth: net_worth,
        current_annual_expenses: annual_expenses,
        current_annual_income: annual_income,
        current_yield: snapshot.current_yield(),
        years_to_withdrawal,
        years_before_social_security: config.social_security_start_age
            - config.withdrawal_start_age,
        years_with_social_security: config.target_age - config.social_security_start_age,
        years_in_retirement: config.target_age - config.withdrawal_start_age,
        expenses_at_withdrawal,
        expenses_at_social_security,
        social_security_annual,
        net_expenses_with_social_security,
        required_yield_at_withdrawal: share_of_net_worth(expenses_at_withdrawal),
        required_yield_at_social_security: share_of_net_worth(net_expenses_with_social_security),
        income_gap: expenses_at_withdrawal - annual_income,
        progress_to_target,
        gap_to_target: target - net_worth,
        required_growth_rate,
        income_sufficient_before_ss: annual_income >= expenses_at_withdrawal,
        income_sufficient_after_ss: net_expenses_with_social_security <= 0.0
            || annual_income >= net_expenses_with_social_security,
        on_track: progress_to_target >= ON_TRACK_PROGRESS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccountBuilder, SnapshotBuilder};

    #[test]
    fn test_readiness_metrics() {
        let snapshot = SnapshotBuilder::new()
            .account(
                AccountBuilder::taxable("Brokerage")
                    .manual_balance(2_500_000.0)
                    .dividend_yield(0.04),
            )
            .annual_expense_override(221_000.0)
            .build()
            .unwrap();
        let config = RetirementConfig {
            social_security_monthly: 3_000.0,
            ..Default::default()
        };
        let report = assess_readiness(&snapshot, &config).unwrap();

        assert_eq!(report.years_to_withdrawal, 4);
        assert_eq!(report.years_before_social_security, 12);
        assert_eq!(report.years_with_social_security, 23);
        assert_eq!(report.years_in_retirement, 35);
        assert!((report.expenses_at_withdrawal - 248_737.45).abs() < 0.01);
        assert!(
            (report.required_yield_at_withdrawal - report.expenses_at_withdrawal / 2_500_000.0)
                .abs()
                < 1e-12
        );
        assert!((report.current_annual_income - 100_000.0).abs() < 1e-6);
        assert!(!report.income_sufficient_before_ss);
        assert!((report.progress_to_target - 2_500_000.0 / 4_250_000.0 * 100.0).abs() < 1e-9);
        assert!(report.on_track);

        let grown = 2_500_000.0 * (1.0 + report.required_growth_rate).powi(39);
        assert!((grown - 4_250_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_portfolio_is_guarded() {
        let snapshot = SnapshotBuilder::new()
            .annual_expense_override(50_000.0)
            .build()
            .unwrap();
        let report = assess_readiness(&snapshot, &RetirementConfig::default()).unwrap();
        assert_eq!(report.required_yield_at_withdrawal, 0.0);
        assert_eq!(report.required_growth_rate, 0.0);
        assert_eq!(report.progress_to_target, 0.0);
        assert!(!report.on_track);
    }
}
