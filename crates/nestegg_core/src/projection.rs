//! Deterministic year-by-year projection
//!
//! One record per age from the current age through the target age inclusive.
//! Each year:
//!
//! 1. Portfolio income is earned on the starting value and taxed at the
//!    blended rate.
//! 2. Contributions land (recurring while accumulating, plus the optional
//!    one-time amount).
//! 3. In the withdrawal phase, income plus Social Security pays inflated
//!    expenses. A surplus is reinvested up to the cap; a deficit is drawn
//!    from principal, which may go negative.
//! 4. The remaining value grows at the year's rate, except in the final
//!    year which has no following year to grow into.
//!
//! [`simulate`](crate::simulation::simulate) runs the same recurrence with
//! random growth, so a zero-volatility simulation reproduces this projection.

use crate::error::Result;
use crate::model::{
    MarketAssumptions, Milestone, Phase, Projection, ProjectionSummary, ProjectionYear,
    ResolvedAssumptions, RetirementConfig,
};
use crate::snapshot::FinancialSnapshot;

/// Scalar inputs of the yearly recurrence
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlanInputs {
    pub start_value: f64,
    /// Today's annual spending, inflated per year
    pub annual_expenses: f64,
    pub portfolio_yield: f64,
    pub tax_rate: f64,
}

impl PlanInputs {
    pub fn from_snapshot(
        snapshot: &FinancialSnapshot,
        config: &RetirementConfig,
        assumptions: &ResolvedAssumptions,
    ) -> Self {
        Self {
            start_value: snapshot.net_worth(),
            annual_expenses: snapshot.annual_expenses(),
            portfolio_yield: assumptions.portfolio_yield,
            tax_rate: config
                .blended_tax_rate
                .unwrap_or_else(|| snapshot.blended_tax_rate(&config.tax_rates)),
        }
    }
}

fn milestone_at(config: &RetirementConfig, age: u32) -> Option<Milestone> {
    if age == config.current_age {
        Some(Milestone::CurrentAge)
    } else if age == config.withdrawal_start_age {
        Some(Milestone::WithdrawalStarts)
    } else if age == config.social_security_start_age {
        Some(Milestone::SocialSecurityStarts)
    } else if age == config.target_age {
        Some(Milestone::TargetAge)
    } else {
        None
    }
}

/// Advance one year from `start_value`. `growth_rate` is the rate applied
/// at year end; callers pass 0 for the final year.
pub(crate) fn project_year(
    config: &RetirementConfig,
    inputs: &PlanInputs,
    year: u32,
    start_value: f64,
    growth_rate: f64,
) -> ProjectionYear {
    let age = config.current_age + year;
    let accumulating = age < config.withdrawal_start_age;
    let phase = if accumulating {
        Phase::Accumulation
    } else {
        Phase::Withdrawal
    };

    let expenses = config.inflate(inputs.annual_expenses, year);
    // A depleted portfolio earns nothing
    let pretax_income = start_value.max(0.0) * inputs.portfolio_yield;
    let after_tax_income = pretax_income * (1.0 - inputs.tax_rate);
    let social_security_income = if age >= config.social_security_start_age {
        config.social_security_annual()
    } else {
        0.0
    };
    let net_expenses = (expenses - social_security_income).max(0.0);
    let contribution = config.contributions.contribution_at(age, accumulating);

    let mut value = start_value + contribution;
    let mut reinvestment = 0.0;
    let surplus_deficit = if accumulating {
        after_tax_income
    } else {
        let surplus = after_tax_income + social_security_income - expenses;
        if surplus > 0.0 {
            reinvestment = surplus.min(config.contributions.reinvestment_cap);
            value += reinvestment;
            surplus - reinvestment
        } else {
            value += surplus;
            surplus
        }
    };
    value *= 1.0 + growth_rate;

    ProjectionYear {
        year,
        age,
        phase,
        portfolio_value: start_value,
        ending_value: value,
        growth_rate,
        pretax_income,
        after_tax_income,
        social_security_income,
        total_income: after_tax_income + social_security_income,
        expenses,
        net_expenses,
        contribution,
        reinvestment,
        surplus_deficit,
        milestone: milestone_at(config, age),
    }
}

/// Run the recurrence at a constant growth rate
pub(crate) fn project_with(
    config: &RetirementConfig,
    inputs: &PlanInputs,
    assumptions: ResolvedAssumptions,
) -> Projection {
    let horizon = config.horizon_years();
    let mut years = Vec::with_capacity(horizon as usize + 1);
    let mut value = inputs.start_value;
    for year in 0..=horizon {
        let growth = if year < horizon {
            assumptions.growth_rate
        } else {
            0.0
        };
        let record = project_year(config, inputs, year, value, growth);
        value = record.ending_value;
        years.push(record);
    }

    let summary = summarize(inputs.start_value, &years);
    tracing::debug!(
        years = years.len(),
        ending_value = summary.ending_value,
        success = summary.success,
        "projection complete"
    );

    Projection {
        years,
        summary,
        blended_tax_rate: inputs.tax_rate,
        assumptions,
    }
}

fn summarize(starting_value: f64, years: &[ProjectionYear]) -> ProjectionSummary {
    let ending_value = years.last().map_or(starting_value, |y| y.ending_value);
    let peak_value = years
        .iter()
        .map(|y| y.ending_value)
        .fold(starting_value, f64::max);
    let withdrawal_years = || years.iter().filter(|y| y.phase == Phase::Withdrawal);

    ProjectionSummary {
        starting_value,
        ending_value,
        peak_value,
        total_gain: ending_value - starting_value,
        years_in_accumulation: years
            .iter()
            .filter(|y| y.phase == Phase::Accumulation)
            .count() as u32,
        years_in_withdrawal: withdrawal_years().count() as u32,
        total_contributions: years.iter().map(|y| y.contribution).sum(),
        total_reinvestment: years.iter().map(|y| y.reinvestment).sum(),
        total_withdrawal_income: withdrawal_years().map(|y| y.total_income).sum(),
        total_withdrawal_expenses: withdrawal_years().map(|y| y.net_expenses).sum(),
        depleted_at_age: years.iter().find(|y| y.ending_value < 0.0).map(|y| y.age),
        success: ending_value >= 0.0,
    }
}

/// Project the snapshot year by year at the expected growth rate.
///
/// The blended tax rate comes from the config when set, otherwise from the
/// snapshot's account mix. Missing market inputs fall back to defaults and
/// are listed in the projection's assumptions.
pub fn project_years(
    snapshot: &FinancialSnapshot,
    config: &RetirementConfig,
    market: &MarketAssumptions,
) -> Result<Projection> {
    config.validate()?;
    let assumptions = market.resolve()?;
    let inputs = PlanInputs::from_snapshot(snapshot, config, &assumptions);
    Ok(project_with(config, &inputs, assumptions))
}
