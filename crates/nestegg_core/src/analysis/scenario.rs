//! What-if scenario comparison
//!
//! A scenario is the baseline plan with some inputs overridden. Both sides
//! are evaluated by the same code path, so empty overrides reproduce the
//! baseline exactly and every difference is caused by an override.
//!
//! Each side also runs a Monte Carlo simulation with the same fixed seed.
//! Trials draw identical random sequences on both sides, so a change in
//! success rate comes from the overrides (volatility in particular) and not
//! from sampling noise.

use serde::{Deserialize, Serialize};

use crate::error::{Result, check_amount};
use crate::format::{format_currency, format_percent};
use crate::model::{
    AllocationTable, AssumptionWarning, MarketAssumptions, Projection, RetirementConfig,
};
use crate::optimizer::optimize_allocation;
use crate::projection::{PlanInputs, project_with};
use crate::simulation::simulate_with;
use crate::snapshot::FinancialSnapshot;

/// Yield above which an income plan is flagged as stretching for yield
pub const SUSTAINABLE_YIELD: f64 = 0.05;

/// Monte Carlo trials per side of a comparison
pub const SCENARIO_TRIALS: usize = 500;

/// Seed shared by both sides of a comparison
pub const SCENARIO_SEED: u64 = 0x5EED_2024;

/// Optional replacements for baseline inputs. Unset fields keep the baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_yield: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawal_start_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_security_start_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_portfolio_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_expenses: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_security_monthly: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blended_tax_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_contribution: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reinvestment_cap: Option<f64>,
}

impl ScenarioOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply_to_config(&self, config: &RetirementConfig) -> RetirementConfig {
        let mut config = config.clone();
        if let Some(age) = self.current_age {
            config.current_age = age;
        }
        if let Some(age) = self.withdrawal_start_age {
            config.withdrawal_start_age = age;
        }
        if let Some(age) = self.social_security_start_age {
            config.social_security_start_age = age;
        }
        if let Some(age) = self.target_age {
            config.target_age = age;
        }
        if let Some(value) = self.target_portfolio_value {
            config.target_portfolio_value = value;
        }
        if let Some(monthly) = self.social_security_monthly {
            config.social_security_monthly = monthly;
        }
        if let Some(rate) = self.inflation_rate {
            config.inflation_rate = rate;
        }
        if let Some(rate) = self.blended_tax_rate {
            config.blended_tax_rate = Some(rate);
        }
        if let Some(amount) = self.annual_contribution {
            config.contributions.annual_contribution = amount;
        }
        if let Some(cap) = self.reinvestment_cap {
            config.contributions.reinvestment_cap = cap;
        }
        config
    }

    fn apply_to_market(&self, market: &MarketAssumptions) -> MarketAssumptions {
        let mut market = market.clone();
        if let Some(growth) = self.growth_rate {
            market.expected_growth_rate = Some(growth);
        }
        if let Some(volatility) = self.volatility {
            market.volatility = Some(volatility);
        }
        if let Some(portfolio_yield) = self.portfolio_yield {
            market.portfolio_yield = Some(portfolio_yield);
        }
        market
    }
}

/// The unmodified plan a scenario is compared against
#[derive(Debug, Clone, Copy)]
pub struct ScenarioBaseline<'a> {
    pub snapshot: &'a FinancialSnapshot,
    pub config: &'a RetirementConfig,
    pub market: &'a MarketAssumptions,
    /// Source of the portfolio yield when the market view has none
    pub table: &'a AllocationTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YieldSource {
    Override,
    Market,
    /// Blended pre-tax yield of the optimized allocation
    Allocation,
}

/// Evaluation of one side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub config: RetirementConfig,
    pub portfolio_value: f64,
    pub annual_expenses: f64,
    pub portfolio_yield: f64,
    pub yield_source: YieldSource,
    pub growth_rate: f64,
    pub value_at_withdrawal: f64,
    pub final_value: f64,
    pub expenses_at_withdrawal: f64,
    /// After-tax portfolio income in the first withdrawal year
    pub income_at_withdrawal: f64,
    /// Expenses at withdrawal over the portfolio value at withdrawal
    pub required_yield: f64,
    pub income_gap_before_ss: f64,
    pub expenses_at_ss_start: f64,
    pub social_security_annual: f64,
    pub net_expenses_with_ss: f64,
    pub income_at_ss_start: f64,
    pub income_gap_after_ss: f64,
    pub income_sufficient_before_ss: bool,
    pub income_sufficient_after_ss: bool,
    pub target_met: bool,
    /// The portfolio never runs out before the target age
    pub on_track: bool,
    /// Monte Carlo success rate in [0, 100] under the scenario's volatility
    pub success_rate: f64,
    /// 40 for income before SS, 30 for income after SS, 30 for the target
    pub success_score: u32,
    pub projection: Projection,
}

/// Scenario minus baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDiff {
    pub final_value: f64,
    pub income_at_withdrawal: f64,
    pub required_yield: f64,
    pub income_gap_before_ss: f64,
    pub success_score: i32,
    /// Percentage points
    pub success_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightKind {
    IncomeShortfall,
    IncomeCoversExpenses,
    SocialSecurityGap,
    HighRequiredYield,
    PortfolioDepleted,
    TargetMissed,
    BetterThanBaseline,
    WorseThanBaseline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub overrides: ScenarioOverrides,
    pub baseline: ScenarioOutcome,
    pub scenario: ScenarioOutcome,
    pub diff: ScenarioDiff,
    pub insights: Vec<Insight>,
    pub recommendation: String,
    pub warnings: Vec<AssumptionWarning>,
}

/// A canned set of overrides worth comparing against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPreset {
    pub name: String,
    pub description: String,
    pub overrides: ScenarioOverrides,
}

fn success_score(before_ss: bool, after_ss: bool, target_met: bool) -> u32 {
    [(before_ss, 40), (after_ss, 30), (target_met, 30)]
        .into_iter()
        .filter(|(met, _)| *met)
        .map(|(_, points)| points)
        .sum()
}

fn evaluate(baseline: &ScenarioBaseline<'_>, overrides: &ScenarioOverrides) -> Result<ScenarioOutcome> {
    let config = overrides.apply_to_config(baseline.config);
    config.validate()?;
    let market = overrides.apply_to_market(baseline.market);

    let portfolio_value = overrides
        .portfolio_value
        .unwrap_or_else(|| baseline.snapshot.net_worth());
    check_amount("portfolio_value", portfolio_value)?;
    let annual_expenses = overrides
        .annual_expenses
        .unwrap_or_else(|| baseline.snapshot.annual_expenses());
    check_amount("annual_expenses", annual_expenses)?;

    let mut assumptions = market.resolve()?;
    let yield_source = if overrides.portfolio_yield.is_some() {
        YieldSource::Override
    } else if market.portfolio_yield.is_some() {
        YieldSource::Market
    } else {
        let allocation =
            optimize_allocation(portfolio_value, baseline.table, &market, &config.tax_rates)?;
        assumptions.portfolio_yield = allocation.pretax_yield;
        assumptions
            .warnings
            .retain(|w| !matches!(w, AssumptionWarning::DefaultPortfolioYield { .. }));
        assumptions.warnings.extend(allocation.warnings);
        YieldSource::Allocation
    };

    let inputs = PlanInputs {
        start_value: portfolio_value,
        annual_expenses,
        portfolio_yield: assumptions.portfolio_yield,
        tax_rate: config
            .blended_tax_rate
            .unwrap_or_else(|| baseline.snapshot.blended_tax_rate(&config.tax_rates)),
    };
    let portfolio_yield = assumptions.portfolio_yield;
    let growth_rate = assumptions.growth_rate;
    let monte_carlo = simulate_with(
        &config,
        &inputs,
        assumptions.clone(),
        SCENARIO_TRIALS,
        Some(SCENARIO_SEED),
    )?;
    let projection = project_with(&config, &inputs, assumptions);

    let at_withdrawal = projection.at_age(config.withdrawal_start_age);
    let at_ss = projection.at_age(config.social_security_start_age);
    let value_at_withdrawal = at_withdrawal.map_or(0.0, |y| y.portfolio_value);
    let expenses_at_withdrawal = at_withdrawal.map_or(0.0, |y| y.expenses);
    let income_at_withdrawal = at_withdrawal.map_or(0.0, |y| y.after_tax_income);
    let expenses_at_ss_start = at_ss.map_or(0.0, |y| y.expenses);
    let social_security_annual = at_ss.map_or(0.0, |y| y.social_security_income);
    let net_expenses_with_ss = at_ss.map_or(0.0, |y| y.net_expenses);
    let income_at_ss_start = at_ss.map_or(0.0, |y| y.after_tax_income);

    let required_yield = if value_at_withdrawal > 0.0 {
        expenses_at_withdrawal / value_at_withdrawal
    } else {
        0.0
    };
    let income_sufficient_before_ss = income_at_withdrawal >= expenses_at_withdrawal;
    let income_sufficient_after_ss =
        net_expenses_with_ss <= 0.0 || income_at_ss_start >= net_expenses_with_ss;
    let final_value = projection.summary.ending_value;
    let target_met = final_value >= config.target_portfolio_value;

    Ok(ScenarioOutcome {
        portfolio_value,
        annual_expenses,
        portfolio_yield,
        yield_source,
        growth_rate,
        value_at_withdrawal,
        final_value,
        expenses_at_withdrawal,
        income_at_withdrawal,
        required_yield,
        income_gap_before_ss: expenses_at_withdrawal - income_at_withdrawal,
        expenses_at_ss_start,
        social_security_annual,
        net_expenses_with_ss,
        income_at_ss_start,
        income_gap_after_ss: net_expenses_with_ss - income_at_ss_start,
        income_sufficient_before_ss,
        income_sufficient_after_ss,
        target_met,
        on_track: projection.summary.success,
        success_rate: monte_carlo.success_rate,
        success_score: success_score(
            income_sufficient_before_ss,
            income_sufficient_after_ss,
            target_met,
        ),
        config,
        projection,
    })
}

fn insights(scenario: &ScenarioOutcome, diff: &ScenarioDiff) -> Vec<Insight> {
    let mut insights = Vec::new();
    let mut push = |kind, message: String| insights.push(Insight { kind, message });

    if scenario.income_gap_before_ss > 0.0 {
        push(
            InsightKind::IncomeShortfall,
            format!(
                "Income falls {} short of expenses at withdrawal; the gap is drawn from principal",
                format_currency(scenario.income_gap_before_ss)
            ),
        );
    } else {
        push(
            InsightKind::IncomeCoversExpenses,
            format!(
                "Income covers expenses at withdrawal with {} to spare",
                format_currency(-scenario.income_gap_before_ss)
            ),
        );
    }
    if scenario.income_gap_after_ss > 0.0 {
        push(
            InsightKind::SocialSecurityGap,
            format!(
                "Even with Social Security, expenses exceed income by {} at age {}",
                format_currency(scenario.income_gap_after_ss),
                scenario.config.social_security_start_age
            ),
        );
    }
    if scenario.required_yield > SUSTAINABLE_YIELD {
        push(
            InsightKind::HighRequiredYield,
            format!(
                "Covering expenses from income needs a {} yield, above the {} sustainable level",
                format_percent(scenario.required_yield),
                format_percent(SUSTAINABLE_YIELD)
            ),
        );
    }
    if let Some(age) = scenario.projection.summary.depleted_at_age {
        push(
            InsightKind::PortfolioDepleted,
            format!("The portfolio is exhausted at age {age}"),
        );
    } else if !scenario.target_met {
        push(
            InsightKind::TargetMissed,
            format!(
                "Ending value falls {} short of the {} target",
                format_currency(scenario.config.target_portfolio_value - scenario.final_value),
                format_currency(scenario.config.target_portfolio_value)
            ),
        );
    }
    if diff.success_score > 0 {
        push(
            InsightKind::BetterThanBaseline,
            format!(
                "Raises the success score by {} points and the ending value by {}",
                diff.success_score,
                format_currency(diff.final_value)
            ),
        );
    } else if diff.success_score < 0 {
        push(
            InsightKind::WorseThanBaseline,
            format!(
                "Lowers the success score by {} points and changes the ending value by {}",
                -diff.success_score,
                format_currency(diff.final_value)
            ),
        );
    }
    insights
}

fn recommendation(score: u32) -> &'static str {
    match score {
        90.. => "Excellent scenario! All retirement goals are met with this configuration.",
        70..=89 => {
            "Good scenario. Most goals are achievable, but consider increasing income or reducing expenses."
        }
        50..=69 => "Moderate concerns. Significant adjustments needed to meet retirement goals.",
        _ => {
            "High risk scenario. Major changes required to achieve financial security in retirement."
        }
    }
}

/// Compare the baseline plan with the plan under `overrides`.
pub fn analyze_scenario(
    baseline: &ScenarioBaseline<'_>,
    overrides: &ScenarioOverrides,
) -> Result<ScenarioResult> {
    let base = evaluate(baseline, &ScenarioOverrides::default())?;
    let scenario = if overrides.is_empty() {
        base.clone()
    } else {
        evaluate(baseline, overrides)?
    };

    let diff = ScenarioDiff {
        final_value: scenario.final_value - base.final_value,
        income_at_withdrawal: scenario.income_at_withdrawal - base.income_at_withdrawal,
        required_yield: scenario.required_yield - base.required_yield,
        income_gap_before_ss: scenario.income_gap_before_ss - base.income_gap_before_ss,
        success_score: scenario.success_score as i32 - base.success_score as i32,
        success_rate: scenario.success_rate - base.success_rate,
    };
    let insights = insights(&scenario, &diff);
    let warnings = scenario.projection.assumptions.warnings.clone();

    tracing::debug!(
        score = scenario.success_score,
        score_delta = diff.success_score,
        success_rate_delta = diff.success_rate,
        "scenario analyzed"
    );

    Ok(ScenarioResult {
        overrides: overrides.clone(),
        recommendation: recommendation(scenario.success_score).to_string(),
        baseline: base,
        scenario,
        diff,
        insights,
        warnings,
    })
}

/// Six canned scenarios scaled to the given annual spending
pub fn scenario_presets(annual_expenses: f64) -> Vec<ScenarioPreset> {
    let preset = |name: &str, description: &str, overrides| ScenarioPreset {
        name: name.to_string(),
        description: description.to_string(),
        overrides,
    };

    vec![
        preset(
            "Conservative (3% growth, 2.5% yield)",
            "Lower return assumptions for market downturns",
            ScenarioOverrides {
                growth_rate: Some(0.03),
                portfolio_yield: Some(0.025),
                inflation_rate: Some(0.035),
                ..Default::default()
            },
        ),
        preset(
            "Optimistic (8% growth, 4.5% yield)",
            "Higher returns in favorable market conditions",
            ScenarioOverrides {
                growth_rate: Some(0.08),
                portfolio_yield: Some(0.045),
                inflation_rate: Some(0.025),
                ..Default::default()
            },
        ),
        preset(
            "Retire Earlier (Age 53)",
            "Retire 2 years earlier than planned",
            ScenarioOverrides {
                withdrawal_start_age: Some(53),
                ..Default::default()
            },
        ),
        preset(
            "Retire Later (Age 60)",
            "Delay retirement for more growth",
            ScenarioOverrides {
                withdrawal_start_age: Some(60),
                ..Default::default()
            },
        ),
        preset(
            "Higher Expenses (+25%)",
            "Test with 25% higher annual expenses",
            ScenarioOverrides {
                annual_expenses: Some(annual_expenses * 1.25),
                ..Default::default()
            },
        ),
        preset(
            "Lower Expenses (-25%)",
            "Test with 25% lower annual expenses",
            ScenarioOverrides {
                annual_expenses: Some(annual_expenses * 0.75),
                ..Default::default()
            },
        ),
    ]
}
