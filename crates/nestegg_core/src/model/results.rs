use std::fmt;

use serde::{Deserialize, Serialize};

use super::accounts::AssetCategory;
use super::allocation::IncomeTaxTreatment;
use super::market::ResolvedAssumptions;

/// A documented default the engine substituted for missing input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AssumptionWarning {
    DefaultRiskFreeRate { used: f64 },
    DefaultGrowthRate { used: f64 },
    DefaultVolatility { used: f64 },
    DefaultPortfolioYield { used: f64 },
    /// No usable price, the instrument's allocation stays in cash
    MissingInstrumentPrice { symbol: String },
    MissingInstrumentYield { symbol: String, fallback: f64 },
}

impl fmt::Display for AssumptionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssumptionWarning::DefaultRiskFreeRate { used } => {
                write!(f, "no treasury yield supplied, assuming {:.2}%", used * 100.0)
            }
            AssumptionWarning::DefaultGrowthRate { used } => {
                write!(f, "no growth rate supplied, assuming {:.2}%", used * 100.0)
            }
            AssumptionWarning::DefaultVolatility { used } => {
                write!(f, "no volatility supplied, assuming {:.2}%", used * 100.0)
            }
            AssumptionWarning::DefaultPortfolioYield { used } => {
                write!(f, "no portfolio yield supplied, assuming {:.2}%", used * 100.0)
            }
            AssumptionWarning::MissingInstrumentPrice { symbol } => {
                write!(f, "no price for {symbol}, allocation held as cash")
            }
            AssumptionWarning::MissingInstrumentYield { symbol, fallback } => write!(
                f,
                "no yield for {symbol}, using category estimate {:.2}%",
                fallback * 100.0
            ),
        }
    }
}

// ============================================================================
// Allocation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentAllocation {
    pub symbol: String,
    pub name: String,
    pub weight_in_category: f64,
    /// Dollars assigned before rounding to whole shares
    pub allocation_value: f64,
    pub price: Option<f64>,
    /// Whole shares
    pub quantity: f64,
    pub invested_value: f64,
    pub cash_drag: f64,
    pub dividend_yield: f64,
    /// Yield came from the category estimate instead of a quote
    pub yield_estimated: bool,
    pub annual_income: f64,
    pub after_tax_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAllocation {
    pub category: AssetCategory,
    pub weight: f64,
    pub target_value: f64,
    pub tax_treatment: IncomeTaxTreatment,
    pub tax_rate: f64,
    pub invested_value: f64,
    pub cash_drag: f64,
    pub annual_income: f64,
    pub after_tax_income: f64,
    /// Pre-tax income over target value
    pub category_yield: f64,
    pub instruments: Vec<InstrumentAllocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub total_value: f64,
    pub categories: Vec<CategoryAllocation>,
    pub total_invested: f64,
    pub total_cash_drag: f64,
    pub annual_income: f64,
    pub after_tax_income: f64,
    pub pretax_yield: f64,
    pub after_tax_yield: f64,
    pub warnings: Vec<AssumptionWarning>,
}

impl AllocationResult {
    pub fn uses_defaults(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn category(&self, category: AssetCategory) -> Option<&CategoryAllocation> {
        self.categories.iter().find(|c| c.category == category)
    }
}

// ============================================================================
// Projection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Accumulation,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Milestone {
    CurrentAge,
    WithdrawalStarts,
    SocialSecurityStarts,
    TargetAge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: u32,
    pub age: u32,
    pub phase: Phase,
    /// Value at the start of the year
    pub portfolio_value: f64,
    /// Value carried into next year, after flows and growth
    pub ending_value: f64,
    pub growth_rate: f64,
    pub pretax_income: f64,
    pub after_tax_income: f64,
    pub social_security_income: f64,
    /// After-tax portfolio income plus Social Security
    pub total_income: f64,
    pub expenses: f64,
    /// Expenses left after Social Security, floored at zero
    pub net_expenses: f64,
    pub contribution: f64,
    pub reinvestment: f64,
    /// Surplus left after reinvestment, or the deficit drawn from principal
    pub surplus_deficit: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub starting_value: f64,
    pub ending_value: f64,
    pub peak_value: f64,
    pub total_gain: f64,
    pub years_in_accumulation: u32,
    pub years_in_withdrawal: u32,
    pub total_contributions: f64,
    pub total_reinvestment: f64,
    /// After-tax portfolio income plus Social Security over withdrawal years
    pub total_withdrawal_income: f64,
    /// Net expenses over withdrawal years
    pub total_withdrawal_expenses: f64,
    /// First age whose ending value is negative
    pub depleted_at_age: Option<u32>,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub years: Vec<ProjectionYear>,
    pub summary: ProjectionSummary,
    pub blended_tax_rate: f64,
    pub assumptions: ResolvedAssumptions,
}

impl Projection {
    pub fn uses_defaults(&self) -> bool {
        self.assumptions.uses_defaults()
    }

    pub fn at_age(&self, age: u32) -> Option<&ProjectionYear> {
        self.years.iter().find(|y| y.age == age)
    }
}

// ============================================================================
// Monte Carlo
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    pub year: u32,
    pub age: u32,
    pub p10: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p90: f64,
    pub mean: f64,
    /// Fraction of trials whose value is non-negative at the end of this year
    pub survival_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalValueStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub trials: usize,
    /// Master seed, reported so unseeded runs can be replayed
    pub seed: u64,
    /// Percentage in [0, 100] of trials that never went negative
    pub success_rate: f64,
    pub years: Vec<PercentileBand>,
    pub final_values: FinalValueStats,
    pub assumptions: ResolvedAssumptions,
}

impl SimulationResult {
    pub fn uses_defaults(&self) -> bool {
        self.assumptions.uses_defaults()
    }
}

// ============================================================================
// Drift & rebalancing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
}

/// Ordered most urgent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TradePriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriftStatus {
    WellAligned,
    ModerateDrift,
    SignificantDrift,
}

impl DriftStatus {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            DriftStatus::WellAligned
        } else if score >= 70.0 {
            DriftStatus::ModerateDrift
        } else {
            DriftStatus::SignificantDrift
        }
    }
}

impl fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriftStatus::WellAligned => "Well Aligned",
            DriftStatus::ModerateDrift => "Moderate Drift",
            DriftStatus::SignificantDrift => "Significant Drift",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDrift {
    pub category: AssetCategory,
    pub current_value: f64,
    pub current_weight: f64,
    pub target_weight: f64,
    pub target_value: f64,
    /// Current minus target weight
    pub deviation: f64,
    pub overweight: bool,
    pub underweight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancingTrade {
    pub category: AssetCategory,
    pub action: TradeAction,
    pub amount: f64,
    pub current_value: f64,
    pub target_value: f64,
    pub deviation: f64,
    pub priority: TradePriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftResult {
    pub total_value: f64,
    pub categories: Vec<CategoryDrift>,
    /// 0 to 100, higher is closer to target
    pub alignment_score: f64,
    pub status: DriftStatus,
    pub rebalance_recommended: bool,
    pub trades: Vec<RebalancingTrade>,
    pub total_buy: f64,
    pub total_sell: f64,
    /// Buys minus sells. Near zero for a pure rebalance, not enforced.
    pub net_flow: f64,
    /// High and Medium priority trades
    pub trades_to_rebalance: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecommendation {
    pub category: AssetCategory,
    pub action: TradeAction,
    pub amount: f64,
    pub priority: TradePriority,
    pub reason: String,
    /// Representative instruments to buy, empty for sells
    pub instruments: Vec<String>,
    pub rationale: String,
    /// Annual income added by a buy at the category's expected yield
    pub expected_income_increase: f64,
}
