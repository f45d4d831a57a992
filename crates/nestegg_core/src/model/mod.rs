mod accounts;
mod allocation;
mod config;
mod expenses;
mod ids;
mod market;
mod results;

pub use accounts::{Account, AccountTaxTreatment, AssetCategory, Holding};
pub use allocation::{
    AllocationTable, CategoryTarget, IncomeTaxTreatment, Instrument, WEIGHT_TOLERANCE,
};
pub use config::{ContributionPlan, OneTimeContribution, RetirementConfig, TaxRates};
pub use expenses::{
    Expense, ExpenseCategory, ExpenseOccurrences, ExpenseType, ProjectedExpense, Recurrence,
};
pub use ids::{AccountId, ExpenseId};
pub use market::{
    DEFAULT_GROWTH_RATE, DEFAULT_PORTFOLIO_YIELD, DEFAULT_RISK_FREE_RATE, DEFAULT_VOLATILITY,
    InstrumentQuote, MarketAssumptions, REFERENCE_TREASURY_YIELD, ResolvedAssumptions,
    ReturnDistribution, ReturnSampler,
};
pub use results::{
    AllocationResult, AssumptionWarning, CategoryAllocation, CategoryDrift, DriftResult,
    DriftStatus, FinalValueStats, InstrumentAllocation, Milestone, Phase, PercentileBand,
    Projection, ProjectionSummary, ProjectionYear, RebalancingTrade, SimulationResult,
    TradeAction, TradePriority, TradeRecommendation,
};
