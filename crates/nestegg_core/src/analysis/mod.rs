//! Portfolio and plan analysis
//!
//! - [`drift`]: compare holdings with the target allocation and size the
//!   rebalancing trades
//! - [`scenario`]: what-if comparison of the plan under overridden inputs
//! - [`readiness`]: today's portfolio measured against the retirement plan
//! - [`income`]: holdings income against the target allocation's income
//! - [`model_portfolio`]: tiered allocations sized to a required yield

pub mod drift;
pub mod income;
pub mod model_portfolio;
pub mod readiness;
pub mod scenario;

pub use drift::{DriftPolicy, analyze_drift, recommend_trades};
pub use income::{IncomeComparison, IncomeStatus, income_comparison};
pub use model_portfolio::{
    ModelPortfolio, ModelTier, PlanModelPortfolio, model_portfolio, plan_model_portfolio,
};
pub use readiness::{ReadinessReport, assess_readiness};
pub use scenario::{
    Insight, InsightKind, ScenarioBaseline, ScenarioDiff, ScenarioOutcome, ScenarioOverrides,
    ScenarioPreset, ScenarioResult, YieldSource, analyze_scenario, scenario_presets,
};
