//! Retirement and portfolio projection engine
//!
//! This crate turns a snapshot of accounts, holdings and expenses into
//! retirement projections. It supports:
//! - Tax-aware allocation of a portfolio across an income-focused target table
//! - Deterministic year-by-year projections through accumulation and withdrawal
//! - Monte Carlo simulation with seeded, reproducible trials
//! - Allocation drift scoring and rebalancing trades
//! - What-if scenario comparison and retirement readiness metrics
//! - Income comparison against the target allocation and tiered model portfolios
//!
//! All operations are pure functions over immutable inputs. Market data is
//! supplied by the caller; missing values fall back to documented defaults
//! that are reported alongside the results.
//!
//! # Example
//!
//! ```ignore
//! use nestegg_core::{AccountBuilder, SnapshotBuilder, project_years, simulate};
//! use nestegg_core::model::{AssetCategory, MarketAssumptions, RetirementConfig};
//!
//! let snapshot = SnapshotBuilder::new()
//!     .account(AccountBuilder::taxable("Brokerage").manual_balance(2_000_000.0))
//!     .annual_expense_override(150_000.0)
//!     .build()?;
//! let config = RetirementConfig::default();
//! let market = MarketAssumptions::default();
//!
//! let projection = project_years(&snapshot, &config, &market)?;
//! let monte_carlo = simulate(&snapshot, &config, &market, 1_000, Some(42))?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod error;
pub mod format;
pub mod optimizer;
pub mod percentiles;
pub mod projection;
pub mod simulation;
pub mod snapshot;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use analysis::{
    DriftPolicy, IncomeComparison, IncomeStatus, ModelPortfolio, ModelTier, PlanModelPortfolio,
    ReadinessReport, ScenarioBaseline, ScenarioOverrides, ScenarioPreset, ScenarioResult,
    analyze_drift, analyze_scenario, assess_readiness, income_comparison, model_portfolio,
    plan_model_portfolio, recommend_trades, scenario_presets,
};
pub use error::ConfigurationError;
pub use optimizer::{expected_table_yield, optimize_allocation};
pub use projection::project_years;
pub use simulation::{DEFAULT_TRIALS, simulate};
pub use snapshot::{AccountBuilder, FinancialSnapshot, SnapshotBuilder};
