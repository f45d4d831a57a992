//! Allocation drift and rebalancing trades
//!
//! Compares current category values against an [`AllocationTable`], scores
//! the overall alignment and proposes the trades that would restore target
//! weights.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, check_amount, check_rate};
use crate::format::{format_currency, format_percent};
use crate::model::{
    AllocationTable, AssetCategory, CategoryDrift, DriftResult, DriftStatus, MarketAssumptions,
    RebalancingTrade, TradeAction, TradePriority, TradeRecommendation,
};

/// Absorbs float noise when comparing a deviation to a threshold
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Thresholds for flagging drift and sizing trades. Weights are fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftPolicy {
    /// Deviation at which a category is flagged over- or underweight
    pub drift_threshold: f64,
    /// Trades smaller than this share of the portfolio are suppressed
    pub min_trade_fraction: f64,
    pub high_priority_deviation: f64,
    pub medium_priority_deviation: f64,
    /// Recommend a rebalance when the alignment score falls below this
    pub rebalance_below_score: f64,
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            drift_threshold: 0.05,
            min_trade_fraction: 0.01,
            high_priority_deviation: 0.05,
            medium_priority_deviation: 0.02,
            rebalance_below_score: 85.0,
        }
    }
}

impl DriftPolicy {
    pub fn validate(&self) -> Result<()> {
        check_rate("drift_threshold", self.drift_threshold)?;
        check_rate("min_trade_fraction", self.min_trade_fraction)?;
        check_rate("high_priority_deviation", self.high_priority_deviation)?;
        check_rate("medium_priority_deviation", self.medium_priority_deviation)?;
        check_amount("rebalance_below_score", self.rebalance_below_score)
    }

    fn priority(&self, deviation: f64) -> TradePriority {
        let magnitude = deviation.abs();
        if magnitude > self.high_priority_deviation {
            TradePriority::High
        } else if magnitude > self.medium_priority_deviation {
            TradePriority::Medium
        } else {
            TradePriority::Low
        }
    }
}

/// Measure drift from target and propose rebalancing trades.
///
/// Categories held but absent from the table have a target of zero. An empty
/// or zero-value portfolio reports zero weights and no trades.
pub fn analyze_drift(
    current_by_category: &BTreeMap<AssetCategory, f64>,
    table: &AllocationTable,
    policy: &DriftPolicy,
) -> Result<DriftResult> {
    table.validate()?;
    policy.validate()?;
    for value in current_by_category.values() {
        check_amount("category value", *value)?;
    }

    let total_value: f64 = current_by_category.values().sum();
    let weight_of = |value: f64| {
        if total_value > 0.0 {
            value / total_value
        } else {
            0.0
        }
    };

    let held_off_table = current_by_category
        .keys()
        .copied()
        .filter(|category| table.get(*category).is_none());
    let categories: Vec<CategoryDrift> = table
        .targets
        .iter()
        .map(|t| t.category)
        .chain(held_off_table)
        .map(|category| {
            let current_value = current_by_category.get(&category).copied().unwrap_or(0.0);
            let current_weight = weight_of(current_value);
            let target_weight = table.weight_of(category);
            let deviation = current_weight - target_weight;
            let flagged = deviation.abs() >= policy.drift_threshold - THRESHOLD_EPSILON;
            CategoryDrift {
                category,
                current_value,
                current_weight,
                target_weight,
                target_value: total_value * target_weight,
                deviation,
                overweight: flagged && deviation > 0.0,
                underweight: flagged && deviation < 0.0,
            }
        })
        .collect();

    let total_deviation: f64 = categories.iter().map(|c| c.deviation.abs()).sum();
    let alignment_score = (100.0 - total_deviation * 100.0).max(0.0);

    let min_trade = policy.min_trade_fraction * total_value;
    let mut trades: Vec<RebalancingTrade> = categories
        .iter()
        .filter_map(|drift| {
            let difference = drift.target_value - drift.current_value;
            if total_value <= 0.0 || difference.abs() <= min_trade {
                return None;
            }
            Some(RebalancingTrade {
                category: drift.category,
                action: if difference > 0.0 {
                    TradeAction::Buy
                } else {
                    TradeAction::Sell
                },
                amount: difference.abs(),
                current_value: drift.current_value,
                target_value: drift.target_value,
                deviation: drift.deviation,
                priority: policy.priority(drift.deviation),
            })
        })
        .collect();
    trades.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(b.amount.total_cmp(&a.amount))
    });

    let total_buy: f64 = trades
        .iter()
        .filter(|t| t.action == TradeAction::Buy)
        .map(|t| t.amount)
        .sum();
    let total_sell: f64 = trades
        .iter()
        .filter(|t| t.action == TradeAction::Sell)
        .map(|t| t.amount)
        .sum();
    let trades_to_rebalance = trades
        .iter()
        .filter(|t| t.priority != TradePriority::Low)
        .count();

    tracing::debug!(
        total_value,
        alignment_score,
        trades = trades.len(),
        "drift analyzed"
    );

    Ok(DriftResult {
        total_value,
        categories,
        alignment_score,
        status: DriftStatus::from_score(alignment_score),
        rebalance_recommended: alignment_score < policy.rebalance_below_score,
        trades,
        total_buy,
        total_sell,
        net_flow: total_buy - total_sell,
        trades_to_rebalance,
    })
}

/// Turn High and Medium priority trades into actionable recommendations.
///
/// Buys name the category's instruments and estimate the income they add at
/// the treasury-adjusted category yield.
pub fn recommend_trades(
    drift: &DriftResult,
    table: &AllocationTable,
    market: &MarketAssumptions,
) -> Vec<TradeRecommendation> {
    let (risk_free_rate, _) = market.risk_free_rate_or_default();

    drift
        .trades
        .iter()
        .filter(|trade| trade.priority != TradePriority::Low)
        .map(|trade| {
            let target = table.get(trade.category);
            let (direction, instruments, expected_income_increase) = match trade.action {
                TradeAction::Buy => (
                    "underweight",
                    target.map_or_else(Vec::new, |t| {
                        t.instruments
                            .iter()
                            .map(|i| format!("{} ({})", i.symbol, i.name))
                            .collect()
                    }),
                    target.map_or(0.0, |t| trade.amount * t.adjusted_yield(risk_free_rate)),
                ),
                TradeAction::Sell => ("overweight", Vec::new(), 0.0),
            };
            let share = |value: f64| {
                if drift.total_value > 0.0 {
                    value / drift.total_value
                } else {
                    0.0
                }
            };
            let reason = format!(
                "Portfolio is {direction} in {}. Current: {} ({}), Target: {} ({})",
                trade.category,
                format_currency(trade.current_value),
                format_percent(share(trade.current_value)),
                format_currency(trade.target_value),
                format_percent(share(trade.target_value)),
            );

            TradeRecommendation {
                category: trade.category,
                action: trade.action,
                amount: trade.amount,
                priority: trade.priority,
                reason,
                instruments,
                rationale: target.map(|t| t.rationale.clone()).unwrap_or_default(),
                expected_income_increase,
            }
        })
        .collect()
}
