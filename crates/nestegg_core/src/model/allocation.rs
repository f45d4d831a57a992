//! Target allocation strategy
//!
//! An [`AllocationTable`] is plain configuration: which categories to hold,
//! at what weight, how their income is taxed, and which representative
//! instruments fill each category. The engine never hard-codes a strategy;
//! [`AllocationTable::income_strategy`] is just the shipped default.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::accounts::AssetCategory;
use super::market::REFERENCE_TREASURY_YIELD;
use crate::error::{ConfigurationError, Result};

/// Tolerance for weights summing to 1.0
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// How a category's income is taxed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeTaxTreatment {
    Qualified,
    Ordinary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
    /// Share of the category, instrument weights sum to 1.0
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTarget {
    pub category: AssetCategory,
    pub weight: f64,
    pub tax_treatment: IncomeTaxTreatment,
    /// Expected yield when treasuries sit at the reference level
    pub base_yield: f64,
    /// How strongly the category yield follows treasury moves (1.0 = one for one)
    pub rate_sensitivity: f64,
    pub instruments: Vec<Instrument>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rationale: String,
}

impl CategoryTarget {
    /// Base yield shifted by the treasury move away from the reference level
    pub fn adjusted_yield(&self, risk_free_rate: f64) -> f64 {
        let shift = (risk_free_rate - REFERENCE_TREASURY_YIELD) * self.rate_sensitivity;
        (self.base_yield + shift).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationTable {
    pub targets: Vec<CategoryTarget>,
}

impl Default for AllocationTable {
    fn default() -> Self {
        Self::income_strategy()
    }
}

impl AllocationTable {
    /// Reject tables whose weights do not sum to one. Never normalizes.
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(ConfigurationError::EmptyAllocationTable);
        }

        let mut seen = BTreeSet::new();
        for target in &self.targets {
            if !seen.insert(target.category) {
                return Err(ConfigurationError::DuplicateCategory(target.category));
            }
            if !(target.weight >= 0.0) {
                return Err(ConfigurationError::NegativeWeight {
                    category: target.category,
                    weight: target.weight,
                });
            }
            if !(target.base_yield >= 0.0) {
                return Err(ConfigurationError::NegativeAmount {
                    field: "base_yield",
                    value: target.base_yield,
                });
            }
            if !target.instruments.is_empty() {
                let sum: f64 = target.instruments.iter().map(|i| i.weight).sum();
                let any_negative = target.instruments.iter().any(|i| !(i.weight >= 0.0));
                if any_negative || (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                    return Err(ConfigurationError::InstrumentWeightsDoNotSumToOne {
                        category: target.category,
                        sum,
                    });
                }
            }
        }

        let sum: f64 = self.targets.iter().map(|t| t.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigurationError::WeightsDoNotSumToOne { sum });
        }
        Ok(())
    }

    pub fn get(&self, category: AssetCategory) -> Option<&CategoryTarget> {
        self.targets.iter().find(|t| t.category == category)
    }

    /// Target weight, zero for categories the table does not hold
    pub fn weight_of(&self, category: AssetCategory) -> f64 {
        self.get(category).map_or(0.0, |t| t.weight)
    }

    /// Weighted treasury-adjusted yield of the whole table
    pub fn expected_yield(&self, risk_free_rate: f64) -> f64 {
        self.targets
            .iter()
            .map(|t| t.weight * t.adjusted_yield(risk_free_rate))
            .sum()
    }

    /// Income-focused strategy: dividend growth core, covered-call and REIT
    /// income, inflation-protected treasuries, a cash buffer and a growth sleeve.
    pub fn income_strategy() -> Self {
        use AssetCategory::*;
        use IncomeTaxTreatment::*;

        fn instruments(list: &[(&str, &str, f64)]) -> Vec<Instrument> {
            list.iter()
                .map(|(symbol, name, weight)| Instrument {
                    symbol: (*symbol).to_string(),
                    name: (*name).to_string(),
                    weight: *weight,
                })
                .collect()
        }

        let targets = vec![
            CategoryTarget {
                category: DividendGrowth,
                weight: 0.30,
                tax_treatment: Qualified,
                base_yield: 0.025,
                rate_sensitivity: 0.5,
                instruments: instruments(&[
                    ("VYM", "Vanguard High Dividend Yield ETF", 0.40),
                    ("SCHD", "Schwab US Dividend Equity ETF", 0.40),
                    ("DGRO", "iShares Core Dividend Growth ETF", 0.20),
                ]),
                rationale: "Blue-chip companies with a record of consistent dividend growth"
                    .to_string(),
            },
            CategoryTarget {
                category: HighYield,
                weight: 0.20,
                tax_treatment: Ordinary,
                base_yield: 0.055,
                rate_sensitivity: 1.0,
                instruments: instruments(&[
                    ("JEPI", "JPMorgan Equity Premium Income ETF", 0.50),
                    ("JEPQ", "JPMorgan Nasdaq Equity Premium Income ETF", 0.50),
                ]),
                rationale: "Option-premium income, taxed mostly as ordinary income".to_string(),
            },
            CategoryTarget {
                category: Reit,
                weight: 0.10,
                tax_treatment: Ordinary,
                base_yield: 0.045,
                rate_sensitivity: 0.5,
                instruments: instruments(&[
                    ("VNQ", "Vanguard Real Estate ETF", 0.60),
                    ("SCHH", "Schwab US REIT ETF", 0.40),
                ]),
                rationale: "Diversified real estate exposure for income and inflation protection"
                    .to_string(),
            },
            CategoryTarget {
                category: TreasuryTips,
                weight: 0.15,
                tax_treatment: Ordinary,
                base_yield: 0.040,
                rate_sensitivity: 1.0,
                instruments: instruments(&[
                    ("TIP", "iShares TIPS Bond ETF", 0.50),
                    (
                        "VTIP",
                        "Vanguard Short-Term Inflation-Protected Securities ETF",
                        0.30,
                    ),
                    ("GOVT", "iShares US Treasury Bond ETF", 0.20),
                ]),
                rationale: "Inflation-adjusted government income".to_string(),
            },
            CategoryTarget {
                category: Preferred,
                weight: 0.05,
                tax_treatment: Qualified,
                base_yield: 0.060,
                rate_sensitivity: 1.0,
                instruments: instruments(&[
                    ("PFF", "iShares Preferred and Income Securities ETF", 0.60),
                    ("PFFD", "Global X US Preferred ETF", 0.40),
                ]),
                rationale: "Higher yields than common stock with less volatility".to_string(),
            },
            CategoryTarget {
                category: Cash,
                weight: 0.08,
                tax_treatment: Ordinary,
                base_yield: 0.040,
                rate_sensitivity: 1.0,
                instruments: instruments(&[
                    ("SGOV", "iShares 0-3 Month Treasury Bond ETF", 0.60),
                    ("BIL", "SPDR Bloomberg 1-3 Month T-Bill ETF", 0.40),
                ]),
                rationale: "Expense buffer for drawing through market downturns".to_string(),
            },
            CategoryTarget {
                category: Growth,
                weight: 0.12,
                tax_treatment: Qualified,
                base_yield: 0.010,
                rate_sensitivity: 0.5,
                instruments: instruments(&[
                    ("VOO", "Vanguard S&P 500 ETF", 0.60),
                    ("VTI", "Vanguard Total Stock Market ETF", 0.40),
                ]),
                rationale: "Long-term appreciation, rotated into income assets later".to_string(),
            },
        ];

        Self { targets }
    }
}
