use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::AccountId;

/// Income-strategy asset categories.
///
/// `Unclassified` collects value that is only known as a manual account
/// balance. It has no target weight in the default strategy, so drift
/// analysis treats it as money waiting to be allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetCategory {
    DividendGrowth,
    HighYield,
    Reit,
    TreasuryTips,
    Preferred,
    Cash,
    Growth,
    Unclassified,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 8] = [
        AssetCategory::DividendGrowth,
        AssetCategory::HighYield,
        AssetCategory::Reit,
        AssetCategory::TreasuryTips,
        AssetCategory::Preferred,
        AssetCategory::Cash,
        AssetCategory::Growth,
        AssetCategory::Unclassified,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AssetCategory::DividendGrowth => "Dividend Growth Stocks",
            AssetCategory::HighYield => "High-Yield Income",
            AssetCategory::Reit => "REITs",
            AssetCategory::TreasuryTips => "Treasury/TIPS",
            AssetCategory::Preferred => "Preferred Stock",
            AssetCategory::Cash => "Cash/Money Market",
            AssetCategory::Growth => "Growth Equities",
            AssetCategory::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tax treatment of the account wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AccountTaxTreatment {
    /// 401(k), Traditional IRA
    TaxDeferred,
    Roth,
    #[default]
    Taxable,
    Hsa,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub category: AssetCategory,
    pub quantity: f64,
    pub price: f64,
    /// Annual dividend/interest yield as a fraction. `None` means no income.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
}

impl Holding {
    pub fn value(&self) -> f64 {
        self.quantity * self.price
    }

    pub fn annual_income(&self) -> f64 {
        self.value() * self.dividend_yield.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custodian: Option<String>,
    #[serde(default)]
    pub tax_treatment: AccountTaxTreatment,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holdings: Vec<Holding>,
    /// Balance used when holdings are not tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_balance: Option<f64>,
    /// Yield applied to `manual_balance`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
}

impl Account {
    pub fn tracks_holdings(&self) -> bool {
        !self.holdings.is_empty()
    }

    /// Sum of holding values, or the manual balance when holdings are not tracked
    pub fn balance(&self) -> f64 {
        if self.tracks_holdings() {
            self.holdings.iter().map(Holding::value).sum()
        } else {
            self.manual_balance.unwrap_or(0.0)
        }
    }

    pub fn annual_income(&self) -> f64 {
        if self.tracks_holdings() {
            self.holdings.iter().map(Holding::annual_income).sum()
        } else {
            self.balance() * self.dividend_yield.unwrap_or(0.0)
        }
    }
}
