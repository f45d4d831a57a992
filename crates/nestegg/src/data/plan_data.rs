//! Human-editable plan file
//!
//! The YAML form leaves identifiers out; they are assigned in file order
//! when the plan is converted into a [`FinancialSnapshot`].

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use nestegg_core::model::{
    Account, AccountId, AccountTaxTreatment, AllocationTable, AssetCategory, Expense,
    ExpenseCategory, ExpenseId, ExpenseType, Holding, MarketAssumptions, Recurrence,
    RetirementConfig,
};
use nestegg_core::{ConfigurationError, DEFAULT_TRIALS, DriftPolicy, FinancialSnapshot};

fn default_trials() -> usize {
    DEFAULT_TRIALS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custodian: Option<String>,
    #[serde(default)]
    pub tax_treatment: AccountTaxTreatment,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holdings: Vec<Holding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseData {
    pub category: String,
    pub amount: f64,
    pub date: Date,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub expense_type: ExpenseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
}

/// Everything the engine needs for one household
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanData {
    #[serde(default)]
    pub accounts: Vec<AccountData>,
    #[serde(default)]
    pub expense_categories: Vec<ExpenseCategory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expenses: Vec<ExpenseData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_expense_override: Option<f64>,
    #[serde(default)]
    pub retirement: RetirementConfig,
    #[serde(default)]
    pub market: MarketAssumptions,
    /// Target table, the income strategy when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<AllocationTable>,
    #[serde(default)]
    pub drift_policy: DriftPolicy,
    #[serde(default = "default_trials")]
    pub trials: usize,
}

impl Default for PlanData {
    fn default() -> Self {
        Self {
            accounts: vec![],
            expense_categories: vec![],
            expenses: vec![],
            annual_expense_override: None,
            retirement: RetirementConfig::default(),
            market: MarketAssumptions::default(),
            allocation: None,
            drift_policy: DriftPolicy::default(),
            trials: DEFAULT_TRIALS,
        }
    }
}

impl PlanData {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    /// Save to YAML string
    pub fn to_yaml(&self) -> Result<String, serde_saphyr::ser::Error> {
        serde_saphyr::to_string(self)
    }

    /// Starter plan written by `nestegg init`
    pub fn example() -> Self {
        Self {
            accounts: vec![
                AccountData {
                    name: "Brokerage".to_string(),
                    custodian: Some("Schwab".to_string()),
                    tax_treatment: AccountTaxTreatment::Taxable,
                    holdings: vec![
                        Holding {
                            symbol: "SCHD".to_string(),
                            name: Some("Schwab US Dividend Equity ETF".to_string()),
                            category: AssetCategory::DividendGrowth,
                            quantity: 10_000.0,
                            price: 80.0,
                            dividend_yield: Some(0.035),
                        },
                        Holding {
                            symbol: "JEPI".to_string(),
                            name: None,
                            category: AssetCategory::HighYield,
                            quantity: 5_000.0,
                            price: 58.0,
                            dividend_yield: Some(0.072),
                        },
                    ],
                    manual_balance: None,
                    dividend_yield: None,
                },
                AccountData {
                    name: "401(k)".to_string(),
                    custodian: Some("Fidelity".to_string()),
                    tax_treatment: AccountTaxTreatment::TaxDeferred,
                    holdings: vec![],
                    manual_balance: Some(1_100_000.0),
                    dividend_yield: Some(0.02),
                },
            ],
            expense_categories: vec![
                ExpenseCategory {
                    name: "Housing".to_string(),
                    annual_amount: 60_000.0,
                },
                ExpenseCategory {
                    name: "Living".to_string(),
                    annual_amount: 90_000.0,
                },
            ],
            expenses: vec![ExpenseData {
                category: "Home".to_string(),
                amount: 25_000.0,
                date: jiff::civil::date(2024, 6, 1),
                description: Some("Roof replacement".to_string()),
                expense_type: ExpenseType::Recurring,
                recurrence: Some(Recurrence::MultiYear { interval_years: 20 }),
            }],
            market: MarketAssumptions {
                risk_free_rate: Some(0.0425),
                equity_risk_premium: Some(0.02),
                volatility: Some(0.15),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validate the records and assign identifiers in file order
    pub fn snapshot(&self) -> Result<FinancialSnapshot, ConfigurationError> {
        let accounts = self
            .accounts
            .iter()
            .enumerate()
            .map(|(i, data)| {
                Ok(Account {
                    account_id: AccountId::from_index(i)?,
                    name: data.name.clone(),
                    custodian: data.custodian.clone(),
                    tax_treatment: data.tax_treatment,
                    holdings: data.holdings.clone(),
                    manual_balance: data.manual_balance,
                    dividend_yield: data.dividend_yield,
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;
        let expenses = self
            .expenses
            .iter()
            .enumerate()
            .map(|(i, data)| {
                Ok(Expense {
                    expense_id: ExpenseId::from_index(i)?,
                    category: data.category.clone(),
                    amount: data.amount,
                    date: data.date,
                    description: data.description.clone(),
                    expense_type: data.expense_type,
                    recurrence: data.recurrence,
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        FinancialSnapshot::new(
            accounts,
            self.expense_categories.clone(),
            expenses,
            self.annual_expense_override,
        )
    }

    pub fn allocation_table(&self) -> AllocationTable {
        self.allocation
            .clone()
            .unwrap_or_else(AllocationTable::income_strategy)
    }
}
