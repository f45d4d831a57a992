//! Financial snapshot and its builder
//!
//! A [`FinancialSnapshot`] is the read-only view of accounts, holdings and
//! expenses that every engine operation consumes. It is validated once when
//! built, so downstream code can rely on non-negative amounts.
//!
//! # Example
//!
//! ```ignore
//! use nestegg_core::{AccountBuilder, SnapshotBuilder};
//! use nestegg_core::model::AssetCategory;
//!
//! let snapshot = SnapshotBuilder::new()
//!     .account(
//!         AccountBuilder::taxable("Brokerage")
//!             .custodian("Schwab")
//!             .holding_with_yield("SCHD", AssetCategory::DividendGrowth, 1_000.0, 80.0, 0.035),
//!     )
//!     .account(AccountBuilder::tax_deferred("401(k)").manual_balance(650_000.0))
//!     .expense_category("Housing", 48_000.0)
//!     .expense_category("Travel", 20_000.0)
//!     .build()?;
//! ```

use std::collections::BTreeMap;

use jiff::civil::Date;
use serde::Serialize;

use crate::error::{ConfigurationError, Result, check_amount, check_rate};
use crate::model::{
    Account, AccountId, AccountTaxTreatment, AssetCategory, Expense, ExpenseCategory, ExpenseId,
    ExpenseType, Holding, ProjectedExpense, Recurrence, TaxRates,
};

/// Validated accounts, holdings and expenses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    accounts: Vec<Account>,
    expense_categories: Vec<ExpenseCategory>,
    expenses: Vec<Expense>,
    annual_expense_override: Option<f64>,
}

impl FinancialSnapshot {
    /// Validate raw records into a snapshot
    pub fn new(
        accounts: Vec<Account>,
        expense_categories: Vec<ExpenseCategory>,
        expenses: Vec<Expense>,
        annual_expense_override: Option<f64>,
    ) -> Result<Self> {
        for account in &accounts {
            validate_account(account)?;
        }
        for category in &expense_categories {
            check_amount("expense category amount", category.annual_amount)?;
        }
        for expense in &expenses {
            check_amount("expense amount", expense.amount)?;
            if let Some(Recurrence::MultiYear { interval_years: 0 }) = expense.recurrence {
                return Err(ConfigurationError::InvalidRecurrenceInterval);
            }
        }
        if let Some(amount) = annual_expense_override {
            check_amount("annual_expense_override", amount)?;
        }

        Ok(Self {
            accounts,
            expense_categories,
            expenses,
            annual_expense_override,
        })
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn expense_categories(&self) -> &[ExpenseCategory] {
        &self.expense_categories
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn net_worth(&self) -> f64 {
        self.accounts.iter().map(Account::balance).sum()
    }

    /// Current value per category. Manual-balance accounts count as
    /// `Unclassified`. Values sum to [`net_worth`](Self::net_worth).
    pub fn holdings_by_category(&self) -> BTreeMap<AssetCategory, f64> {
        let mut by_category = BTreeMap::new();
        for account in &self.accounts {
            if account.tracks_holdings() {
                for holding in &account.holdings {
                    *by_category.entry(holding.category).or_insert(0.0) += holding.value();
                }
            } else if account.balance() > 0.0 {
                *by_category
                    .entry(AssetCategory::Unclassified)
                    .or_insert(0.0) += account.balance();
            }
        }
        by_category
    }

    /// Sum of the category budget
    pub fn budgeted_annual_expenses(&self) -> f64 {
        self.expense_categories.iter().map(|c| c.annual_amount).sum()
    }

    /// Annualized cost of every recurring ledger entry
    pub fn recurring_annual_expenses(&self) -> f64 {
        self.expenses.iter().map(Expense::annualized_amount).sum()
    }

    /// Baseline annual spending: the override if set, else the category
    /// budget when any category has an amount, else the recurring ledger.
    pub fn annual_expenses(&self) -> f64 {
        if let Some(amount) = self.annual_expense_override {
            return amount;
        }
        let budgeted = self.budgeted_annual_expenses();
        if budgeted > 0.0 {
            budgeted
        } else {
            self.recurring_annual_expenses()
        }
    }

    pub fn current_annual_income(&self) -> f64 {
        self.accounts.iter().map(Account::annual_income).sum()
    }

    /// Current income over net worth, 0 for an empty portfolio
    pub fn current_yield(&self) -> f64 {
        let net_worth = self.net_worth();
        if net_worth > 0.0 {
            self.current_annual_income() / net_worth
        } else {
            0.0
        }
    }

    /// Balance-weighted tax rate on portfolio income.
    ///
    /// Taxable accounts pay the qualified-dividend rate, tax-deferred accounts
    /// the ordinary rate on withdrawal, Roth and HSA nothing.
    pub fn blended_tax_rate(&self, rates: &TaxRates) -> f64 {
        let net_worth = self.net_worth();
        if net_worth <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = self
            .accounts
            .iter()
            .map(|account| {
                let rate = match account.tax_treatment {
                    AccountTaxTreatment::Taxable => rates.qualified_dividend,
                    AccountTaxTreatment::TaxDeferred => rates.ordinary_income,
                    AccountTaxTreatment::Roth | AccountTaxTreatment::Hsa => 0.0,
                };
                account.balance() * rate
            })
            .sum();
        weighted / net_worth
    }

    /// Lumpy expenses expected between `as_of` and the end of the year
    /// `years` out, sorted by date.
    pub fn upcoming_expenses(&self, as_of: Date, years: u16) -> Vec<ProjectedExpense> {
        let mut upcoming: Vec<ProjectedExpense> = self
            .expenses
            .iter()
            .flat_map(|expense| expense.occurrences(as_of, years))
            .collect();
        upcoming.sort_by(|a, b| a.date.cmp(&b.date).then(a.expense_id.cmp(&b.expense_id)));
        upcoming
    }
}

fn validate_account(account: &Account) -> Result<()> {
    for holding in &account.holdings {
        check_amount("holding quantity", holding.quantity)?;
        check_amount("holding price", holding.price)?;
        if let Some(dividend_yield) = holding.dividend_yield {
            check_rate("holding dividend_yield", dividend_yield)?;
        }
    }
    if let Some(balance) = account.manual_balance {
        check_amount("manual_balance", balance)?;
    }
    if let Some(dividend_yield) = account.dividend_yield {
        check_rate("account dividend_yield", dividend_yield)?;
    }
    Ok(())
}

// ============================================================================
// Builders
// ============================================================================

/// Builder for creating accounts with a fluent API
#[derive(Debug, Clone)]
pub struct AccountBuilder {
    name: String,
    custodian: Option<String>,
    tax_treatment: AccountTaxTreatment,
    holdings: Vec<Holding>,
    manual_balance: Option<f64>,
    dividend_yield: Option<f64>,
}

impl AccountBuilder {
    fn with_treatment(name: impl Into<String>, tax_treatment: AccountTaxTreatment) -> Self {
        Self {
            name: name.into(),
            custodian: None,
            tax_treatment,
            holdings: Vec::new(),
            manual_balance: None,
            dividend_yield: None,
        }
    }

    /// Taxable brokerage account
    #[must_use]
    pub fn taxable(name: impl Into<String>) -> Self {
        Self::with_treatment(name, AccountTaxTreatment::Taxable)
    }

    /// 401(k) or Traditional IRA
    #[must_use]
    pub fn tax_deferred(name: impl Into<String>) -> Self {
        Self::with_treatment(name, AccountTaxTreatment::TaxDeferred)
    }

    #[must_use]
    pub fn roth(name: impl Into<String>) -> Self {
        Self::with_treatment(name, AccountTaxTreatment::Roth)
    }

    #[must_use]
    pub fn hsa(name: impl Into<String>) -> Self {
        Self::with_treatment(name, AccountTaxTreatment::Hsa)
    }

    #[must_use]
    pub fn custodian(mut self, custodian: impl Into<String>) -> Self {
        self.custodian = Some(custodian.into());
        self
    }

    /// Add a holding that pays no income
    #[must_use]
    pub fn holding(
        mut self,
        symbol: impl Into<String>,
        category: AssetCategory,
        quantity: f64,
        price: f64,
    ) -> Self {
        self.holdings.push(Holding {
            symbol: symbol.into(),
            name: None,
            category,
            quantity,
            price,
            dividend_yield: None,
        });
        self
    }

    #[must_use]
    pub fn holding_with_yield(
        mut self,
        symbol: impl Into<String>,
        category: AssetCategory,
        quantity: f64,
        price: f64,
        dividend_yield: f64,
    ) -> Self {
        self.holdings.push(Holding {
            symbol: symbol.into(),
            name: None,
            category,
            quantity,
            price,
            dividend_yield: Some(dividend_yield),
        });
        self
    }

    /// Balance for an account whose holdings are not tracked
    #[must_use]
    pub fn manual_balance(mut self, balance: f64) -> Self {
        self.manual_balance = Some(balance);
        self
    }

    /// Yield applied to the manual balance
    #[must_use]
    pub fn dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = Some(dividend_yield);
        self
    }

    fn build(self, account_id: AccountId) -> Account {
        Account {
            account_id,
            name: self.name,
            custodian: self.custodian,
            tax_treatment: self.tax_treatment,
            holdings: self.holdings,
            manual_balance: self.manual_balance,
            dividend_yield: self.dividend_yield,
        }
    }
}

/// Builder for a [`FinancialSnapshot`] with automatic ID assignment
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    accounts: Vec<AccountBuilder>,
    expense_categories: Vec<ExpenseCategory>,
    /// IDs are placeholders until `build`
    expenses: Vec<Expense>,
    annual_expense_override: Option<f64>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn account(mut self, account: AccountBuilder) -> Self {
        self.accounts.push(account);
        self
    }

    #[must_use]
    pub fn expense_category(mut self, name: impl Into<String>, annual_amount: f64) -> Self {
        self.expense_categories.push(ExpenseCategory {
            name: name.into(),
            annual_amount,
        });
        self
    }

    #[must_use]
    pub fn recurring_expense(
        mut self,
        category: impl Into<String>,
        amount: f64,
        date: Date,
        recurrence: Recurrence,
    ) -> Self {
        self.expenses.push(Expense {
            expense_id: ExpenseId(0),
            category: category.into(),
            amount,
            date,
            description: None,
            expense_type: ExpenseType::Recurring,
            recurrence: Some(recurrence),
        });
        self
    }

    #[must_use]
    pub fn one_time_expense(
        mut self,
        category: impl Into<String>,
        description: impl Into<String>,
        amount: f64,
        date: Date,
    ) -> Self {
        self.expenses.push(Expense {
            expense_id: ExpenseId(0),
            category: category.into(),
            amount,
            date,
            description: Some(description.into()),
            expense_type: ExpenseType::OneTime,
            recurrence: None,
        });
        self
    }

    /// Replace the derived baseline with a fixed annual amount
    #[must_use]
    pub fn annual_expense_override(mut self, amount: f64) -> Self {
        self.annual_expense_override = Some(amount);
        self
    }

    /// Assign IDs in insertion order and validate.
    pub fn build(self) -> Result<FinancialSnapshot> {
        let accounts = self
            .accounts
            .into_iter()
            .enumerate()
            .map(|(i, builder)| Ok(builder.build(AccountId::from_index(i)?)))
            .collect::<Result<Vec<_>>>()?;
        let expenses = self
            .expenses
            .into_iter()
            .enumerate()
            .map(|(i, expense)| {
                Ok(Expense {
                    expense_id: ExpenseId::from_index(i)?,
                    ..expense
                })
            })
            .collect::<Result<Vec<_>>>()?;
        FinancialSnapshot::new(
            accounts,
            self.expense_categories,
            expenses,
            self.annual_expense_override,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn sample_snapshot() -> FinancialSnapshot {
        SnapshotBuilder::new()
            .account(
                AccountBuilder::taxable("Brokerage")
                    .custodian("Schwab")
                    .holding_with_yield("SCHD", AssetCategory::DividendGrowth, 1_000.0, 80.0, 0.035)
                    .holding("VOO", AssetCategory::Growth, 100.0, 500.0),
            )
            .account(
                AccountBuilder::tax_deferred("401(k)")
                    .manual_balance(120_000.0)
                    .dividend_yield(0.02),
            )
            .account(AccountBuilder::roth("Roth IRA").holding_with_yield(
                "JEPI",
                AssetCategory::HighYield,
                500.0,
                60.0,
                0.07,
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn test_net_worth_and_categories() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.net_worth(), 80_000.0 + 50_000.0 + 120_000.0 + 30_000.0);

        let by_category = snapshot.holdings_by_category();
        assert_eq!(by_category[&AssetCategory::DividendGrowth], 80_000.0);
        assert_eq!(by_category[&AssetCategory::Growth], 50_000.0);
        assert_eq!(by_category[&AssetCategory::Unclassified], 120_000.0);
        let total: f64 = by_category.values().sum();
        assert_eq!(total, snapshot.net_worth());
    }

    #[test]
    fn test_current_income_and_yield() {
        let snapshot = sample_snapshot();
        // 80k * 3.5% + 120k * 2% + 30k * 7%
        let expected = 2_800.0 + 2_400.0 + 2_100.0;
        assert!((snapshot.current_annual_income() - expected).abs() < 1e-9);
        assert!((snapshot.current_yield() - expected / 280_000.0).abs() < 1e-12);
    }

    #[test]
    fn test_blended_tax_rate_weights_by_account() {
        let snapshot = sample_snapshot();
        let rates = TaxRates {
            qualified_dividend: 0.15,
            ordinary_income: 0.30,
        };
        let expected = (130_000.0 * 0.15 + 120_000.0 * 0.30) / 280_000.0;
        assert!((snapshot.blended_tax_rate(&rates) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_snapshot_is_neutral() {
        let snapshot = SnapshotBuilder::new().build().unwrap();
        assert_eq!(snapshot.net_worth(), 0.0);
        assert_eq!(snapshot.current_yield(), 0.0);
        assert_eq!(snapshot.blended_tax_rate(&TaxRates::default()), 0.0);
        assert_eq!(snapshot.annual_expenses(), 0.0);
        assert!(snapshot.holdings_by_category().is_empty());
    }

    #[test]
    fn test_annual_expense_precedence() {
        let day = date(2024, 1, 1);
        let ledger_only = SnapshotBuilder::new()
            .recurring_expense("Utilities", 500.0, day, Recurrence::Monthly)
            .recurring_expense("Car", 40_000.0, day, Recurrence::MultiYear { interval_years: 8 })
            .build()
            .unwrap();
        assert_eq!(ledger_only.annual_expenses(), 6_000.0 + 5_000.0);

        let budgeted = SnapshotBuilder::new()
            .expense_category("Housing", 48_000.0)
            .expense_category("Travel", 12_000.0)
            .recurring_expense("Utilities", 500.0, day, Recurrence::Monthly)
            .build()
            .unwrap();
        assert_eq!(budgeted.annual_expenses(), 60_000.0);

        let overridden = SnapshotBuilder::new()
            .expense_category("Housing", 48_000.0)
            .annual_expense_override(221_000.0)
            .build()
            .unwrap();
        assert_eq!(overridden.annual_expenses(), 221_000.0);
    }

    #[test]
    fn test_upcoming_expenses_sorted() {
        let snapshot = SnapshotBuilder::new()
            .recurring_expense(
                "Home",
                25_000.0,
                date(2019, 5, 1),
                Recurrence::MultiYear { interval_years: 4 },
            )
            .one_time_expense("Family", "Wedding", 30_000.0, date(2025, 8, 1))
            .build()
            .unwrap();
        let upcoming = snapshot.upcoming_expenses(date(2024, 6, 1), 5);
        let dates: Vec<Date> = upcoming.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2025, 8, 1), date(2027, 5, 1)]);
    }

    #[test]
    fn test_expense_ids_follow_insertion_order() {
        let snapshot = SnapshotBuilder::new()
            .one_time_expense("Family", "Wedding", 30_000.0, date(2025, 8, 1))
            .one_time_expense("Family", "Wedding", 30_000.0, date(2025, 8, 1))
            .build()
            .unwrap();
        let ids: Vec<ExpenseId> = snapshot.expenses().iter().map(|e| e.expense_id).collect();
        assert_eq!(ids, vec![ExpenseId(0), ExpenseId(1)]);
        // Identical entries stay distinct when sorted by date
        let upcoming = snapshot.upcoming_expenses(date(2025, 1, 1), 1);
        assert_eq!(upcoming[0].expense_id, ExpenseId(0));
        assert_eq!(upcoming[1].expense_id, ExpenseId(1));
    }

    #[test]
    fn test_too_many_expenses_rejected() {
        let mut builder = SnapshotBuilder::new();
        for _ in 0..=usize::from(u16::MAX) + 1 {
            builder = builder.one_time_expense("Misc", "Receipt", 10.0, date(2025, 1, 1));
        }
        assert_eq!(
            builder.build(),
            Err(ConfigurationError::TooManyRecords {
                kind: "expenses",
                count: 65_537
            })
        );
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let negative_quantity = SnapshotBuilder::new()
            .account(AccountBuilder::taxable("Brokerage").holding(
                "VOO",
                AssetCategory::Growth,
                -1.0,
                500.0,
            ))
            .build();
        assert!(matches!(
            negative_quantity,
            Err(ConfigurationError::NegativeAmount {
                field: "holding quantity",
                ..
            })
        ));

        let zero_interval = SnapshotBuilder::new()
            .recurring_expense(
                "Home",
                1_000.0,
                date(2024, 1, 1),
                Recurrence::MultiYear { interval_years: 0 },
            )
            .build();
        assert_eq!(
            zero_interval,
            Err(ConfigurationError::InvalidRecurrenceInterval)
        );
    }
}
