//! Tax-aware allocation optimizer
//!
//! Splits a portfolio value across an [`AllocationTable`], rounds each
//! instrument down to whole shares and estimates pre- and after-tax income.
//! Income is computed on the allocated dollars, so a missing price turns
//! the allocation into cash drag without changing the income estimate.

use crate::error::{ConfigurationError, Result};
use crate::model::{
    AllocationResult, AllocationTable, AssumptionWarning, CategoryAllocation, CategoryTarget,
    IncomeTaxTreatment, InstrumentAllocation, InstrumentQuote, MarketAssumptions, TaxRates,
};

/// Marginal rate for a category's income
pub fn category_tax_rate(treatment: IncomeTaxTreatment, rates: &TaxRates) -> f64 {
    match treatment {
        IncomeTaxTreatment::Qualified => rates.qualified_dividend,
        IncomeTaxTreatment::Ordinary => rates.ordinary_income,
    }
}

/// Weighted treasury-adjusted yield of a table under the given market view
pub fn expected_table_yield(table: &AllocationTable, market: &MarketAssumptions) -> f64 {
    let (risk_free_rate, _) = market.risk_free_rate_or_default();
    table.expected_yield(risk_free_rate)
}

/// Allocate `total_value` across the table and estimate its income.
///
/// The table is validated and never normalized. A non-finite total is
/// rejected; a non-positive one yields an all-zero result.
pub fn optimize_allocation(
    total_value: f64,
    table: &AllocationTable,
    market: &MarketAssumptions,
    tax_rates: &TaxRates,
) -> Result<AllocationResult> {
    table.validate()?;
    market.validate()?;
    tax_rates.validate()?;

    if !total_value.is_finite() {
        return Err(ConfigurationError::NegativeAmount {
            field: "total_value",
            value: total_value,
        });
    }
    if total_value <= 0.0 {
        return Ok(empty_allocation(table, tax_rates));
    }

    let (risk_free_rate, risk_free_warning) = market.risk_free_rate_or_default();
    let quotes = market.quote_index();
    let mut warnings = Vec::new();
    let mut estimated_any_yield = false;

    let categories: Vec<CategoryAllocation> = table
        .targets
        .iter()
        .map(|target| {
            let tax_rate = category_tax_rate(target.tax_treatment, tax_rates);
            let target_value = total_value * target.weight;
            let estimate = target.adjusted_yield(risk_free_rate);

            let instruments: Vec<InstrumentAllocation> = target
                .instruments
                .iter()
                .map(|instrument| {
                    let allocation_value = target_value * instrument.weight;
                    let quote = quotes.get(instrument.symbol.as_str()).copied();
                    let price = usable_price(quote);
                    let (quantity, invested_value) = match price {
                        Some(price) => {
                            let quantity = (allocation_value / price).floor();
                            (quantity, quantity * price)
                        }
                        None => {
                            warnings.push(AssumptionWarning::MissingInstrumentPrice {
                                symbol: instrument.symbol.clone(),
                            });
                            (0.0, 0.0)
                        }
                    };
                    let (dividend_yield, yield_estimated) =
                        match quote.and_then(|q| q.dividend_yield) {
                            Some(dividend_yield) => (dividend_yield, false),
                            None => {
                                estimated_any_yield = true;
                                warnings.push(AssumptionWarning::MissingInstrumentYield {
                                    symbol: instrument.symbol.clone(),
                                    fallback: estimate,
                                });
                                (estimate, true)
                            }
                        };
                    let annual_income = allocation_value * dividend_yield;

                    InstrumentAllocation {
                        symbol: instrument.symbol.clone(),
                        name: instrument.name.clone(),
                        weight_in_category: instrument.weight,
                        allocation_value,
                        price,
                        quantity,
                        invested_value,
                        cash_drag: allocation_value - invested_value,
                        dividend_yield,
                        yield_estimated,
                        annual_income,
                        after_tax_income: annual_income * (1.0 - tax_rate),
                    }
                })
                .collect();

            summarize_category(target, target_value, tax_rate, estimate, instruments)
        })
        .collect();

    if estimated_any_yield && let Some(warning) = risk_free_warning {
        warnings.insert(0, warning);
    }

    let total_invested: f64 = categories.iter().map(|c| c.invested_value).sum();
    let total_cash_drag: f64 = categories.iter().map(|c| c.cash_drag).sum();
    let annual_income: f64 = categories.iter().map(|c| c.annual_income).sum();
    let after_tax_income: f64 = categories.iter().map(|c| c.after_tax_income).sum();

    tracing::debug!(
        total_value,
        annual_income,
        warnings = warnings.len(),
        "allocation optimized"
    );

    Ok(AllocationResult {
        total_value,
        categories,
        total_invested,
        total_cash_drag,
        annual_income,
        after_tax_income,
        pretax_yield: annual_income / total_value,
        after_tax_yield: after_tax_income / total_value,
        warnings,
    })
}

fn usable_price(quote: Option<&InstrumentQuote>) -> Option<f64> {
    quote.and_then(|q| q.price).filter(|price| *price > 0.0)
}

/// Roll instrument rows up into a category. A category listing no
/// instruments is held whole at its estimated yield.
fn summarize_category(
    target: &CategoryTarget,
    target_value: f64,
    tax_rate: f64,
    estimate: f64,
    instruments: Vec<InstrumentAllocation>,
) -> CategoryAllocation {
    let (invested_value, cash_drag, annual_income) = if instruments.is_empty() {
        (target_value, 0.0, target_value * estimate)
    } else {
        (
            instruments.iter().map(|i| i.invested_value).sum(),
            instruments.iter().map(|i| i.cash_drag).sum(),
            instruments.iter().map(|i| i.annual_income).sum(),
        )
    };
    let category_yield = if target_value > 0.0 {
        annual_income / target_value
    } else {
        0.0
    };

    CategoryAllocation {
        category: target.category,
        weight: target.weight,
        target_value,
        tax_treatment: target.tax_treatment,
        tax_rate,
        invested_value,
        cash_drag,
        annual_income,
        after_tax_income: annual_income * (1.0 - tax_rate),
        category_yield,
        instruments,
    }
}

fn empty_allocation(table: &AllocationTable, tax_rates: &TaxRates) -> AllocationResult {
    let categories = table
        .targets
        .iter()
        .map(|target| CategoryAllocation {
            category: target.category,
            weight: target.weight,
            target_value: 0.0,
            tax_treatment: target.tax_treatment,
            tax_rate: category_tax_rate(target.tax_treatment, tax_rates),
            invested_value: 0.0,
            cash_drag: 0.0,
            annual_income: 0.0,
            after_tax_income: 0.0,
            category_yield: 0.0,
            instruments: Vec::new(),
        })
        .collect();

    AllocationResult {
        total_value: 0.0,
        categories,
        total_invested: 0.0,
        total_cash_drag: 0.0,
        annual_income: 0.0,
        after_tax_income: 0.0,
        pretax_yield: 0.0,
        after_tax_yield: 0.0,
        warnings: Vec::new(),
    }
}
