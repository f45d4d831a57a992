//! Model portfolios sized to a required yield
//!
//! Four fixed tiers trade growth for income. The lowest tier whose ceiling
//! covers the required yield is chosen, and each tier is an ordinary
//! [`AllocationTable`] so it can be fed straight into the optimizer.

use serde::{Deserialize, Serialize};

use crate::error::{Result, check_amount};
use crate::model::{
    AllocationTable, AssetCategory, CategoryTarget, IncomeTaxTreatment, REFERENCE_TREASURY_YIELD,
    RetirementConfig,
};
use crate::snapshot::FinancialSnapshot;

/// Required yield assumed when there is no portfolio to measure against
pub const FALLBACK_REQUIRED_YIELD: f64 = 0.035;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelTier {
    Conservative,
    Moderate,
    Balanced,
    Aggressive,
}

impl ModelTier {
    pub const ALL: [ModelTier; 4] = [
        ModelTier::Conservative,
        ModelTier::Moderate,
        ModelTier::Balanced,
        ModelTier::Aggressive,
    ];

    /// Highest required yield the tier is chosen for, inclusive
    pub fn ceiling(self) -> Option<f64> {
        match self {
            ModelTier::Conservative => Some(0.025),
            ModelTier::Moderate => Some(0.035),
            ModelTier::Balanced => Some(0.045),
            ModelTier::Aggressive => None,
        }
    }

    pub fn for_required_yield(required_yield: f64) -> Self {
        Self::ALL
            .into_iter()
            .find(|tier| tier.ceiling().is_none_or(|ceiling| required_yield <= ceiling))
            .unwrap_or(ModelTier::Aggressive)
    }

    /// Category weights of the tier, in order of weight
    fn weights(self) -> [(AssetCategory, f64); 5] {
        use AssetCategory::*;
        match self {
            ModelTier::Conservative => [
                (DividendGrowth, 0.40),
                (TreasuryTips, 0.35),
                (HighYield, 0.15),
                (Cash, 0.10),
                (Reit, 0.0),
            ],
            ModelTier::Moderate => [
                (HighYield, 0.30),
                (DividendGrowth, 0.25),
                (TreasuryTips, 0.25),
                (Reit, 0.15),
                (Cash, 0.05),
            ],
            ModelTier::Balanced => [
                (HighYield, 0.35),
                (Reit, 0.25),
                (DividendGrowth, 0.20),
                (TreasuryTips, 0.15),
                (Cash, 0.05),
            ],
            ModelTier::Aggressive => [
                (HighYield, 0.40),
                (Reit, 0.35),
                (TreasuryTips, 0.15),
                (DividendGrowth, 0.05),
                (Cash, 0.05),
            ],
        }
    }

    /// The tier as an allocation table. Categories hold no instruments, so
    /// the optimizer treats each one whole at its treasury-adjusted yield.
    pub fn table(self) -> AllocationTable {
        let targets = self
            .weights()
            .into_iter()
            .filter(|(_, weight)| *weight > 0.0)
            .map(|(category, weight)| asset_class(category, weight))
            .collect();
        AllocationTable { targets }
    }
}

/// Typical yield, tax treatment and rate sensitivity of each asset class
fn asset_class(category: AssetCategory, weight: f64) -> CategoryTarget {
    let (base_yield, tax_treatment, rate_sensitivity, rationale) = match category {
        AssetCategory::HighYield => (
            0.045,
            IncomeTaxTreatment::Qualified,
            0.5,
            "High dividend stocks, typically yielding 4-5%",
        ),
        AssetCategory::Reit => (
            0.06,
            IncomeTaxTreatment::Ordinary,
            0.5,
            "REITs, typically yielding 5-7%",
        ),
        AssetCategory::DividendGrowth => (
            0.025,
            IncomeTaxTreatment::Qualified,
            0.5,
            "Dividend growth stocks, typically yielding 2-3%",
        ),
        AssetCategory::TreasuryTips => (
            0.04,
            IncomeTaxTreatment::Ordinary,
            1.0,
            "Bonds and fixed income, typically yielding 3-5%",
        ),
        _ => (
            0.045,
            IncomeTaxTreatment::Ordinary,
            1.0,
            "Cash equivalents, typically yielding 4-5%",
        ),
    };
    CategoryTarget {
        category,
        weight,
        tax_treatment,
        base_yield,
        rate_sensitivity,
        instruments: Vec::new(),
        rationale: rationale.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPortfolio {
    pub required_yield: f64,
    pub tier: ModelTier,
    pub table: AllocationTable,
    /// Weighted typical yield of the table with treasuries at the reference level
    pub weighted_yield: f64,
    pub meets_required_yield: bool,
}

/// Pick the model portfolio for a required yield (a fraction, 0.04 is 4%).
pub fn model_portfolio(required_yield: f64) -> Result<ModelPortfolio> {
    check_amount("required_yield", required_yield)?;

    let tier = ModelTier::for_required_yield(required_yield);
    let table = tier.table();
    let weighted_yield = table.expected_yield(REFERENCE_TREASURY_YIELD);

    Ok(ModelPortfolio {
        required_yield,
        tier,
        table,
        weighted_yield,
        meets_required_yield: weighted_yield >= required_yield,
    })
}

/// Model portfolio for the yield today's net worth would need at withdrawal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanModelPortfolio {
    pub current_net_worth: f64,
    pub expenses_at_withdrawal: f64,
    pub model: ModelPortfolio,
}

/// Size a model portfolio to the plan: expenses inflated to the withdrawal
/// age over today's net worth, or [`FALLBACK_REQUIRED_YIELD`] for an empty
/// portfolio.
pub fn plan_model_portfolio(
    snapshot: &FinancialSnapshot,
    config: &RetirementConfig,
) -> Result<PlanModelPortfolio> {
    config.validate()?;

    let current_net_worth = snapshot.net_worth();
    let expenses_at_withdrawal =
        config.inflate(snapshot.annual_expenses(), config.years_to_withdrawal());
    let required_yield = if current_net_worth > 0.0 {
        expenses_at_withdrawal / current_net_worth
    } else {
        FALLBACK_REQUIRED_YIELD
    };

    Ok(PlanModelPortfolio {
        current_net_worth,
        expenses_at_withdrawal,
        model: model_portfolio(required_yield)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;
    use crate::{AccountBuilder, SnapshotBuilder};

    #[test]
    fn test_tier_boundaries_are_inclusive() {
        let cases = [
            (0.0, ModelTier::Conservative),
            (0.025, ModelTier::Conservative),
            (0.0251, ModelTier::Moderate),
            (0.035, ModelTier::Moderate),
            (0.0351, ModelTier::Balanced),
            (0.045, ModelTier::Balanced),
            (0.0451, ModelTier::Aggressive),
            (0.12, ModelTier::Aggressive),
        ];
        for (required_yield, tier) in cases {
            assert_eq!(
                model_portfolio(required_yield).unwrap().tier,
                tier,
                "required yield {required_yield}"
            );
        }
    }

    #[test]
    fn test_weighted_yields() {
        let expected = [
            (ModelTier::Conservative, 0.03525),
            (ModelTier::Moderate, 0.041),
            (ModelTier::Balanced, 0.044),
            (ModelTier::Aggressive, 0.0485),
        ];
        for (tier, weighted_yield) in expected {
            let table = tier.table();
            assert!(table.validate().is_ok(), "{tier:?}");
            assert!(
                (table.expected_yield(REFERENCE_TREASURY_YIELD) - weighted_yield).abs() < 1e-12,
                "{tier:?}"
            );
        }
        assert_eq!(ModelTier::Conservative.table().targets.len(), 4);
        assert_eq!(ModelTier::Aggressive.table().targets.len(), 5);
    }

    #[test]
    fn test_meets_required_yield() {
        let moderate = model_portfolio(0.03).unwrap();
        assert!(moderate.meets_required_yield);
        assert!((moderate.weighted_yield - 0.041).abs() < 1e-12);

        let stretched = model_portfolio(0.06).unwrap();
        assert_eq!(stretched.tier, ModelTier::Aggressive);
        assert!(!stretched.meets_required_yield);
    }

    #[test]
    fn test_invalid_required_yield_rejected() {
        for required_yield in [-0.01, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                model_portfolio(required_yield),
                Err(ConfigurationError::NegativeAmount {
                    field: "required_yield",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_plan_required_yield() {
        let snapshot = SnapshotBuilder::new()
            .account(AccountBuilder::taxable("Brokerage").manual_balance(10_000_000.0))
            .annual_expense_override(221_000.0)
            .build()
            .unwrap();
        let plan = plan_model_portfolio(&snapshot, &RetirementConfig::default()).unwrap();
        assert!((plan.expenses_at_withdrawal - 248_737.45).abs() < 0.01);
        let required = plan.expenses_at_withdrawal / 10_000_000.0;
        assert!((plan.model.required_yield - required).abs() < 1e-15);
        assert_eq!(plan.model.tier, ModelTier::Conservative);

        let empty = SnapshotBuilder::new().build().unwrap();
        let fallback = plan_model_portfolio(&empty, &RetirementConfig::default()).unwrap();
        assert_eq!(fallback.model.required_yield, FALLBACK_REQUIRED_YIELD);
        assert_eq!(fallback.model.tier, ModelTier::Moderate);
    }
}
