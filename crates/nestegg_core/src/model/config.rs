use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, Result, check_amount, check_rate};

/// Marginal rates applied to portfolio income
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxRates {
    pub qualified_dividend: f64,
    /// Ordinary income (federal + state)
    pub ordinary_income: f64,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            qualified_dividend: 0.15,
            ordinary_income: 0.30,
        }
    }
}

impl TaxRates {
    pub fn validate(&self) -> Result<()> {
        check_rate("qualified_dividend_tax_rate", self.qualified_dividend)?;
        check_rate("ordinary_income_tax_rate", self.ordinary_income)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneTimeContribution {
    pub age: u32,
    pub amount: f64,
}

/// Money flowing into the portfolio besides market growth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContributionPlan {
    /// Added every accumulation year
    pub annual_contribution: f64,
    /// Upper bound on how much of a withdrawal-year surplus is reinvested
    pub reinvestment_cap: f64,
    pub one_time: Option<OneTimeContribution>,
}

impl Default for ContributionPlan {
    fn default() -> Self {
        Self {
            annual_contribution: 0.0,
            reinvestment_cap: 20_000.0,
            one_time: None,
        }
    }
}

impl ContributionPlan {
    pub fn validate(&self) -> Result<()> {
        check_amount("annual_contribution", self.annual_contribution)?;
        check_amount("reinvestment_cap", self.reinvestment_cap)?;
        if let Some(one_time) = &self.one_time {
            check_amount("one_time_contribution", one_time.amount)?;
        }
        Ok(())
    }

    /// Contribution landing in the year the plan reaches `age`
    pub fn contribution_at(&self, age: u32, accumulating: bool) -> f64 {
        let recurring = if accumulating {
            self.annual_contribution
        } else {
            0.0
        };
        let one_time = self
            .one_time
            .filter(|c| c.age == age)
            .map_or(0.0, |c| c.amount);
        recurring + one_time
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementConfig {
    pub current_age: u32,
    pub withdrawal_start_age: u32,
    pub social_security_start_age: u32,
    /// Projection horizon
    pub target_age: u32,
    pub target_portfolio_value: f64,
    pub inflation_rate: f64,
    /// Flat monthly benefit, not inflation-adjusted
    #[serde(default)]
    pub social_security_monthly: f64,
    /// Explicit blended rate on portfolio income. When unset, the rate is
    /// derived from the account mix of the snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blended_tax_rate: Option<f64>,
    #[serde(default)]
    pub tax_rates: TaxRates,
    #[serde(default)]
    pub contributions: ContributionPlan,
}

impl Default for RetirementConfig {
    fn default() -> Self {
        Self {
            current_age: 51,
            withdrawal_start_age: 55,
            social_security_start_age: 67,
            target_age: 90,
            target_portfolio_value: 4_250_000.0,
            inflation_rate: 0.03,
            social_security_monthly: 0.0,
            blended_tax_rate: None,
            tax_rates: TaxRates::default(),
            contributions: ContributionPlan::default(),
        }
    }
}

impl RetirementConfig {
    pub fn validate(&self) -> Result<()> {
        let ages_ordered = self.current_age > 0
            && self.current_age < self.withdrawal_start_age
            && self.withdrawal_start_age <= self.social_security_start_age
            && self.social_security_start_age <= self.target_age;
        if !ages_ordered {
            return Err(ConfigurationError::InvalidAges {
                current: self.current_age,
                withdrawal_start: self.withdrawal_start_age,
                social_security_start: self.social_security_start_age,
                target: self.target_age,
            });
        }
        check_rate("inflation_rate", self.inflation_rate)?;
        check_amount("target_portfolio_value", self.target_portfolio_value)?;
        check_amount("social_security_monthly", self.social_security_monthly)?;
        if let Some(rate) = self.blended_tax_rate {
            check_rate("blended_tax_rate", rate)?;
        }
        self.tax_rates.validate()?;
        self.contributions.validate()
    }

    pub fn horizon_years(&self) -> u32 {
        self.target_age - self.current_age
    }

    pub fn years_to_withdrawal(&self) -> u32 {
        self.withdrawal_start_age - self.current_age
    }

    pub fn social_security_annual(&self) -> f64 {
        self.social_security_monthly * 12.0
    }

    /// Today's amount compounded by inflation for `years`
    pub fn inflate(&self, amount: f64, years: u32) -> f64 {
        amount * (1.0 + self.inflation_rate).powi(years as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RetirementConfig::default().validate().is_ok());
    }

    #[test]
    fn test_withdrawal_must_follow_current_age() {
        let config = RetirementConfig {
            current_age: 55,
            withdrawal_start_age: 55,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidAges { current: 55, .. })
        ));
    }

    #[test]
    fn test_social_security_before_withdrawal_is_rejected() {
        let config = RetirementConfig {
            social_security_start_age: 54,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_contribution_is_rejected() {
        let config = RetirementConfig {
            contributions: ContributionPlan {
                annual_contribution: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::NegativeAmount {
                field: "annual_contribution",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_contribution_schedule() {
        let plan = ContributionPlan {
            annual_contribution: 10_000.0,
            reinvestment_cap: 20_000.0,
            one_time: Some(OneTimeContribution {
                age: 54,
                amount: 250_000.0,
            }),
        };
        assert_eq!(plan.contribution_at(52, true), 10_000.0);
        assert_eq!(plan.contribution_at(54, true), 260_000.0);
        assert_eq!(plan.contribution_at(60, false), 0.0);
    }

    #[test]
    fn test_inflate_expense_example() {
        let config = RetirementConfig::default();
        let at_55 = config.inflate(221_000.0, 4);
        assert!((at_55 - 248_737.45).abs() < 0.01, "got {at_55}");
    }
}
