//! Market assumptions and return distributions
//!
//! Market data arrives already fetched. Every field is optional; resolving
//! the assumptions substitutes documented defaults and records an
//! [`AssumptionWarning`] for each one used, so a projection never fails just
//! because a quote feed was missing a value.

use rand::Rng;
use rand_distr::Distribution;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::results::AssumptionWarning;
use crate::error::{ConfigurationError, Result, check_amount, check_rate};

/// 10-year treasury yield assumed when none is supplied
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.0425;
/// Conservative long-run portfolio growth
pub const DEFAULT_GROWTH_RATE: f64 = 0.06;
/// Annualized standard deviation of portfolio returns
pub const DEFAULT_VOLATILITY: f64 = 0.15;
/// Yield of the default income strategy
pub const DEFAULT_PORTFOLIO_YIELD: f64 = 0.0431;
/// Treasury level that category base yields are quoted against
pub const REFERENCE_TREASURY_YIELD: f64 = 0.04;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentQuote {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
}

/// Shape of the annual return draw used by Monte Carlo trials.
///
/// Every variant is parameterized by the same (expected growth, volatility)
/// pair and matches both moments, so switching shape changes tail behavior
/// but not the average outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type")]
pub enum ReturnDistribution {
    #[default]
    Normal,
    /// Gross return `1 + r` is log-normally distributed, so returns never fall
    /// below -100%.
    LogNormal,
    /// Student's t distribution for fat-tailed returns.
    /// `degrees_of_freedom` must be greater than 2 for the variance to exist.
    StudentT { degrees_of_freedom: f64 },
}

impl ReturnDistribution {
    /// Build a sampler with arithmetic mean `mean` and standard deviation `std_dev`.
    pub fn sampler(self, mean: f64, std_dev: f64) -> Result<ReturnSampler> {
        match self {
            ReturnDistribution::Normal => rand_distr::Normal::new(mean, std_dev)
                .map(ReturnSampler::Normal)
                .map_err(|_| ConfigurationError::InvalidDistributionParameters {
                    distribution: "Normal return",
                    mean,
                    std_dev,
                    reason: "std_dev must be non-negative and finite",
                }),
            ReturnDistribution::LogNormal => {
                let gross_mean = 1.0 + mean;
                if gross_mean <= 0.0 {
                    return Err(ConfigurationError::InvalidDistributionParameters {
                        distribution: "LogNormal return",
                        mean,
                        std_dev,
                        reason: "mean return must be greater than -100%",
                    });
                }
                let sigma_sq = (1.0 + (std_dev / gross_mean).powi(2)).ln();
                let mu = gross_mean.ln() - sigma_sq / 2.0;
                rand_distr::LogNormal::new(mu, sigma_sq.sqrt())
                    .map(ReturnSampler::LogNormal)
                    .map_err(|_| ConfigurationError::InvalidDistributionParameters {
                        distribution: "LogNormal return",
                        mean,
                        std_dev,
                        reason: "std_dev must be non-negative and finite",
                    })
            }
            ReturnDistribution::StudentT { degrees_of_freedom } => {
                if !(degrees_of_freedom > 2.0) || !std_dev.is_finite() || std_dev < 0.0 {
                    return Err(ConfigurationError::InvalidDistributionParameters {
                        distribution: "StudentT return",
                        mean,
                        std_dev,
                        reason: "degrees of freedom must exceed 2 and std_dev must be non-negative",
                    });
                }
                let scale = std_dev * ((degrees_of_freedom - 2.0) / degrees_of_freedom).sqrt();
                rand_distr::StudentT::new(degrees_of_freedom)
                    .map(|dist| ReturnSampler::StudentT { dist, mean, scale })
                    .map_err(|_| ConfigurationError::InvalidDistributionParameters {
                        distribution: "StudentT return",
                        mean,
                        std_dev,
                        reason: "degrees of freedom must be positive and finite",
                    })
            }
        }
    }
}

/// A validated, ready-to-draw return distribution
#[derive(Debug, Clone)]
pub enum ReturnSampler {
    Normal(rand_distr::Normal<f64>),
    LogNormal(rand_distr::LogNormal<f64>),
    StudentT {
        dist: rand_distr::StudentT<f64>,
        mean: f64,
        scale: f64,
    },
}

impl ReturnSampler {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            ReturnSampler::Normal(dist) => dist.sample(rng),
            ReturnSampler::LogNormal(dist) => dist.sample(rng) - 1.0,
            ReturnSampler::StudentT { dist, mean, scale } => mean + scale * dist.sample(rng),
        }
    }

    /// Draw `num_years` independent annual returns
    pub fn sample_sequence<R: Rng + ?Sized>(&self, rng: &mut R, num_years: usize) -> Vec<f64> {
        (0..num_years).map(|_| self.sample(rng)).collect()
    }
}

/// Externally supplied market view. Never cached by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MarketAssumptions {
    /// Current treasury yield
    pub risk_free_rate: Option<f64>,
    pub equity_risk_premium: Option<f64>,
    /// Explicit expected growth, takes precedence over risk-free + premium
    pub expected_growth_rate: Option<f64>,
    pub volatility: Option<f64>,
    /// Pre-tax yield of the whole portfolio
    pub portfolio_yield: Option<f64>,
    pub distribution: ReturnDistribution,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quotes: Vec<InstrumentQuote>,
}

/// Concrete numbers after defaults have been applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAssumptions {
    pub risk_free_rate: f64,
    pub growth_rate: f64,
    pub volatility: f64,
    pub portfolio_yield: f64,
    pub distribution: ReturnDistribution,
    pub warnings: Vec<AssumptionWarning>,
}

impl ResolvedAssumptions {
    pub fn uses_defaults(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl MarketAssumptions {
    pub fn validate(&self) -> Result<()> {
        if let Some(rate) = self.risk_free_rate {
            check_rate("risk_free_rate", rate)?;
        }
        if let Some(premium) = self.equity_risk_premium
            && !(-1.0..=1.0).contains(&premium)
        {
            return Err(ConfigurationError::RateOutOfRange {
                field: "equity_risk_premium",
                value: premium,
            });
        }
        if let Some(growth) = self.expected_growth_rate
            && !(growth.is_finite() && growth > -1.0)
        {
            return Err(ConfigurationError::RateOutOfRange {
                field: "expected_growth_rate",
                value: growth,
            });
        }
        if let Some(volatility) = self.volatility {
            check_rate("volatility", volatility)?;
        }
        if let Some(portfolio_yield) = self.portfolio_yield {
            check_rate("portfolio_yield", portfolio_yield)?;
        }
        for quote in &self.quotes {
            if let Some(price) = quote.price {
                check_amount("instrument price", price)?;
            }
            if let Some(dividend_yield) = quote.dividend_yield {
                check_rate("instrument dividend_yield", dividend_yield)?;
            }
        }
        Ok(())
    }

    /// Treasury yield, or the default together with the warning to report
    pub fn risk_free_rate_or_default(&self) -> (f64, Option<AssumptionWarning>) {
        match self.risk_free_rate {
            Some(rate) => (rate, None),
            None => (
                DEFAULT_RISK_FREE_RATE,
                Some(AssumptionWarning::DefaultRiskFreeRate {
                    used: DEFAULT_RISK_FREE_RATE,
                }),
            ),
        }
    }

    /// Index quotes by symbol for repeated lookups
    pub fn quote_index(&self) -> FxHashMap<&str, &InstrumentQuote> {
        self.quotes
            .iter()
            .map(|quote| (quote.symbol.as_str(), quote))
            .collect()
    }

    /// Validate and substitute defaults for growth, volatility and yield.
    pub fn resolve(&self) -> Result<ResolvedAssumptions> {
        self.validate()?;
        let mut warnings = Vec::new();

        let risk_free_rate = self.risk_free_rate.unwrap_or(DEFAULT_RISK_FREE_RATE);
        let growth_rate = match (
            self.expected_growth_rate,
            self.risk_free_rate,
            self.equity_risk_premium,
        ) {
            (Some(growth), _, _) => growth,
            (None, Some(risk_free), Some(premium)) => risk_free + premium,
            _ => {
                warnings.push(AssumptionWarning::DefaultGrowthRate {
                    used: DEFAULT_GROWTH_RATE,
                });
                DEFAULT_GROWTH_RATE
            }
        };
        let volatility = self.volatility.unwrap_or_else(|| {
            warnings.push(AssumptionWarning::DefaultVolatility {
                used: DEFAULT_VOLATILITY,
            });
            DEFAULT_VOLATILITY
        });
        let portfolio_yield = self.portfolio_yield.unwrap_or_else(|| {
            warnings.push(AssumptionWarning::DefaultPortfolioYield {
                used: DEFAULT_PORTFOLIO_YIELD,
            });
            DEFAULT_PORTFOLIO_YIELD
        });

        if !warnings.is_empty() {
            tracing::debug!(count = warnings.len(), "market assumptions fell back to defaults");
        }

        Ok(ResolvedAssumptions {
            risk_free_rate,
            growth_rate,
            volatility,
            portfolio_yield,
            distribution: self.distribution,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn sample_stats(sampler: &ReturnSampler, n: usize) -> (f64, f64) {
        let mut rng = SmallRng::seed_from_u64(7);
        let draws = sampler.sample_sequence(&mut rng, n);
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        (mean, var.sqrt())
    }

    #[test]
    fn test_empty_assumptions_resolve_to_defaults() {
        let resolved = MarketAssumptions::default().resolve().unwrap();
        assert_eq!(resolved.growth_rate, DEFAULT_GROWTH_RATE);
        assert_eq!(resolved.volatility, DEFAULT_VOLATILITY);
        assert_eq!(resolved.portfolio_yield, DEFAULT_PORTFOLIO_YIELD);
        assert_eq!(resolved.warnings.len(), 3);
        assert!(resolved.uses_defaults());
    }

    #[test]
    fn test_growth_from_risk_free_plus_premium() {
        let market = MarketAssumptions {
            risk_free_rate: Some(0.045),
            equity_risk_premium: Some(0.025),
            volatility: Some(0.12),
            portfolio_yield: Some(0.04),
            ..Default::default()
        };
        let resolved = market.resolve().unwrap();
        assert!((resolved.growth_rate - 0.07).abs() < 1e-12);
        assert!(!resolved.uses_defaults());
    }

    #[test]
    fn test_negative_volatility_rejected() {
        let market = MarketAssumptions {
            volatility: Some(-0.1),
            ..Default::default()
        };
        assert!(matches!(
            market.resolve(),
            Err(ConfigurationError::RateOutOfRange {
                field: "volatility",
                ..
            })
        ));
    }

    #[test]
    fn test_samplers_match_moments() {
        for distribution in [
            ReturnDistribution::Normal,
            ReturnDistribution::LogNormal,
            ReturnDistribution::StudentT {
                degrees_of_freedom: 5.0,
            },
        ] {
            let sampler = distribution.sampler(0.06, 0.15).unwrap();
            let (mean, std_dev) = sample_stats(&sampler, 200_000);
            assert!((mean - 0.06).abs() < 0.005, "{distribution:?} mean {mean}");
            assert!(
                (std_dev - 0.15).abs() < 0.01,
                "{distribution:?} std_dev {std_dev}"
            );
        }
    }

    #[test]
    fn test_student_t_needs_finite_variance() {
        let result = ReturnDistribution::StudentT {
            degrees_of_freedom: 2.0,
        }
        .sampler(0.06, 0.15);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_volatility_is_deterministic() {
        let sampler = ReturnDistribution::Normal.sampler(0.05, 0.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(sampler.sample(&mut rng), 0.05);
    }
}
