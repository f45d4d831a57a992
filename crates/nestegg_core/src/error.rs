use std::fmt;

use crate::model::AssetCategory;

/// Invalid financial inputs. Raised before any computation starts and never
/// coerced into a "best effort" result.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Ages must satisfy `0 < current < withdrawal <= social security <= target`
    InvalidAges {
        current: u32,
        withdrawal_start: u32,
        social_security_start: u32,
        target: u32,
    },
    RateOutOfRange {
        field: &'static str,
        value: f64,
    },
    NegativeAmount {
        field: &'static str,
        value: f64,
    },
    WeightsDoNotSumToOne {
        sum: f64,
    },
    InstrumentWeightsDoNotSumToOne {
        category: AssetCategory,
        sum: f64,
    },
    NegativeWeight {
        category: AssetCategory,
        weight: f64,
    },
    DuplicateCategory(AssetCategory),
    EmptyAllocationTable,
    InvalidDistributionParameters {
        distribution: &'static str,
        mean: f64,
        std_dev: f64,
        reason: &'static str,
    },
    InvalidRecurrenceInterval,
    /// More records than the identifier type can number
    TooManyRecords {
        kind: &'static str,
        count: usize,
    },
    ZeroTrials,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::InvalidAges {
                current,
                withdrawal_start,
                social_security_start,
                target,
            } => write!(
                f,
                "invalid ages (current={current}, withdrawal_start={withdrawal_start}, \
                 social_security_start={social_security_start}, target={target}): \
                 expected 0 < current < withdrawal_start <= social_security_start <= target"
            ),
            ConfigurationError::RateOutOfRange { field, value } => {
                write!(f, "{field} must be a fraction in [0, 1], got {value}")
            }
            ConfigurationError::NegativeAmount { field, value } => {
                write!(f, "{field} must be non-negative and finite, got {value}")
            }
            ConfigurationError::WeightsDoNotSumToOne { sum } => {
                write!(f, "category weights sum to {sum}, expected 1.0")
            }
            ConfigurationError::InstrumentWeightsDoNotSumToOne { category, sum } => {
                write!(f, "instrument weights for {category} sum to {sum}, expected 1.0")
            }
            ConfigurationError::NegativeWeight { category, weight } => {
                write!(f, "weight for {category} is negative ({weight})")
            }
            ConfigurationError::DuplicateCategory(category) => {
                write!(f, "category {category} appears more than once in the allocation table")
            }
            ConfigurationError::EmptyAllocationTable => write!(f, "allocation table is empty"),
            ConfigurationError::InvalidDistributionParameters {
                distribution,
                mean,
                std_dev,
                reason,
            } => write!(
                f,
                "invalid {distribution} parameters (mean={mean}, std_dev={std_dev}): {reason}"
            ),
            ConfigurationError::InvalidRecurrenceInterval => {
                write!(f, "multi-year recurrence interval must be at least one year")
            }
            ConfigurationError::TooManyRecords { kind, count } => write!(
                f,
                "{count} {kind} exceed the limit of {} per snapshot",
                usize::from(u16::MAX) + 1
            ),
            ConfigurationError::ZeroTrials => {
                write!(f, "Monte Carlo simulation needs at least one trial")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

pub type Result<T> = std::result::Result<T, ConfigurationError>;

/// Check that `value` is a finite fraction in [0, 1].
pub(crate) fn check_rate(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::RateOutOfRange { field, value })
    }
}

/// Check that `value` is finite and non-negative.
pub(crate) fn check_amount(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::NegativeAmount { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_rate_bounds() {
        assert!(check_rate("inflation_rate", 0.0).is_ok());
        assert!(check_rate("inflation_rate", 1.0).is_ok());
        assert!(check_rate("inflation_rate", -0.01).is_err());
        assert!(check_rate("inflation_rate", f64::NAN).is_err());
    }

    #[test]
    fn test_check_amount_rejects_infinite() {
        assert!(check_amount("quantity", 10.0).is_ok());
        assert_eq!(
            check_amount("quantity", f64::INFINITY),
            Err(ConfigurationError::NegativeAmount {
                field: "quantity",
                value: f64::INFINITY
            })
        );
    }

    #[test]
    fn test_display_mentions_field() {
        let err = ConfigurationError::RateOutOfRange {
            field: "blended_tax_rate",
            value: 1.5,
        };
        assert!(err.to_string().contains("blended_tax_rate"));
    }
}
