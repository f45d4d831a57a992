//! Unique identifiers for planning entities
//!
//! Each entity type has its own ID type to provide type safety and prevent
//! mixing up different kinds of identifiers.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, Result};

/// Unique identifier for an Account within a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u16);

/// Unique identifier for an Expense ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExpenseId(pub u16);

fn index_to_id(kind: &'static str, index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| ConfigurationError::TooManyRecords {
        kind,
        count: index + 1,
    })
}

impl AccountId {
    /// ID for the account at `index` in file or builder order
    pub fn from_index(index: usize) -> Result<Self> {
        index_to_id("accounts", index).map(Self)
    }
}

impl ExpenseId {
    /// ID for the expense at `index` in file or builder order
    pub fn from_index(index: usize) -> Result<Self> {
        index_to_id("expenses", index).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_from_index() {
        assert_eq!(AccountId::from_index(0), Ok(AccountId(0)));
        assert_eq!(ExpenseId::from_index(65_535), Ok(ExpenseId(u16::MAX)));
        assert_eq!(
            ExpenseId::from_index(65_536),
            Err(ConfigurationError::TooManyRecords {
                kind: "expenses",
                count: 65_537
            })
        );
    }
}
