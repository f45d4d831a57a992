//! Data layer for the plan file and saved scenarios

pub mod plan_data;
pub mod storage;

pub use plan_data::{AccountData, ExpenseData, PlanData};
pub use storage::{DataDirectory, StorageError, load_overrides};
