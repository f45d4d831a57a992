//! Command-line front end for the nestegg projection engine
//!
//! Loads a YAML plan from the data directory, runs one engine operation per
//! command and prints the result as JSON. Logs go to a rotating file in the
//! data directory.

pub mod commands;
pub mod data;
pub mod logging;

pub use commands::{Command, run};
pub use data::{DataDirectory, PlanData, StorageError};
pub use logging::init_logging;
