//! Training data ingestion
//!
//! Discovers heterogeneous CSV sources, merges and cleans them into one
//! table, and balances class counts by oversampling.

mod balance;
mod loader;
mod synthetic;

pub use balance::{balance_by_oversample, DEFAULT_BALANCE_SEED};
pub use loader::{DatasetLoader, DIR_OVERRIDE_ENV, GLOB_OVERRIDE_ENV, LABEL_ALIASES};
pub use synthetic::generate_balanced;
