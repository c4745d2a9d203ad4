//! Provider budget ledger.
//!
//! # Modules
//!
//! - `types` - Budget figures and settlement results
//! - `service` - Settlement of audit cost
//! - `contract` - Derived contract figures
//! - `error` - Ledger error types

pub mod contract;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use contract::ContractTerms;
pub use error::LedgerError;
pub use service::BudgetLedger;
pub use types::{ProviderBudget, Settlement};
