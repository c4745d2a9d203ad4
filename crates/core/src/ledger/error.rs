//! Ledger error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while validating or recomputing a provider budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Budget amounts must not be negative.
    #[error("Budget amount cannot be negative: {0}")]
    NegativeBudget(Decimal),

    /// Daily rate must not be negative.
    #[error("Daily rate cannot be negative: {0}")]
    NegativeDailyRate(Decimal),

    /// Contract end precedes its start.
    #[error("Contract period ends ({end}) before it starts ({start})")]
    InvalidContractPeriod {
        /// Contract start date.
        start: NaiveDate,
        /// Contract end date.
        end: NaiveDate,
    },
}

impl LedgerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        400
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeBudget(_) => "NEGATIVE_BUDGET",
            Self::NegativeDailyRate(_) => "NEGATIVE_DAILY_RATE",
            Self::InvalidContractPeriod { .. } => "INVALID_CONTRACT_PERIOD",
        }
    }
}
