//! Provider budget types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Budget figures of a provider, as seen by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderBudget {
    /// Contracted total budget.
    pub budget_total: Option<Decimal>,
    /// Amount consumed so far.
    pub realisation: Decimal,
    /// Cached remaining balance.
    pub solde: Option<Decimal>,
    /// Daily (man-day) rate.
    pub budget_jour_homme: Option<Decimal>,
}

impl ProviderBudget {
    /// Returns true when both the daily rate and the total budget are set.
    #[must_use]
    pub fn is_billable(&self) -> bool {
        self.budget_jour_homme.is_some() && self.budget_total.is_some()
    }
}

/// Result of settling a cost against a provider budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Cost charged.
    pub cost: Decimal,
    /// Consumption before the charge.
    pub previous_realisation: Decimal,
    /// Consumption after the charge (never negative).
    pub realisation: Decimal,
    /// Remaining balance after the charge (never negative).
    pub solde: Option<Decimal>,
    /// True when a negative value had to be floored at zero.
    pub clamped: bool,
}

impl Settlement {
    /// Applies the settled figures to a budget.
    pub fn apply_to(&self, budget: &mut ProviderBudget) {
        budget.realisation = self.realisation;
        budget.solde = self.solde;
    }
}
