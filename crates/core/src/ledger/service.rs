//! Settlement of audit cost against provider budgets.

use rust_decimal::Decimal;

use crate::ledger::types::{ProviderBudget, Settlement};

/// Stateless service charging completed audit work to a provider.
pub struct BudgetLedger;

impl BudgetLedger {
    /// Cost of `duration` working days at the provider's daily rate.
    ///
    /// Returns `None` when nothing should be settled: the provider lacks a
    /// daily rate or a total budget, or the duration is not positive.
    #[must_use]
    pub fn settlement_cost(provider: &ProviderBudget, duration: Decimal) -> Option<Decimal> {
        if duration <= Decimal::ZERO || provider.budget_total.is_none() {
            return None;
        }
        provider.budget_jour_homme.map(|rate| duration * rate)
    }

    /// Charges `cost` to the provider.
    ///
    /// `realisation` grows by `cost` and `solde` becomes
    /// `budget_total - realisation`, both computed from the raw sum. Each is
    /// then floored at zero on its own. The floor is a safety net against
    /// inconsistent inputs, not a financial rule, so it is logged whenever
    /// it fires.
    #[must_use]
    pub fn settle(provider: &ProviderBudget, cost: Decimal) -> Settlement {
        let mut clamped = false;

        let raw_realisation = provider.realisation + cost;
        let solde = provider.budget_total.map(|total| {
            let solde = total - raw_realisation;
            if solde < Decimal::ZERO {
                tracing::warn!(
                    %solde,
                    %total,
                    realisation = %raw_realisation,
                    "Budget overrun; solde clamped to zero"
                );
                clamped = true;
                Decimal::ZERO
            } else {
                solde
            }
        });

        let realisation = if raw_realisation < Decimal::ZERO {
            tracing::warn!(
                realisation = %raw_realisation,
                %cost,
                "Realisation went negative; clamped to zero"
            );
            clamped = true;
            Decimal::ZERO
        } else {
            raw_realisation
        };

        Settlement {
            cost,
            previous_realisation: provider.realisation,
            realisation,
            solde,
            clamped,
        }
    }
}
