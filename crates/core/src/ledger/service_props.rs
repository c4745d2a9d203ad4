//! Property-based tests for settlement.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::ledger::service::BudgetLedger;
use crate::ledger::types::ProviderBudget;

/// Amounts with two decimal places, possibly negative.
fn arb_amount(min: i64, max: i64) -> impl Strategy<Value = Decimal> {
    (min..max).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_provider() -> impl Strategy<Value = ProviderBudget> {
    (
        proptest::option::of(arb_amount(0, 100_000_000)),
        arb_amount(0, 50_000_000),
        proptest::option::of(arb_amount(0, 500_000)),
    )
        .prop_map(|(budget_total, realisation, budget_jour_homme)| ProviderBudget {
            budget_total,
            realisation,
            solde: None,
            budget_jour_homme,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Realisation and solde are never negative after settlement.
    #[test]
    fn prop_settlement_never_negative(
        provider in arb_provider(),
        cost in arb_amount(-100_000_000, 100_000_000),
    ) {
        let s = BudgetLedger::settle(&provider, cost);
        prop_assert!(s.realisation >= Decimal::ZERO);
        if let Some(solde) = s.solde {
            prop_assert!(solde >= Decimal::ZERO);
        }
    }

    /// Without clamping, solde plus realisation equals the total budget.
    #[test]
    fn prop_settlement_balances(
        provider in arb_provider(),
        cost in arb_amount(0, 10_000_000),
    ) {
        let s = BudgetLedger::settle(&provider, cost);
        prop_assert_eq!(s.realisation, provider.realisation + cost);
        if let (Some(total), Some(solde), false) = (provider.budget_total, s.solde, s.clamped) {
            prop_assert_eq!(solde + s.realisation, total);
        }
    }

    /// A cost exists only for billable providers and positive durations.
    #[test]
    fn prop_cost_requires_rate_total_and_duration(
        provider in arb_provider(),
        duration in arb_amount(-1_000, 100_000),
    ) {
        let cost = BudgetLedger::settlement_cost(&provider, duration);
        prop_assert_eq!(
            cost.is_some(),
            provider.is_billable() && duration > Decimal::ZERO
        );
    }
}
