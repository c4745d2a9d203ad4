//! Derived provider contract figures.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::ledger::error::LedgerError;

/// Days per contract year.
const DAYS_PER_YEAR: i64 = 365;

/// Figures derived from a provider's contract period and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTerms {
    /// Contract length in 365-day years, 2 dp.
    pub contract_years: Decimal,
    /// Budget per contract year, 2 dp. Zero for a same-day contract.
    pub annual_amount: Decimal,
    /// `budget_total - realisation`, 2 dp, floored at zero.
    pub solde: Decimal,
}

impl ContractTerms {
    /// Computes contract figures.
    ///
    /// The annual amount divides by the unrounded contract length. A budget
    /// already overspent leaves a solde of zero.
    pub fn compute(
        start: NaiveDate,
        end: NaiveDate,
        budget_total: Decimal,
        realisation: Decimal,
    ) -> Result<Self, LedgerError> {
        if end < start {
            return Err(LedgerError::InvalidContractPeriod { start, end });
        }
        if budget_total < Decimal::ZERO {
            return Err(LedgerError::NegativeBudget(budget_total));
        }

        let days = Decimal::from((end - start).num_days());
        let years = days / Decimal::from(DAYS_PER_YEAR);
        let annual_amount = if years > Decimal::ZERO {
            budget_total / years
        } else {
            Decimal::ZERO
        };

        let mut solde = budget_total - realisation;
        if solde < Decimal::ZERO {
            tracing::warn!(
                %budget_total,
                %realisation,
                "Budget below realisation; solde clamped to zero"
            );
            solde = Decimal::ZERO;
        }

        Ok(Self {
            contract_years: round2(years),
            annual_amount: round2(annual_amount),
            solde: round2(solde),
        })
    }

    /// Computes contract figures when every input is present.
    pub fn compute_if_complete(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        budget_total: Option<Decimal>,
        realisation: Decimal,
    ) -> Result<Option<Self>, LedgerError> {
        match (start, end, budget_total) {
            (Some(start), Some(end), Some(total)) => {
                Self::compute(start, end, total, realisation).map(Some)
            }
            _ => Ok(None),
        }
    }
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_three_year_contract() {
        let terms =
            ContractTerms::compute(ymd(2024, 1, 1), ymd(2026, 12, 31), dec!(300000), dec!(1000))
                .unwrap();
        // 1095 days
        assert_eq!(terms.contract_years, dec!(3.00));
        assert_eq!(terms.annual_amount, dec!(100000.00));
        assert_eq!(terms.solde, dec!(299000.00));
    }

    #[test]
    fn test_annual_amount_uses_unrounded_years() {
        // 200 days = 0.547945... years
        let terms =
            ContractTerms::compute(ymd(2025, 1, 1), ymd(2025, 7, 20), dec!(1000), dec!(0)).unwrap();
        assert_eq!(terms.contract_years, dec!(0.55));
        assert_eq!(terms.annual_amount, dec!(1825.00));
    }

    #[test]
    fn test_same_day_contract_has_zero_annual_amount() {
        let terms =
            ContractTerms::compute(ymd(2025, 1, 1), ymd(2025, 1, 1), dec!(1000), dec!(0)).unwrap();
        assert_eq!(terms.contract_years, dec!(0));
        assert_eq!(terms.annual_amount, dec!(0));
    }

    #[test]
    fn test_budget_below_realisation_floors_solde() {
        let terms =
            ContractTerms::compute(ymd(2024, 1, 1), ymd(2025, 1, 1), dec!(100), dec!(300)).unwrap();
        assert_eq!(terms.solde, dec!(0));
        assert_eq!(terms.annual_amount, dec!(99.73));
    }

    #[test]
    fn test_rejects_reversed_period() {
        let err = ContractTerms::compute(ymd(2025, 1, 2), ymd(2025, 1, 1), dec!(1000), dec!(0))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidContractPeriod { .. }));
    }

    #[test]
    fn test_incomplete_inputs_yield_none() {
        assert_eq!(
            ContractTerms::compute_if_complete(Some(ymd(2025, 1, 1)), None, Some(dec!(1)), dec!(0)),
            Ok(None)
        );
    }
}
