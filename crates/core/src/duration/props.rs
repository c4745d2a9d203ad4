//! Property-based tests for working-day counting.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::DurationAccumulator;

/// Instants between 2000 and 2040 at whole-hour resolution.
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..(40 * 366 * 24)).prop_map(|hours| {
        Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    })
}

/// Weekday count in `[from, until)`, ignoring holidays.
fn weekdays(from: NaiveDate, until: NaiveDate) -> i64 {
    from.iter_days()
        .take_while(|d| *d < until)
        .filter(|d| d.weekday().num_days_from_monday() < 5)
        .count()
        .try_into()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A zero-length interval never counts.
    #[test]
    fn prop_same_instant_is_zero(t in arb_instant()) {
        let acc = DurationAccumulator::default();
        prop_assert_eq!(acc.working_days_between(t, t), Decimal::ZERO);
    }

    /// Reversed intervals clamp to zero.
    #[test]
    fn prop_reversed_is_zero(a in arb_instant(), b in arb_instant()) {
        prop_assume!(a > b);
        let acc = DurationAccumulator::default();
        prop_assert_eq!(acc.working_days_between(a, b), Decimal::ZERO);
    }

    /// Holidays only ever remove days from the plain weekday count.
    #[test]
    fn prop_bounded_by_weekdays(start in arb_instant(), span_days in 0i64..120) {
        let end = start + Duration::days(span_days);
        let acc = DurationAccumulator::default();
        let counted = acc.working_days_between(start, end);
        let plain = weekdays(start.date_naive(), end.date_naive());
        prop_assert!(counted >= Decimal::ZERO);
        prop_assert!(counted <= Decimal::from(plain));
    }

    /// Splitting an interval at any point loses no working day.
    #[test]
    fn prop_additive_over_split(
        start in arb_instant(),
        first in 0i64..60,
        second in 0i64..60,
    ) {
        let mid = start + Duration::days(first);
        let end = mid + Duration::days(second);
        let acc = DurationAccumulator::default();
        prop_assert_eq!(
            acc.working_days_between(start, mid) + acc.working_days_between(mid, end),
            acc.working_days_between(start, end)
        );
    }

    /// A full week never yields more than five working days.
    #[test]
    fn prop_week_at_most_five(start in arb_instant()) {
        let acc = DurationAccumulator::default();
        let days = acc.working_days_between(start, start + Duration::days(7));
        prop_assert!(days <= Decimal::from(5));
    }
}
