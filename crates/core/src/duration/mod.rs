//! Working-day duration accumulation.
//!
//! Elapsed audit time is measured in whole working days over the half-open
//! date range `[start.date, end.date)`: the end date itself never counts.

#[cfg(test)]
mod props;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::calendar::BusinessCalendar;

/// Counts working days between instants using a [`BusinessCalendar`].
#[derive(Clone, Default)]
pub struct DurationAccumulator {
    calendar: BusinessCalendar,
}

impl DurationAccumulator {
    /// Creates an accumulator over the given calendar.
    #[must_use]
    pub const fn new(calendar: BusinessCalendar) -> Self {
        Self { calendar }
    }

    /// The calendar used for holiday lookups.
    #[must_use]
    pub const fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    /// Working days in `[start.date, end.date)`.
    ///
    /// Returns zero when `start > end`. Holiday sets come from the calendar's
    /// per-year cache.
    pub fn working_days_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
        if start > end {
            return Decimal::ZERO;
        }
        Decimal::from(self.count_dates(start.date_naive(), end.date_naive()))
    }

    fn count_dates(&self, from: NaiveDate, until: NaiveDate) -> usize {
        from.iter_days()
            .take_while(|d| *d < until)
            .filter(|d| self.calendar.is_working_day(*d))
            .count()
    }
}
