//! Business calendar for audit time accounting.
//!
//! A working day is a Monday to Friday that is not a public holiday. Public
//! holidays are either fixed Gregorian dates or religious dates on the
//! arithmetic lunar calendar, converted into the Gregorian year on demand.
//!
//! # Modules
//!
//! - `hijri` - Tabular lunar calendar conversion
//! - `holidays` - Fixed and lunar holiday tables

pub mod hijri;
pub mod holidays;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Weekday};
use moka::sync::Cache;

pub use hijri::{HijriDate, HijriError};
pub use holidays::{FIXED_HOLIDAYS, LUNAR_HOLIDAYS, holidays_for_year};

/// Default number of memoized years.
const DEFAULT_CACHE_CAPACITY: u64 = 64;

/// Default time-to-live for a memoized year (24 hours).
const DEFAULT_TTL_SECS: u64 = 86_400;

/// Holiday set for one Gregorian year.
pub type HolidaySet = Arc<BTreeSet<NaiveDate>>;

/// Business calendar with per-year holiday memoization.
///
/// Cloning is cheap and clones share the same cache. Holiday sets are pure
/// functions of the year, so concurrent recomputation of the same year is
/// harmless.
#[derive(Clone)]
pub struct BusinessCalendar {
    cache: Cache<i32, HolidaySet>,
}

impl BusinessCalendar {
    /// Creates a calendar with default cache settings (64 years, 24 hour TTL).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a calendar with a custom cache capacity and TTL.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Returns the holiday set for `year`, computing it on a cache miss.
    pub fn holidays(&self, year: i32) -> HolidaySet {
        self.cache.get_with(year, || {
            let set = holidays_for_year(year);
            tracing::debug!(year, count = set.len(), "Computed holiday set");
            Arc::new(set)
        })
    }

    /// Returns true if `date` is a public holiday.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays(date.year()).contains(&date)
    }

    /// Returns true if `date` is a weekday and not a public holiday.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !self.is_holiday(date)
    }

    /// Drops every memoized year.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Number of memoized years.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending cache maintenance.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true for Saturday and Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_memoizes_per_year() {
        let calendar = BusinessCalendar::new();
        let first = calendar.holidays(2024);
        let second = calendar.holidays(2024);
        assert!(Arc::ptr_eq(&first, &second));

        calendar.run_pending_tasks();
        assert_eq!(calendar.entry_count(), 1);
    }

    #[test]
    fn test_memoized_matches_direct_computation() {
        let calendar = BusinessCalendar::with_config(4, 60);
        assert_eq!(*calendar.holidays(2025), holidays_for_year(2025));
    }

    #[test]
    fn test_invalidate_all_recomputes() {
        let calendar = BusinessCalendar::default();
        let first = calendar.holidays(2024);
        calendar.invalidate_all();
        calendar.run_pending_tasks();
        let second = calendar.holidays(2024);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
    }

    #[test]
    fn test_working_day_rules() {
        let calendar = BusinessCalendar::new();
        // Wednesday
        assert!(calendar.is_working_day(ymd(2024, 3, 6)));
        // Saturday
        assert!(!calendar.is_working_day(ymd(2024, 3, 9)));
        // Wednesday, Labour Day
        assert!(!calendar.is_working_day(ymd(2024, 5, 1)));
        // Wednesday, Eid al-Fitr
        assert!(!calendar.is_working_day(ymd(2024, 4, 10)));
    }

    #[test]
    fn test_is_weekend() {
        assert!(is_weekend(ymd(2024, 3, 9)));
        assert!(is_weekend(ymd(2024, 3, 10)));
        assert!(!is_weekend(ymd(2024, 3, 11)));
    }
}
