//! Arithmetic (tabular) Hijri calendar conversion.
//!
//! Uses the civil epoch (1 Muharram 1 AH = Friday 16 July 622, Julian) and the
//! 30-year intercalation cycle with leap years 2, 5, 7, 10, 13, 16, 18, 21, 24,
//! 26 and 29. Dates are exchanged with chrono through Julian Day Numbers.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Julian Day Number of 1 Muharram 1 AH.
const HIJRI_EPOCH_JDN: i64 = 1_948_440;

/// Offset between a Julian Day Number and chrono's day count from 0001-01-01.
const CE_JDN_OFFSET: i64 = 1_721_425;

/// Smallest supported lunar year.
pub const MIN_YEAR: i32 = 1;

/// Largest supported lunar year.
pub const MAX_YEAR: i32 = 9999;

/// Errors raised when a lunar date cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HijriError {
    /// Year outside the supported range.
    #[error("lunar year {0} is outside the supported range")]
    YearOutOfRange(i32),

    /// Month outside 1..=12.
    #[error("lunar month {0} does not exist")]
    InvalidMonth(u32),

    /// Day outside the month length.
    #[error("day {day} does not exist in lunar month {month} of year {year}")]
    InvalidDay {
        /// Lunar year.
        year: i32,
        /// Lunar month.
        month: u32,
        /// Requested day.
        day: u32,
    },

    /// The Gregorian result cannot be represented.
    #[error("converted date is outside the representable Gregorian range")]
    GregorianOutOfRange,
}

/// A validated date on the lunar calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HijriDate {
    year: i32,
    month: u32,
    day: u32,
}

impl HijriDate {
    /// Builds a lunar date, validating year, month and day.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, HijriError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(HijriError::YearOutOfRange(year));
        }
        if !(1..=12).contains(&month) {
            return Err(HijriError::InvalidMonth(month));
        }
        if day == 0 || day > month_length(year, month) {
            return Err(HijriError::InvalidDay { year, month, day });
        }
        Ok(Self { year, month, day })
    }

    /// Lunar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Lunar month (1-based).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Day of the lunar month (1-based).
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Converts to the proleptic Gregorian calendar.
    pub fn to_gregorian(&self) -> Result<NaiveDate, HijriError> {
        let jdn = to_jdn(i64::from(self.year), self.month, self.day);
        i32::try_from(jdn - CE_JDN_OFFSET)
            .ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .ok_or(HijriError::GregorianOutOfRange)
    }

    /// Converts a Gregorian date to the lunar calendar.
    ///
    /// Fails for dates before the lunar epoch or past the supported range.
    pub fn from_gregorian(date: NaiveDate) -> Result<Self, HijriError> {
        let year = lunar_year_containing(date);
        let year = i32::try_from(year).map_err(|_| HijriError::GregorianOutOfRange)?;
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(HijriError::YearOutOfRange(year));
        }

        let jdn = gregorian_jdn(date);
        let month = (1..=12u32)
            .rev()
            .find(|&m| to_jdn(i64::from(year), m, 1) <= jdn)
            .unwrap_or(1);
        let first_of_month = to_jdn(i64::from(year), month, 1);
        let day = u32::try_from(jdn - first_of_month + 1).map_err(|_| HijriError::InvalidDay {
            year,
            month,
            day: 0,
        })?;

        Self::new(year, month, day)
    }
}

/// Returns true when the lunar year has 355 days.
#[must_use]
pub fn is_leap_year(year: i32) -> bool {
    (14 + 11 * i64::from(year)).rem_euclid(30) < 11
}

/// Number of days in a lunar month.
#[must_use]
pub fn month_length(year: i32, month: u32) -> u32 {
    if month % 2 == 1 || (month == 12 && is_leap_year(year)) {
        30
    } else {
        29
    }
}

/// Lunar year (possibly zero or negative) in progress on a Gregorian date.
#[must_use]
pub fn lunar_year_containing(date: NaiveDate) -> i64 {
    let jdn = gregorian_jdn(date);
    let mut year = (30 * (jdn - HIJRI_EPOCH_JDN)).div_euclid(10_631) + 1;
    while to_jdn(year + 1, 1, 1) <= jdn {
        year += 1;
    }
    while to_jdn(year, 1, 1) > jdn {
        year -= 1;
    }
    year
}

fn gregorian_jdn(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) + CE_JDN_OFFSET
}

fn to_jdn(year: i64, month: u32, day: u32) -> i64 {
    let month = i64::from(month);
    i64::from(day)
        + (59 * (month - 1) + 1) / 2
        + (year - 1) * 354
        + (3 + 11 * year).div_euclid(30)
        + HIJRI_EPOCH_JDN
        - 1
}
