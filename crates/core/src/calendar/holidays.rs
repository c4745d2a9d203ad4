//! Public holiday tables.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use super::hijri::{self, HijriDate};

/// Public holidays anchored to the Gregorian calendar, as (month, day).
pub const FIXED_HOLIDAYS: [(u32, u32); 8] = [
    (1, 1),   // New Year
    (5, 1),   // Labour Day
    (7, 30),  // Throne Day
    (8, 14),  // Oued Ed-Dahab Day
    (8, 20),  // Revolution of the King and the People
    (8, 21),  // Youth Day
    (11, 6),  // Green March
    (11, 18), // Independence Day
];

/// Religious holidays anchored to the lunar calendar, as (month, day).
pub const LUNAR_HOLIDAYS: [(u32, u32); 7] = [
    (10, 1),  // Eid al-Fitr
    (10, 2),  // Eid al-Fitr, second day
    (12, 10), // Eid al-Adha
    (12, 11), // Eid al-Adha, second day
    (1, 1),   // Islamic New Year
    (3, 12),  // Mawlid
    (1, 10),  // Ashura
];

/// Computes every non-working public holiday falling in `year`.
///
/// A Gregorian year overlaps two lunar years, so each lunar holiday is
/// converted against the lunar year running at year end and the one before
/// it; only results landing in `year` are kept. Lunar dates that fail to
/// convert contribute nothing.
#[must_use]
pub fn holidays_for_year(year: i32) -> BTreeSet<NaiveDate> {
    let mut holidays: BTreeSet<NaiveDate> = FIXED_HOLIDAYS
        .iter()
        .filter_map(|&(month, day)| NaiveDate::from_ymd_opt(year, month, day))
        .collect();

    let Some(year_end) = NaiveDate::from_ymd_opt(year, 12, 31) else {
        return holidays;
    };
    let anchor = hijri::lunar_year_containing(year_end);

    for &(month, day) in &LUNAR_HOLIDAYS {
        for lunar_year in [anchor - 1, anchor] {
            let Ok(lunar_year) = i32::try_from(lunar_year) else {
                continue;
            };
            let converted = HijriDate::new(lunar_year, month, day).and_then(|d| d.to_gregorian());
            match converted {
                Ok(date) if date.year() == year => {
                    holidays.insert(date);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::trace!(year, lunar_year, month, day, error = %e, "Skipping lunar holiday");
                }
            }
        }
    }

    holidays
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(2019)]
    #[case(2024)]
    #[case(2025)]
    #[case(2030)]
    fn test_fixed_holidays_present(#[case] year: i32) {
        let holidays = holidays_for_year(year);
        for (month, day) in FIXED_HOLIDAYS {
            assert!(holidays.contains(&ymd(year, month, day)));
        }
    }

    #[rstest]
    #[case(1990)]
    #[case(2024)]
    #[case(2031)]
    fn test_no_date_outside_year(#[case] year: i32) {
        assert!(holidays_for_year(year).iter().all(|d| d.year() == year));
    }

    #[test]
    fn test_lunar_holidays_2024() {
        let holidays = holidays_for_year(2024);
        for date in [
            ymd(2024, 4, 10),
            ymd(2024, 4, 11),
            ymd(2024, 6, 17),
            ymd(2024, 6, 18),
            ymd(2024, 7, 8),
            ymd(2024, 7, 17),
            ymd(2024, 9, 16),
        ] {
            assert!(holidays.contains(&date), "missing {date}");
        }
        assert_eq!(holidays.len(), 15);
    }

    #[test]
    fn test_lunar_new_year_of_previous_cycle_excluded() {
        // 1 Muharram 1445 fell in July 2023 and must not leak into 2024.
        let holidays = holidays_for_year(2024);
        assert!(!holidays.contains(&ymd(2023, 7, 19)));
    }

    #[test]
    fn test_years_before_lunar_epoch_have_only_fixed_holidays() {
        assert_eq!(holidays_for_year(500).len(), FIXED_HOLIDAYS.len());
    }
}
