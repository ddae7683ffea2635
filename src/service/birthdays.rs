//! Birthday window arithmetic
//!
//! A birthday on February 29 is celebrated on February 28 in non-leap years.

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeSet;

/// Upper bound for the `days` window
pub const MAX_WINDOW_DAYS: i64 = 365;

/// Default window when the caller gives none
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// The date a birthday is observed in `year`
fn occurrence_in(birthday: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day() - 1))
        .unwrap_or(birthday)
}

/// First observed birthday on or after `today`
pub fn next_birthday(birthday: NaiveDate, today: NaiveDate) -> NaiveDate {
    let this_year = occurrence_in(birthday, today.year());
    if this_year >= today {
        this_year
    } else {
        occurrence_in(birthday, today.year() + 1)
    }
}

/// `MM-DD` keys of every stored birthday observed within `today..=today+days`
pub fn window_keys(today: NaiveDate, days: i64) -> Vec<String> {
    let mut keys = BTreeSet::new();

    for offset in 0..=days {
        let date = today + Duration::days(offset);
        keys.insert(date.format("%m-%d").to_string());

        if date.month() == 2 && date.day() == 28 && !is_leap_year(date.year()) {
            keys.insert("02-29".to_string());
        }
    }

    keys.into_iter().collect()
}
