//! Gregorian to Hijri conversion
//!
//! Implements the tabular Islamic calendar: a fixed 30-year cycle of 19
//! common years (354 days) and 11 leap years (355 days). Dates are routed
//! through the Julian Day Number and counted from 1 Muharram 1 AH.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Julian Day of 1 Muharram 1 AH (16 July 622, Julian calendar).
pub const HIJRI_EPOCH_JD: f64 = 1948439.5;

/// Days in one complete 30-year cycle (19 * 354 + 11 * 355).
const CYCLE_DAYS: i64 = 10631;

/// Zero-indexed positions of the 355-day years within a cycle.
const LEAP_POSITIONS: [i64; 11] = [1, 4, 6, 9, 12, 15, 17, 20, 23, 25, 28];

pub const MONTH_NAMES: [&str; 12] = [
    "محرم",
    "صفر",
    "ربيع الأول",
    "ربيع الثاني",
    "جمادى الأولى",
    "جمادى الثانية",
    "رجب",
    "شعبان",
    "رمضان",
    "شوال",
    "ذو القعدة",
    "ذو الحجة",
];

/// A date in the Hijri calendar.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HijriDate {
    year: i64,
    month: u32,
    day: u32,
}

impl HijriDate {
    /// Build a date from its parts.
    ///
    /// Only the calendar-agnostic ranges are checked (month 1-12, day 1-30),
    /// so dates from observation-based calendars are accepted as well.
    pub fn new(year: i64, month: u32, day: u32) -> Option<Self> {
        if !(1..=12).contains(&month) || !(1..=30).contains(&day) {
            return None;
        }
        Some(Self { year, month, day })
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }
}

impl fmt::Display for HijriDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} هـ", self.day, self.month_name(), self.year)
    }
}

/// Whether `year` is one of the 355-day years of its cycle.
pub fn is_leap_year(year: i64) -> bool {
    LEAP_POSITIONS.contains(&(year - 1).rem_euclid(30))
}

pub fn year_length(year: i64) -> i64 {
    if is_leap_year(year) { 355 } else { 354 }
}

/// Length of a month: odd months have 30 days, even months 29, and the
/// twelfth month gains a day in leap years.
pub fn month_length(year: i64, month: u32) -> u32 {
    match month {
        12 if is_leap_year(year) => 30,
        m if m % 2 == 1 => 30,
        _ => 29,
    }
}

/// Total days in all years before `year` (i.e. the day offset of 1 Muharram `year`).
pub fn cumulative_days(year: i64) -> i64 {
    let elapsed = (year - 1).max(0);
    let partial: i64 = (0..elapsed % 30)
        .map(|pos| if LEAP_POSITIONS.contains(&pos) { 355 } else { 354 })
        .sum();
    (elapsed / 30) * CYCLE_DAYS + partial
}

/// Julian Day at midnight of a proleptic Gregorian date.
pub fn julian_day(date: NaiveDate) -> f64 {
    let (mut year, mut month) = (i64::from(date.year()), i64::from(date.month()));
    if month <= 2 {
        year -= 1;
        month += 12;
    }
    let century = year.div_euclid(100);
    let correction = 2 - century + century.div_euclid(4);

    (365.25 * (year + 4716) as f64).floor()
        + (30.6001 * (month + 1) as f64).floor()
        + f64::from(date.day())
        + correction as f64
        - 1524.5
}

/// Whole days elapsed since the Hijri epoch. Dates before the epoch saturate to 0.
pub fn days_since_epoch(date: NaiveDate) -> i64 {
    ((julian_day(date) - HIJRI_EPOCH_JD).floor() as i64).max(0)
}

/// Convert a Gregorian date to the tabular Hijri calendar.
pub fn gregorian_to_hijri(date: NaiveDate) -> HijriDate {
    let (year, month, raw_day) = locate(days_since_epoch(date));
    let length = month_length(year, month);

    let day = raw_day.clamp(1, i64::from(length)) as u32;
    if i64::from(day) != raw_day {
        tracing::warn!(
            %date,
            raw_day,
            year,
            month,
            "Hijri day outside month bounds, clamped"
        );
    }

    HijriDate { year, month, day }
}

/// Resolve an epoch offset into (year, month, unclamped day).
fn locate(days: i64) -> (i64, u32, i64) {
    let year = find_year(days);
    let remaining = days - cumulative_days(year);

    let mut month = 1;
    let mut days_before_month = 0;
    while month < 12 && days_before_month + i64::from(month_length(year, month)) <= remaining {
        days_before_month += i64::from(month_length(year, month));
        month += 1;
    }

    (year, month, remaining - days_before_month + 1)
}

/// Largest year whose first day is on or before `days`.
fn find_year(days: i64) -> i64 {
    // cumulative_days(days / 354 + 2) > days always holds, bounding the search.
    let mut low = 1;
    let mut high = days / 354 + 2;
    while low < high {
        let mid = low + (high - low) / 2;
        if cumulative_days(mid) <= days {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low - 1
}
