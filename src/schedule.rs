use std::fmt;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Time-of-day slot that drives which entries are preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Friday,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 5] = [
        TimeSlot::Friday,
        TimeSlot::Morning,
        TimeSlot::Afternoon,
        TimeSlot::Evening,
        TimeSlot::Night,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TimeSlot::Friday => "friday",
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Evening => "evening",
            TimeSlot::Night => "night",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify an instant by its own local weekday and hour.
///
/// Friday overrides every hour-based rule.
pub fn classify<Tz: TimeZone>(instant: &DateTime<Tz>) -> TimeSlot {
    if instant.weekday() == Weekday::Fri {
        return TimeSlot::Friday;
    }

    match instant.hour() {
        5..=11 => TimeSlot::Morning,
        12..=16 => TimeSlot::Afternoon,
        17..=19 => TimeSlot::Evening,
        _ => TimeSlot::Night,
    }
}

/// Period of the supplementary morning/evening azkar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AzkarPeriod {
    Morning,
    Evening,
}

impl AzkarPeriod {
    /// Arabic heading shown above the supplementary list.
    pub fn title(&self) -> &'static str {
        match self {
            AzkarPeriod::Morning => "أذكار الصباح",
            AzkarPeriod::Evening => "أذكار المساء",
        }
    }
}

/// Which supplementary set is shown at this instant, if any.
///
/// Unlike [`classify`], this is purely hour based and ignores Friday.
pub fn azkar_period<Tz: TimeZone>(instant: &DateTime<Tz>) -> Option<AzkarPeriod> {
    match instant.hour() {
        5..=11 => Some(AzkarPeriod::Morning),
        17..=19 => Some(AzkarPeriod::Evening),
        _ => None,
    }
}

/// 12-hour wall-clock text, e.g. `"9:05 PM"`; midnight renders as 12.
pub fn format_clock<Tz: TimeZone>(instant: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    instant.format("%-I:%M %p").to_string()
}
