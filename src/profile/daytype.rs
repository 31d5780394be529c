//! Day-type and time-slot classification.
//!
//! A small, explicit state machine over calendar date and time of day:
//! [`classify_day`] picks the (season, day-kind) pair that keys the shape
//! tables, [`classify_slot`] picks the scaling slot for the industrial
//! shaper. Both are pure functions, testable without any generation logic.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::HolidayCalendar;
use crate::error::{Error, Result};
use crate::profile::industrial::BusinessWindow;

/// Season bands of the standard load profiles.
///
/// Boundaries follow the BDEW convention: winter from November 1st to
/// March 20th, summer from May 15th to September 14th, transition
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Summer,
    Transition,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Season::Winter => "winter",
            Season::Summer => "summer",
            Season::Transition => "transition",
        };
        f.write_str(s)
    }
}

impl FromStr for Season {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "summer" => Ok(Season::Summer),
            "transition" => Ok(Season::Transition),
            other => Err(Error::Shape(format!("unknown season \"{other}\""))),
        }
    }
}

/// Weekly day kind selecting the intraday shape.
///
/// Public holidays are classified as [`DayKind::Sunday`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    Weekday,
    Saturday,
    Sunday,
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayKind::Weekday => "weekday",
            DayKind::Saturday => "saturday",
            DayKind::Sunday => "sunday",
        };
        f.write_str(s)
    }
}

impl FromStr for DayKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekday" => Ok(DayKind::Weekday),
            "saturday" => Ok(DayKind::Saturday),
            "sunday" => Ok(DayKind::Sunday),
            other => Err(Error::Shape(format!("unknown day kind \"{other}\""))),
        }
    }
}

/// Complete day classification keying a shape lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayClass {
    pub season: Season,
    pub kind: DayKind,
}

/// Scaling slot of the industrial rectangular profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSlot {
    WeekDay,
    WeekNight,
    WeekendDay,
    WeekendNight,
}

/// BDEW season band of `date`.
pub fn season_of(date: NaiveDate) -> Season {
    let md = (date.month(), date.day());
    if md >= (11, 1) || md <= (3, 20) {
        Season::Winter
    } else if ((5, 15)..=(9, 14)).contains(&md) {
        Season::Summer
    } else {
        Season::Transition
    }
}

/// Classifies a calendar day for shape-table lookup.
///
/// Holidays select the Sunday shape regardless of the actual weekday.
pub fn classify_day(date: NaiveDate, calendar: &HolidayCalendar) -> DayClass {
    let kind = if calendar.is_holiday(date) {
        DayKind::Sunday
    } else {
        match date.weekday() {
            Weekday::Sat => DayKind::Saturday,
            Weekday::Sun => DayKind::Sunday,
            _ => DayKind::Weekday,
        }
    };
    DayClass {
        season: season_of(date),
        kind,
    }
}

/// Classifies an instant for the industrial shaper.
///
/// Saturdays, Sundays, and holidays count as weekend; the business window
/// separates day from night.
pub fn classify_slot(
    at: NaiveDateTime,
    window: &BusinessWindow,
    calendar: &HolidayCalendar,
) -> TimeSlot {
    let weekend = matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
        || calendar.is_holiday(at.date());
    let day = window.contains(at.time());
    match (weekend, day) {
        (false, true) => TimeSlot::WeekDay,
        (false, false) => TimeSlot::WeekNight,
        (true, true) => TimeSlot::WeekendDay,
        (true, false) => TimeSlot::WeekendNight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Region;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("test date")
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).expect("test time")
    }

    #[test]
    fn season_boundaries() {
        assert_eq!(season_of(date(2013, 3, 20)), Season::Winter);
        assert_eq!(season_of(date(2013, 3, 21)), Season::Transition);
        assert_eq!(season_of(date(2013, 5, 14)), Season::Transition);
        assert_eq!(season_of(date(2013, 5, 15)), Season::Summer);
        assert_eq!(season_of(date(2013, 9, 14)), Season::Summer);
        assert_eq!(season_of(date(2013, 9, 15)), Season::Transition);
        assert_eq!(season_of(date(2013, 10, 31)), Season::Transition);
        assert_eq!(season_of(date(2013, 11, 1)), Season::Winter);
    }

    #[test]
    fn weekdays_saturdays_sundays() {
        let cal = HolidayCalendar::empty(2013);
        // 2013-07-01 is a Monday.
        assert_eq!(classify_day(date(2013, 7, 1), &cal).kind, DayKind::Weekday);
        assert_eq!(classify_day(date(2013, 7, 6), &cal).kind, DayKind::Saturday);
        assert_eq!(classify_day(date(2013, 7, 7), &cal).kind, DayKind::Sunday);
    }

    #[test]
    fn holiday_reclassified_as_sunday() {
        let cal = HolidayCalendar::for_year(2013, Region::Germany).expect("calendar");
        // 2013-10-03 (Day of German Unity) is a Thursday.
        let class = classify_day(date(2013, 10, 3), &cal);
        assert_eq!(class.kind, DayKind::Sunday);
        let plain = classify_day(date(2013, 10, 3), &HolidayCalendar::empty(2013));
        assert_eq!(plain.kind, DayKind::Weekday);
    }

    #[test]
    fn slot_classification_default_window() {
        let cal = HolidayCalendar::empty(2013);
        let window = BusinessWindow::default();
        // Monday inside / outside the window.
        assert_eq!(
            classify_slot(at(2013, 7, 1, 12, 0), &window, &cal),
            TimeSlot::WeekDay
        );
        assert_eq!(
            classify_slot(at(2013, 7, 1, 23, 0), &window, &cal),
            TimeSlot::WeekNight
        );
        // Half-open window: 06:00 is day, 22:00 already night.
        assert_eq!(
            classify_slot(at(2013, 7, 1, 6, 0), &window, &cal),
            TimeSlot::WeekDay
        );
        assert_eq!(
            classify_slot(at(2013, 7, 1, 22, 0), &window, &cal),
            TimeSlot::WeekNight
        );
        // Saturday.
        assert_eq!(
            classify_slot(at(2013, 7, 6, 12, 0), &window, &cal),
            TimeSlot::WeekendDay
        );
        assert_eq!(
            classify_slot(at(2013, 7, 6, 3, 0), &window, &cal),
            TimeSlot::WeekendNight
        );
    }

    #[test]
    fn holiday_counts_as_weekend_slot() {
        let cal = HolidayCalendar::for_year(2013, Region::Germany).expect("calendar");
        let window = BusinessWindow::default();
        assert_eq!(
            classify_slot(at(2013, 10, 3, 12, 0), &window, &cal),
            TimeSlot::WeekendDay
        );
    }
}
