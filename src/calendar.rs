//! Holiday calendar provider.
//!
//! Supplies the set of holiday dates for a (year, region) pair. Profile
//! generation uses it to reclassify otherwise-regular weekdays. Building
//! the calendar is deterministic and side-effect-free.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// Region whose public-holiday rule set is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Nationwide German holidays (incl. movable feasts off Easter).
    Germany,
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "germany" | "de" => Ok(Region::Germany),
            other => Err(Error::UnsupportedRegion(other.to_string())),
        }
    }
}

/// Immutable holiday set for one calendar year.
#[derive(Debug, Clone)]
pub struct HolidayCalendar {
    year: i32,
    holidays: BTreeMap<NaiveDate, &'static str>,
}

impl HolidayCalendar {
    /// Builds the calendar for `year` in `region`.
    ///
    /// # Errors
    ///
    /// Never fails for a configured [`Region`]; the fallible signature is
    /// kept so that adding regions with year-bounded rules stays
    /// non-breaking.
    pub fn for_year(year: i32, region: Region) -> Result<Self> {
        let holidays = match region {
            Region::Germany => german_holidays(year),
        };
        Ok(Self { year, holidays })
    }

    /// The calendar year this set is scoped to.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Whether `date` is a public holiday.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    /// Holiday label for `date`, if any.
    pub fn label(&self, date: NaiveDate) -> Option<&'static str> {
        self.holidays.get(&date).copied()
    }

    /// Number of holidays in the year.
    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    /// True if no holidays are configured.
    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }

    /// Calendar with no holidays, for isolating day-type logic in tests.
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            holidays: BTreeMap::new(),
        }
    }
}

/// Gregorian Easter Sunday (anonymous computus).
fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
        .expect("computus always yields a valid March/April date")
}

fn german_holidays(year: i32) -> BTreeMap<NaiveDate, &'static str> {
    let fixed = |m: u32, d: u32| {
        NaiveDate::from_ymd_opt(year, m, d).expect("fixed holiday date is valid")
    };
    let easter = easter_sunday(year);
    let mut map = BTreeMap::new();
    map.insert(fixed(1, 1), "New year");
    map.insert(easter - chrono::Duration::days(2), "Good Friday");
    map.insert(easter + chrono::Duration::days(1), "Easter Monday");
    map.insert(fixed(5, 1), "Labour Day");
    map.insert(easter + chrono::Duration::days(39), "Ascension Thursday");
    map.insert(easter + chrono::Duration::days(50), "Whit Monday");
    map.insert(fixed(10, 3), "Day of German Unity");
    map.insert(fixed(12, 25), "Christmas Day");
    map.insert(fixed(12, 26), "Second Christmas Day");
    map
}
