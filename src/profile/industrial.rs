//! Parametric industrial load shaper.
//!
//! Industry has no standard shape table; its profile is a rectangular
//! day/night and weekday/weekend scaling model. Four factors shape the
//! year, then a single global rescale pins the energy integral to the
//! annual total, so the factors never change how much energy is consumed,
//! only when.

use chrono::{Duration, NaiveTime};
use serde::Deserialize;

use crate::calendar::HolidayCalendar;
use crate::error::{Error, Result};
use crate::profile::daytype::{TimeSlot, classify_slot};
use crate::sector::Sector;
use crate::series::{Resolution, TimeSeries, year_start};

/// Business-hour window delimiting "day" from "night".
///
/// Half-open: an instant belongs to the day window iff `am <= t < pm`.
/// If `pm <= am` the window wraps past midnight and the rule becomes
/// `t >= am || t < pm`; with `pm == am` every instant is "day".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessWindow {
    am: NaiveTime,
    pm: NaiveTime,
}

impl BusinessWindow {
    /// Window from two times of day.
    pub fn new(am: NaiveTime, pm: NaiveTime) -> Self {
        Self { am, pm }
    }

    /// Parses a window from `HH:MM` strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] if either string is not a valid
    /// time of day.
    pub fn parse(am: &str, pm: &str) -> Result<Self> {
        let parse_one = |s: &str| {
            NaiveTime::parse_from_str(s.trim(), "%H:%M")
                .map_err(|_| Error::InvalidWindow(s.to_string()))
        };
        Ok(Self {
            am: parse_one(am)?,
            pm: parse_one(pm)?,
        })
    }

    /// Whether `t` falls inside the day window.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.am < self.pm {
            self.am <= t && t < self.pm
        } else {
            // Wraps past midnight.
            t >= self.am || t < self.pm
        }
    }
}

impl Default for BusinessWindow {
    /// 06:00–22:00, the demandlib default.
    fn default() -> Self {
        Self {
            am: NaiveTime::from_hms_opt(6, 0, 0).expect("06:00 is a valid time"),
            pm: NaiveTime::from_hms_opt(22, 0, 0).expect("22:00 is a valid time"),
        }
    }
}

/// Scaling multipliers for the four industrial time slots.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileFactors {
    pub week_day: f64,
    pub week_night: f64,
    pub weekend_day: f64,
    pub weekend_night: f64,
}

impl Default for ProfileFactors {
    fn default() -> Self {
        Self {
            week_day: 0.8,
            week_night: 0.6,
            weekend_day: 0.6,
            weekend_night: 0.6,
        }
    }
}

impl ProfileFactors {
    /// Factor for one time slot.
    pub fn factor(&self, slot: TimeSlot) -> f64 {
        match slot {
            TimeSlot::WeekDay => self.week_day,
            TimeSlot::WeekNight => self.week_night,
            TimeSlot::WeekendDay => self.weekend_day,
            TimeSlot::WeekendNight => self.weekend_night,
        }
    }

    fn validate(&self) -> Result<()> {
        let all = [
            self.week_day,
            self.week_night,
            self.weekend_day,
            self.weekend_night,
        ];
        if all.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(Error::Shape(
                "industrial profile factors must be non-negative and finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Shapes an annual industrial total into a native-resolution year series.
///
/// Every interval gets a flat base rate multiplied by its slot factor;
/// the full year is then rescaled so its energy integral equals
/// `annual_kwh` exactly. A zero total yields an all-zero series.
///
/// # Errors
///
/// - [`Error::InvalidConsumption`] if `annual_kwh` is negative or not
///   finite.
/// - [`Error::Shape`] if a factor is invalid or all factors are zero with
///   a nonzero total.
pub fn generate(
    annual_kwh: f64,
    calendar: &HolidayCalendar,
    window: &BusinessWindow,
    factors: &ProfileFactors,
    resolution: Resolution,
) -> Result<TimeSeries> {
    if !annual_kwh.is_finite() || annual_kwh < 0.0 {
        return Err(Error::InvalidConsumption {
            sector: Sector::Industrial,
            value: annual_kwh,
        });
    }
    factors.validate()?;
    let year = calendar.year();
    if annual_kwh == 0.0 {
        return Ok(TimeSeries::zeros(year, resolution));
    }

    let n = resolution.intervals_in_year(year);
    let start = year_start(year);
    let step = Duration::minutes(i64::from(resolution.minutes()));
    let mut values = Vec::with_capacity(n);
    let mut at = start;
    for _ in 0..n {
        let slot = classify_slot(at, window, calendar);
        values.push(factors.factor(slot));
        at += step;
    }

    let mut series = TimeSeries::from_values(year, resolution, values);
    let raw_energy = series.energy_kwh();
    if raw_energy <= 0.0 {
        return Err(Error::Shape(
            "industrial factors are all zero; cannot scale to a nonzero total".to_string(),
        ));
    }
    series.scale(annual_kwh / raw_energy);
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Region;

    fn calendar() -> HolidayCalendar {
        HolidayCalendar::for_year(2013, Region::Germany).expect("calendar")
    }

    // 2013-07-01 is a Monday; day 181 (0-based) of the year.
    const MONDAY_JUL_1: usize = 181;

    fn quarter_index(day: usize, hour: usize, quarter: usize) -> usize {
        day * 96 + hour * 4 + quarter
    }

    #[test]
    fn window_parse_and_contains() {
        let w = BusinessWindow::parse("06:00", "22:00").expect("window");
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("time");
        assert!(w.contains(t(6, 0)));
        assert!(w.contains(t(21, 59)));
        assert!(!w.contains(t(22, 0)));
        assert!(!w.contains(t(5, 59)));
    }

    #[test]
    fn invalid_window_rejected() {
        assert!(matches!(
            BusinessWindow::parse("25:00", "22:00"),
            Err(Error::InvalidWindow(_))
        ));
        assert!(matches!(
            BusinessWindow::parse("06:00", "nope"),
            Err(Error::InvalidWindow(_))
        ));
    }

    #[test]
    fn wrapping_window_classifies_past_midnight() {
        // Night shift: day window 22:00 -> 06:00.
        let w = BusinessWindow::parse("22:00", "06:00").expect("window");
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("time");
        assert!(w.contains(t(23, 0)));
        assert!(w.contains(t(2, 0)));
        assert!(!w.contains(t(6, 0)));
        assert!(!w.contains(t(12, 0)));
    }

    #[test]
    fn degenerate_window_is_all_day() {
        let w = BusinessWindow::parse("06:00", "06:00").expect("window");
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).expect("time");
        for h in 0..24 {
            assert!(w.contains(t(h)));
        }
    }

    #[test]
    fn energy_conservation() {
        let series = generate(
            50_000.0,
            &calendar(),
            &BusinessWindow::default(),
            &ProfileFactors::default(),
            Resolution::QuarterHour,
        )
        .expect("series");
        assert_eq!(series.len(), 35040);
        assert!((series.energy_kwh() - 50_000.0).abs() < 1e-4);
    }

    #[test]
    fn weekday_business_hours_exceed_night_and_weekend() {
        let series = generate(
            10_000.0,
            &calendar(),
            &BusinessWindow::default(),
            &ProfileFactors::default(),
            Resolution::QuarterHour,
        )
        .expect("series");
        let noon_monday = series.values()[quarter_index(MONDAY_JUL_1, 12, 0)];
        let night_monday = series.values()[quarter_index(MONDAY_JUL_1, 3, 0)];
        let noon_saturday = series.values()[quarter_index(MONDAY_JUL_1 + 5, 12, 0)];
        assert!(noon_monday > night_monday);
        assert!(noon_monday > noon_saturday);
        // Default factors: weekend day equals week night.
        assert!((noon_saturday - night_monday).abs() < 1e-12);
    }

    #[test]
    fn zero_total_yields_zeros() {
        let series = generate(
            0.0,
            &calendar(),
            &BusinessWindow::default(),
            &ProfileFactors::default(),
            Resolution::QuarterHour,
        )
        .expect("series");
        assert!(series.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn all_zero_factors_rejected_for_nonzero_total() {
        let factors = ProfileFactors {
            week_day: 0.0,
            week_night: 0.0,
            weekend_day: 0.0,
            weekend_night: 0.0,
        };
        let err = generate(
            100.0,
            &calendar(),
            &BusinessWindow::default(),
            &factors,
            Resolution::QuarterHour,
        );
        assert!(matches!(err, Err(Error::Shape(_))));
    }

    #[test]
    fn negative_factor_rejected() {
        let factors = ProfileFactors {
            week_day: -0.1,
            ..ProfileFactors::default()
        };
        let err = generate(
            100.0,
            &calendar(),
            &BusinessWindow::default(),
            &factors,
            Resolution::QuarterHour,
        );
        assert!(matches!(err, Err(Error::Shape(_))));
    }

    #[test]
    fn holiday_weekday_gets_weekend_factor() {
        let series = generate(
            10_000.0,
            &calendar(),
            &BusinessWindow::default(),
            &ProfileFactors::default(),
            Resolution::QuarterHour,
        )
        .expect("series");
        // 2013-10-03 (Thursday holiday), day 275; previous Thursday day 268.
        let holiday_noon = series.values()[quarter_index(275, 12, 0)];
        let weekday_noon = series.values()[quarter_index(268, 12, 0)];
        assert!(holiday_noon < weekday_noon);
    }
}
