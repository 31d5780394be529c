//! Time-series primitives: sampling resolutions, full-year demand series,
//! and the gap-tolerant reference series.
//!
//! A [`TimeSeries`] stores one calendar year of instantaneous demand at a
//! fixed resolution with an implicit timestamp index, so the contiguity
//! invariant (strictly increasing, gap-free, exactly one year) holds by
//! construction.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sampling interval of a series.
///
/// Quarter-hour is the native resolution of the shape tables; hourly is
/// the usual aggregation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    QuarterHour,
    Hour,
}

impl Resolution {
    /// Interval length in minutes.
    pub fn minutes(self) -> u32 {
        match self {
            Resolution::QuarterHour => 15,
            Resolution::Hour => 60,
        }
    }

    /// Interval length in hours.
    pub fn hours(self) -> f64 {
        f64::from(self.minutes()) / 60.0
    }

    /// Intervals per day.
    pub fn per_day(self) -> usize {
        (24 * 60 / self.minutes()) as usize
    }

    /// Intervals covering the whole of `year` (leap-aware).
    pub fn intervals_in_year(self, year: i32) -> usize {
        days_in_year(year) * self.per_day()
    }
}

/// Days in `year` under the Gregorian rules.
pub fn days_in_year(year: i32) -> usize {
    if is_leap_year(year) { 366 } else { 365 }
}

/// Gregorian leap-year test.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Midnight on January 1st of `year`.
pub fn year_start(year: i32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .expect("january 1st is a valid date for any supported year")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
}

/// One calendar year of instantaneous demand (kW) at a fixed resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    year: i32,
    resolution: Resolution,
    values: Vec<f64>,
}

impl TimeSeries {
    /// All-zero series covering `year` at `resolution`.
    pub fn zeros(year: i32, resolution: Resolution) -> Self {
        Self {
            year,
            resolution,
            values: vec![0.0; resolution.intervals_in_year(year)],
        }
    }

    /// Builds a series from raw values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` does not cover exactly one year of `year`
    /// at `resolution`; series lengths are a construction invariant, not
    /// a runtime input.
    pub fn from_values(year: i32, resolution: Resolution, values: Vec<f64>) -> Self {
        assert_eq!(
            values.len(),
            resolution.intervals_in_year(year),
            "series must cover exactly one calendar year"
        );
        Self {
            year,
            resolution,
            values,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Timestamp of interval `idx` (interval start).
    pub fn timestamp(&self, idx: usize) -> NaiveDateTime {
        year_start(self.year) + Duration::minutes(i64::from(self.resolution.minutes()) * idx as i64)
    }

    /// Sum of all values (kW).
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Energy integral over the year (kWh): `sum * interval_hours`.
    pub fn energy_kwh(&self) -> f64 {
        self.sum() * self.resolution.hours()
    }

    /// Maximum value (kW); zero for an all-zero series.
    pub fn peak_kw(&self) -> f64 {
        self.values.iter().copied().fold(f64::MIN, f64::max).max(0.0)
    }

    /// Multiplies every value by `factor` in place.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.values {
            *v *= factor;
        }
    }

    /// Adds `other` elementwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MisalignedSeries`] if year or resolution differ.
    pub fn add_assign(&mut self, other: &TimeSeries) -> Result<()> {
        self.check_aligned_with(other.year, other.resolution, other.len())?;
        for (a, b) in self.values.iter_mut().zip(&other.values) {
            *a += b;
        }
        Ok(())
    }

    /// Resamples to `target` via arithmetic mean within each target
    /// interval. Resampling to the series' own resolution is the identity.
    ///
    /// # Panics
    ///
    /// Panics if `target` is finer than the current resolution; the
    /// pipeline only ever coarsens.
    pub fn resample(&self, target: Resolution) -> TimeSeries {
        if target == self.resolution {
            return self.clone();
        }
        assert!(
            target.minutes() % self.resolution.minutes() == 0,
            "target resolution must be a multiple of the native one"
        );
        let ratio = (target.minutes() / self.resolution.minutes()) as usize;
        let values: Vec<f64> = self
            .values
            .chunks_exact(ratio)
            .map(|chunk| chunk.iter().sum::<f64>() / ratio as f64)
            .collect();
        TimeSeries {
            year: self.year,
            resolution: target,
            values,
        }
    }

    /// Elementwise difference `self - other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MisalignedSeries`] if the indices differ.
    pub fn sub(&self, other: &TimeSeries) -> Result<TimeSeries> {
        self.check_aligned_with(other.year, other.resolution, other.len())?;
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a - b)
            .collect();
        Ok(TimeSeries {
            year: self.year,
            resolution: self.resolution,
            values,
        })
    }

    pub(crate) fn check_aligned_with(
        &self,
        year: i32,
        resolution: Resolution,
        len: usize,
    ) -> Result<()> {
        if self.year != year || self.resolution != resolution || self.len() != len {
            return Err(Error::MisalignedSeries(format!(
                "expected year {} / {:?} / {} intervals, got year {} / {:?} / {} intervals",
                self.year,
                self.resolution,
                self.len(),
                year,
                resolution,
                len
            )));
        }
        Ok(())
    }
}

/// Independent reference demand series for the same year; entries may be
/// missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSeries {
    year: i32,
    resolution: Resolution,
    values: Vec<Option<f64>>,
}

impl ReferenceSeries {
    /// Builds a reference series.
    ///
    /// # Panics
    ///
    /// Panics if the length does not cover exactly one year, same as
    /// [`TimeSeries::from_values`].
    pub fn from_values(year: i32, resolution: Resolution, values: Vec<Option<f64>>) -> Self {
        assert_eq!(
            values.len(),
            resolution.intervals_in_year(year),
            "reference series must cover exactly one calendar year"
        );
        Self {
            year,
            resolution,
            values,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Number of defined (non-missing) entries.
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Resamples to a coarser `target` by averaging the defined values in
    /// each target interval; an interval with no defined values stays
    /// missing.
    pub fn resample(&self, target: Resolution) -> ReferenceSeries {
        if target == self.resolution {
            return self.clone();
        }
        assert!(
            target.minutes() % self.resolution.minutes() == 0,
            "target resolution must be a multiple of the native one"
        );
        let ratio = (target.minutes() / self.resolution.minutes()) as usize;
        let values: Vec<Option<f64>> = self
            .values
            .chunks_exact(ratio)
            .map(|chunk| {
                let defined: Vec<f64> = chunk.iter().flatten().copied().collect();
                if defined.is_empty() {
                    None
                } else {
                    Some(defined.iter().sum::<f64>() / defined.len() as f64)
                }
            })
            .collect();
        ReferenceSeries {
            year: self.year,
            resolution: target,
            values,
        }
    }
}
