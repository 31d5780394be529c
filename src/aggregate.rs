//! Per-unit aggregation: route each sector to its generator, resample to
//! the target resolution, and sum into one composite demand curve.

use crate::calendar::HolidayCalendar;
use crate::error::Result;
use crate::profile::industrial::{self, BusinessWindow, ProfileFactors};
use crate::profile::slp::{self, SlpTable};
use crate::sector::{ALL_SECTORS, Sector, SpatialUnit};
use crate::series::{Resolution, TimeSeries};

/// Per-sector peak loads of one unit, each sector shaped from its own
/// annual consumption.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorPeaks {
    pub residential_kw: f64,
    pub retail_kw: f64,
    pub industrial_kw: f64,
    pub agricultural_kw: f64,
}

impl SectorPeaks {
    fn get_mut(&mut self, sector: Sector) -> &mut f64 {
        match sector {
            Sector::Residential => &mut self.residential_kw,
            Sector::Retail => &mut self.retail_kw,
            Sector::Industrial => &mut self.industrial_kw,
            Sector::Agricultural => &mut self.agricultural_kw,
        }
    }
}

/// Aggregates sector profiles for single spatial units.
///
/// Holds the shared read-only inputs (calendar, shape table, industrial
/// parameters); per-unit calls have no mutable state, so an `Aggregator`
/// can be shared freely across threads.
pub struct Aggregator<'a> {
    calendar: &'a HolidayCalendar,
    table: &'a SlpTable,
    window: BusinessWindow,
    factors: ProfileFactors,
    native: Resolution,
}

impl<'a> Aggregator<'a> {
    /// New aggregator over a calendar and shape table, with industrial
    /// shaping parameters and the native generation resolution.
    pub fn new(
        calendar: &'a HolidayCalendar,
        table: &'a SlpTable,
        window: BusinessWindow,
        factors: ProfileFactors,
        native: Resolution,
    ) -> Self {
        Self {
            calendar,
            table,
            window,
            factors,
            native,
        }
    }

    /// Generates the native-resolution series for one sector of `unit`.
    fn sector_series(&self, unit: &SpatialUnit, sector: Sector) -> Result<TimeSeries> {
        let annual_kwh = unit.consumption_kwh(sector);
        match sector {
            Sector::Industrial => industrial::generate(
                annual_kwh,
                self.calendar,
                &self.window,
                &self.factors,
                self.native,
            ),
            _ => slp::generate(sector, annual_kwh, self.calendar, self.table, self.native),
        }
    }

    /// Composite demand curve of `unit` at `target` resolution: all four
    /// sectors generated, resampled by interval mean, summed elementwise.
    pub fn composite(&self, unit: &SpatialUnit, target: Resolution) -> Result<TimeSeries> {
        self.composite_excluding(unit, None, target)
    }

    /// Composite curve with one sector left out (used by the validation
    /// engine to isolate e.g. the industrial contribution).
    pub fn composite_excluding(
        &self,
        unit: &SpatialUnit,
        skip: Option<Sector>,
        target: Resolution,
    ) -> Result<TimeSeries> {
        let mut acc = TimeSeries::zeros(self.calendar.year(), target);
        for sector in ALL_SECTORS {
            if Some(sector) == skip {
                continue;
            }
            // Zero-consumption sectors contribute nothing; skip generation.
            if unit.consumption_kwh(sector) == 0.0 {
                continue;
            }
            let series = self.sector_series(unit, sector)?;
            acc.add_assign(&series.resample(target))?;
        }
        Ok(acc)
    }

    /// Peak of the composite curve (kW) without retaining any per-sector
    /// series beyond the accumulation.
    pub fn peak(&self, unit: &SpatialUnit, target: Resolution) -> Result<f64> {
        Ok(self.composite(unit, target)?.peak_kw())
    }

    /// Per-sector peak loads, each from the sector's own consumption
    /// figure and its own generator.
    pub fn sector_peaks(&self, unit: &SpatialUnit, target: Resolution) -> Result<SectorPeaks> {
        let mut peaks = SectorPeaks {
            residential_kw: 0.0,
            retail_kw: 0.0,
            industrial_kw: 0.0,
            agricultural_kw: 0.0,
        };
        for sector in ALL_SECTORS {
            if unit.consumption_kwh(sector) == 0.0 {
                continue;
            }
            let series = self.sector_series(unit, sector)?;
            *peaks.get_mut(sector) = series.resample(target).peak_kw();
        }
        Ok(peaks)
    }
}
