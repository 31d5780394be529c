//! Standard load profile expansion for the residential, retail, and
//! agricultural sectors.
//!
//! The intraday shapes are a supplied lookup resource, injected as an
//! immutable [`SlpTable`] keyed by (sector, season, day kind). The
//! generator stitches one shape per day across the year, then scales the
//! whole series so its energy integral equals the annual total.

use std::collections::HashMap;
use std::io::Read;

use chrono::Duration;

use crate::calendar::HolidayCalendar;
use crate::error::{Error, Result};
use crate::profile::daytype::{DayClass, DayKind, Season, classify_day};
use crate::sector::{STANDARD_SECTORS, Sector};
use crate::series::{Resolution, TimeSeries, days_in_year, year_start};

/// Immutable intraday shape table keyed by (sector, season, day kind).
///
/// Shapes hold one weight per native-resolution slot of a day. Absolute
/// normalization does not matter: the generator rescales the stitched
/// year to the annual total, so only relative weights shape the curve.
#[derive(Debug, Clone)]
pub struct SlpTable {
    slots_per_day: usize,
    shapes: HashMap<(Sector, Season, DayKind), Vec<f64>>,
}

const ALL_SEASONS: [Season; 3] = [Season::Winter, Season::Summer, Season::Transition];
const ALL_DAY_KINDS: [DayKind; 3] = [DayKind::Weekday, DayKind::Saturday, DayKind::Sunday];

impl SlpTable {
    /// Empty table for `slots_per_day` slots.
    pub fn new(slots_per_day: usize) -> Self {
        Self {
            slots_per_day,
            shapes: HashMap::new(),
        }
    }

    /// Slots per day each shape must provide.
    pub fn slots_per_day(&self) -> usize {
        self.slots_per_day
    }

    /// Inserts one intraday shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] if the shape length does not match the
    /// table's slot count or a weight is negative / not finite.
    pub fn insert(
        &mut self,
        sector: Sector,
        season: Season,
        kind: DayKind,
        shape: Vec<f64>,
    ) -> Result<()> {
        if shape.len() != self.slots_per_day {
            return Err(Error::Shape(format!(
                "shape for {sector}/{season}/{kind} has {} slots, table expects {}",
                shape.len(),
                self.slots_per_day
            )));
        }
        if shape.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Shape(format!(
                "shape for {sector}/{season}/{kind} contains a negative or non-finite weight"
            )));
        }
        self.shapes.insert((sector, season, kind), shape);
        Ok(())
    }

    /// Shape for a (sector, day class) pair, if present.
    pub fn shape(&self, sector: Sector, class: DayClass) -> Option<&[f64]> {
        self.shapes
            .get(&(sector, class.season, class.kind))
            .map(Vec::as_slice)
    }

    /// Flat table: every standard sector gets a uniform shape in every
    /// season and day kind. Useful for tests and for demo runs without a
    /// real shape resource; the synthesized curve is then constant.
    pub fn flat(slots_per_day: usize) -> Self {
        let mut table = Self::new(slots_per_day);
        for sector in STANDARD_SECTORS {
            for season in ALL_SEASONS {
                for kind in ALL_DAY_KINDS {
                    // Uniform weights are valid by construction.
                    let _ = table.insert(sector, season, kind, vec![1.0; slots_per_day]);
                }
            }
        }
        table
    }

    /// Parses a table from long-format CSV with the header
    /// `sector,season,day_kind,slot,value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] on malformed rows, out-of-range slots, or
    /// shapes left incomplete at the end of the file.
    pub fn from_csv_reader<R: Read>(reader: R, slots_per_day: usize) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut staging: HashMap<(Sector, Season, DayKind), Vec<Option<f64>>> = HashMap::new();

        for record in rdr.records() {
            let record =
                record.map_err(|e| Error::Shape(format!("cannot read shape table row: {e}")))?;
            if record.len() != 5 {
                return Err(Error::Shape(format!(
                    "shape table row has {} fields, expected 5",
                    record.len()
                )));
            }
            let sector: Sector = record[0].parse()?;
            let season: Season = record[1].parse()?;
            let kind: DayKind = record[2].parse()?;
            let slot: usize = record[3]
                .parse()
                .map_err(|_| Error::Shape(format!("invalid slot index \"{}\"", &record[3])))?;
            let value: f64 = record[4]
                .parse()
                .map_err(|_| Error::Shape(format!("invalid shape value \"{}\"", &record[4])))?;
            if slot >= slots_per_day {
                return Err(Error::Shape(format!(
                    "slot {slot} out of range for {slots_per_day} slots per day"
                )));
            }
            staging
                .entry((sector, season, kind))
                .or_insert_with(|| vec![None; slots_per_day])[slot] = Some(value);
        }

        let mut table = Self::new(slots_per_day);
        for ((sector, season, kind), slots) in staging {
            let shape: Vec<f64> = slots
                .into_iter()
                .enumerate()
                .map(|(slot, v)| {
                    v.ok_or_else(|| {
                        Error::Shape(format!("missing slot {slot} for {sector}/{season}/{kind}"))
                    })
                })
                .collect::<Result<_>>()?;
            table.insert(sector, season, kind, shape)?;
        }
        Ok(table)
    }
}

/// Expands an annual total into a native-resolution year series using the
/// standard shape table.
///
/// A zero total yields an all-zero series of the correct length; sectors
/// with no load in a unit are legitimate. Deterministic for identical
/// inputs.
///
/// # Errors
///
/// - [`Error::InvalidSector`] if `sector` is not a standard-profile sector.
/// - [`Error::InvalidConsumption`] if `annual_kwh` is negative or not
///   finite.
/// - [`Error::Shape`] if the table lacks a needed shape, has the wrong
///   slot count for `resolution`, or the stitched year integrates to zero
///   against a nonzero total.
pub fn generate(
    sector: Sector,
    annual_kwh: f64,
    calendar: &HolidayCalendar,
    table: &SlpTable,
    resolution: Resolution,
) -> Result<TimeSeries> {
    if !STANDARD_SECTORS.contains(&sector) {
        return Err(Error::InvalidSector(sector));
    }
    if !annual_kwh.is_finite() || annual_kwh < 0.0 {
        return Err(Error::InvalidConsumption {
            sector,
            value: annual_kwh,
        });
    }
    let year = calendar.year();
    if annual_kwh == 0.0 {
        return Ok(TimeSeries::zeros(year, resolution));
    }
    if table.slots_per_day() != resolution.per_day() {
        return Err(Error::Shape(format!(
            "table has {} slots per day, resolution needs {}",
            table.slots_per_day(),
            resolution.per_day()
        )));
    }

    let days = days_in_year(year);
    let start = year_start(year).date();
    let mut values = Vec::with_capacity(days * resolution.per_day());
    for day in 0..days {
        let date = start + Duration::days(day as i64);
        let class = classify_day(date, calendar);
        let shape = table.shape(sector, class).ok_or_else(|| {
            Error::Shape(format!(
                "no shape for {sector}/{}/{}",
                class.season, class.kind
            ))
        })?;
        values.extend_from_slice(shape);
    }

    let mut series = TimeSeries::from_values(year, resolution, values);
    let raw_energy = series.energy_kwh();
    if raw_energy <= 0.0 {
        return Err(Error::Shape(format!(
            "shapes for {sector} integrate to zero; cannot scale to {annual_kwh} kWh"
        )));
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

    /// Table whose Sunday shape differs from the weekday one, so holiday
    /// reclassification is visible in the output.
    fn sunday_heavy_table() -> SlpTable {
        let mut table = SlpTable::new(96);
        for sector in STANDARD_SECTORS {
            for season in ALL_SEASONS {
                table
                    .insert(sector, season, DayKind::Weekday, vec![1.0; 96])
                    .expect("weekday shape");
                table
                    .insert(sector, season, DayKind::Saturday, vec![1.5; 96])
                    .expect("saturday shape");
                table
                    .insert(sector, season, DayKind::Sunday, vec![2.0; 96])
                    .expect("sunday shape");
            }
        }
        table
    }

    #[test]
    fn zero_total_yields_all_zero_series() {
        let table = SlpTable::flat(96);
        let series = generate(
            Sector::Residential,
            0.0,
            &calendar(),
            &table,
            Resolution::QuarterHour,
        )
        .expect("series");
        assert_eq!(series.len(), 35040);
        assert!(series.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn energy_conservation() {
        let table = sunday_heavy_table();
        for annual in [1.0, 1000.0, 123_456.789] {
            let series = generate(
                Sector::Retail,
                annual,
                &calendar(),
                &table,
                Resolution::QuarterHour,
            )
            .expect("series");
            assert!(
                (series.energy_kwh() - annual).abs() < annual * 1e-9,
                "energy {} != annual {annual}",
                series.energy_kwh()
            );
        }
    }

    #[test]
    fn leap_year_has_leap_length() {
        let cal = HolidayCalendar::for_year(2012, Region::Germany).expect("calendar");
        let table = SlpTable::flat(96);
        let series = generate(
            Sector::Agricultural,
            500.0,
            &cal,
            &table,
            Resolution::QuarterHour,
        )
        .expect("series");
        assert_eq!(series.len(), 35136);
    }

    #[test]
    fn industrial_rejected_on_standard_path() {
        let table = SlpTable::flat(96);
        let err = generate(
            Sector::Industrial,
            100.0,
            &calendar(),
            &table,
            Resolution::QuarterHour,
        );
        assert!(matches!(err, Err(Error::InvalidSector(Sector::Industrial))));
    }

    #[test]
    fn negative_total_rejected() {
        let table = SlpTable::flat(96);
        let err = generate(
            Sector::Residential,
            -5.0,
            &calendar(),
            &table,
            Resolution::QuarterHour,
        );
        assert!(matches!(err, Err(Error::InvalidConsumption { .. })));
    }

    #[test]
    fn missing_shape_is_reported() {
        let mut table = SlpTable::new(96);
        // Only weekday shapes; the first Saturday breaks the run.
        for season in ALL_SEASONS {
            table
                .insert(Sector::Residential, season, DayKind::Weekday, vec![1.0; 96])
                .expect("shape");
        }
        let err = generate(
            Sector::Residential,
            100.0,
            &calendar(),
            &table,
            Resolution::QuarterHour,
        );
        assert!(matches!(err, Err(Error::Shape(_))));
    }

    #[test]
    fn holiday_uses_sunday_shape() {
        let table = sunday_heavy_table();
        let series = generate(
            Sector::Residential,
            1000.0,
            &calendar(),
            &table,
            Resolution::QuarterHour,
        )
        .expect("series");
        // 2013-10-03 is a Thursday holiday; compare against the previous
        // Thursday (a plain weekday, same season).
        let holiday_idx = 96 * (31 + 28 + 31 + 30 + 31 + 30 + 31 + 31 + 30 + 2) + 48;
        let weekday_idx = holiday_idx - 7 * 96;
        let holiday = series.values()[holiday_idx];
        let weekday = series.values()[weekday_idx];
        assert!(
            holiday > weekday,
            "holiday value {holiday} should use the heavier sunday shape (weekday {weekday})"
        );
    }

    #[test]
    fn determinism() {
        let table = sunday_heavy_table();
        let a = generate(
            Sector::Retail,
            42.0,
            &calendar(),
            &table,
            Resolution::QuarterHour,
        )
        .expect("series");
        let b = generate(
            Sector::Retail,
            42.0,
            &calendar(),
            &table,
            Resolution::QuarterHour,
        )
        .expect("series");
        assert_eq!(a, b);
    }

    #[test]
    fn csv_round_trip() {
        let mut csv_text = String::from("sector,season,day_kind,slot,value\n");
        for sector in ["h0", "g0", "l0"] {
            for season in ["winter", "summer", "transition"] {
                for kind in ["weekday", "saturday", "sunday"] {
                    for slot in 0..4 {
                        csv_text.push_str(&format!(
                            "{sector},{season},{kind},{slot},{}\n",
                            1.0 + slot as f64
                        ));
                    }
                }
            }
        }
        let table = SlpTable::from_csv_reader(csv_text.as_bytes(), 4).expect("table");
        let class = DayClass {
            season: Season::Winter,
            kind: DayKind::Sunday,
        };
        assert_eq!(
            table.shape(Sector::Residential, class),
            Some(&[1.0, 2.0, 3.0, 4.0][..])
        );
    }

    #[test]
    fn csv_incomplete_shape_rejected() {
        let csv_text = "sector,season,day_kind,slot,value\nh0,winter,weekday,0,1.0\n";
        let err = SlpTable::from_csv_reader(csv_text.as_bytes(), 4);
        assert!(matches!(err, Err(Error::Shape(_))));
    }
}
