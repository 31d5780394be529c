//! CSV readers for spatial units and reference demand series.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::sector::{Sector, SpatialUnit};
use crate::series::{ReferenceSeries, Resolution, year_start};

/// Timestamp format of the reference CSV.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct UnitRow {
    unit_id: String,
    #[serde(default)]
    sector_consumption_residential: Option<f64>,
    #[serde(default)]
    sector_consumption_retail: Option<f64>,
    #[serde(default)]
    sector_consumption_industrial: Option<f64>,
    #[serde(default)]
    sector_consumption_agricultural: Option<f64>,
}

/// Reads spatial units from CSV with the columns
/// `unit_id, sector_consumption_residential, sector_consumption_retail,
/// sector_consumption_industrial, sector_consumption_agricultural`.
///
/// Empty or absent consumption cells count as zero.
///
/// # Errors
///
/// [`Error::Input`] on malformed rows, [`Error::InvalidConsumption`] on
/// negative or non-finite figures.
pub fn read_units_csv<R: Read>(reader: R) -> Result<Vec<SpatialUnit>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut units = Vec::new();
    for row in rdr.deserialize::<UnitRow>() {
        let row = row.map_err(|e| Error::Input(format!("cannot parse unit row: {e}")))?;
        let consumption = [
            (Sector::Residential, row.sector_consumption_residential),
            (Sector::Retail, row.sector_consumption_retail),
            (Sector::Industrial, row.sector_consumption_industrial),
            (Sector::Agricultural, row.sector_consumption_agricultural),
        ]
        .map(|(sector, value)| (sector, value.unwrap_or(0.0)));
        units.push(SpatialUnit::new(row.unit_id, &consumption)?);
    }
    Ok(units)
}

/// Reads spatial units from a CSV file.
pub fn read_units_file(path: &Path) -> Result<Vec<SpatialUnit>> {
    read_units_csv(File::open(path)?)
}

/// Reads a reference demand series from CSV with the columns
/// `timestamp, demand_kw`. An empty demand cell marks a missing entry.
///
/// The series must start at midnight on January 1st of `year` and cover
/// the whole year at `resolution`, rows in timestamp order.
///
/// # Errors
///
/// [`Error::Input`] on malformed rows or a wrong starting timestamp,
/// [`Error::MisalignedSeries`] if the row count does not cover the year.
pub fn read_reference_csv<R: Read>(
    reader: R,
    year: i32,
    resolution: Resolution,
) -> Result<ReferenceSeries> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let expected = resolution.intervals_in_year(year);
    let mut values: Vec<Option<f64>> = Vec::with_capacity(expected);
    let mut first_timestamp: Option<NaiveDateTime> = None;

    for record in rdr.records() {
        let record = record.map_err(|e| Error::Input(format!("cannot read reference row: {e}")))?;
        if record.len() != 2 {
            return Err(Error::Input(format!(
                "reference row has {} fields, expected 2",
                record.len()
            )));
        }
        if first_timestamp.is_none() {
            let ts = NaiveDateTime::parse_from_str(&record[0], TIMESTAMP_FORMAT)
                .map_err(|_| Error::Input(format!("invalid timestamp \"{}\"", &record[0])))?;
            first_timestamp = Some(ts);
        }
        let cell = record[1].trim();
        if cell.is_empty() {
            values.push(None);
        } else {
            let value: f64 = cell
                .parse()
                .map_err(|_| Error::Input(format!("invalid demand value \"{cell}\"")))?;
            values.push(Some(value));
        }
    }

    if let Some(ts) = first_timestamp {
        if ts != year_start(year) {
            return Err(Error::Input(format!(
                "reference series starts at {ts}, expected {}",
                year_start(year)
            )));
        }
    }
    if values.len() != expected {
        return Err(Error::MisalignedSeries(format!(
            "reference has {} rows, year {year} at {resolution:?} needs {expected}",
            values.len()
        )));
    }
    Ok(ReferenceSeries::from_values(year, resolution, values))
}

/// Reads a reference series from a CSV file.
pub fn read_reference_file(path: &Path, year: i32, resolution: Resolution) -> Result<ReferenceSeries> {
    read_reference_csv(File::open(path)?, year, resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_csv_parses_and_defaults_missing_cells() {
        let csv_text = "\
unit_id,sector_consumption_residential,sector_consumption_retail,sector_consumption_industrial,sector_consumption_agricultural
sub_1,1000.0,500.0,2000.0,250.0
sub_2,,,,
sub_3,42.0,,,10.0
";
        let units = read_units_csv(csv_text.as_bytes()).expect("units");
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].consumption_kwh(Sector::Industrial), 2000.0);
        assert_eq!(units[1].total_kwh(), 0.0);
        assert_eq!(units[2].consumption_kwh(Sector::Retail), 0.0);
        assert_eq!(units[2].consumption_kwh(Sector::Agricultural), 10.0);
    }

    #[test]
    fn units_csv_rejects_negative_consumption() {
        let csv_text = "\
unit_id,sector_consumption_residential,sector_consumption_retail,sector_consumption_industrial,sector_consumption_agricultural
sub_1,-3.0,,,
";
        let err = read_units_csv(csv_text.as_bytes());
        assert!(matches!(err, Err(Error::InvalidConsumption { .. })));
    }

    #[test]
    fn reference_csv_round_trip() {
        let mut csv_text = String::from("timestamp,demand_kw\n");
        let n = Resolution::Hour.intervals_in_year(2013);
        let start = year_start(2013);
        for i in 0..n {
            let ts = start + chrono::Duration::hours(i as i64);
            if i == 5 {
                csv_text.push_str(&format!("{},\n", ts.format(TIMESTAMP_FORMAT)));
            } else {
                csv_text.push_str(&format!("{},{}\n", ts.format(TIMESTAMP_FORMAT), 1.5));
            }
        }
        let reference =
            read_reference_csv(csv_text.as_bytes(), 2013, Resolution::Hour).expect("reference");
        assert_eq!(reference.len(), n);
        assert_eq!(reference.values()[4], Some(1.5));
        assert_eq!(reference.values()[5], None);
        assert_eq!(reference.defined_count(), n - 1);
    }

    #[test]
    fn reference_csv_wrong_length_rejected() {
        let csv_text = "timestamp,demand_kw\n2013-01-01 00:00:00,1.0\n";
        let err = read_reference_csv(csv_text.as_bytes(), 2013, Resolution::Hour);
        assert!(matches!(err, Err(Error::MisalignedSeries(_))));
    }

    #[test]
    fn reference_csv_wrong_start_rejected() {
        let csv_text = "timestamp,demand_kw\n2014-01-01 00:00:00,1.0\n";
        let err = read_reference_csv(csv_text.as_bytes(), 2013, Resolution::Hour);
        assert!(matches!(err, Err(Error::Input(_))));
    }
}
