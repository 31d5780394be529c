//! CSV export for batch results and validation output.
//!
//! Internal BDEW short codes never leak: sector columns carry the long
//! names (h0 → residential, g0 → retail, i0 → industrial,
//! l0 → agricultural) at this boundary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::batch::{UnitPeak, UnitSeries};
use crate::error::{Error, Result};
use crate::io::input::TIMESTAMP_FORMAT;
use crate::validate::ValidationResult;

const PEAKS_HEADER: &str =
    "unit_id,peak_kw,residential_kw,retail_kw,industrial_kw,agricultural_kw";

const TIMESERIES_HEADER: &str = "unit_id,timestamp,demand_kw";

const VALIDATION_HEADER: &str = "timestamp,synthesized_kw,synthesized_excl_industrial_kw,\
                                 rescaled_reference_kw,residual_kw,industrial_estimate_kw";

fn csv_err(e: csv::Error) -> Error {
    Error::Input(format!("cannot write csv: {e}"))
}

/// Writes the peak-load table: one row per unit, composite peak plus
/// per-sector peaks under their long names.
pub fn write_peaks_csv(writer: impl Write, rows: &[UnitPeak]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(PEAKS_HEADER.split(',')).map_err(csv_err)?;
    for row in rows {
        wtr.write_record(&[
            row.unit_id.clone(),
            format!("{:.4}", row.peak_kw),
            format!("{:.4}", row.sectors.residential_kw),
            format!("{:.4}", row.sectors.retail_kw),
            format!("{:.4}", row.sectors.industrial_kw),
            format!("{:.4}", row.sectors.agricultural_kw),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes one unit's composite curve in long format; rows come out
/// (unit, timestamp) ordered when units are streamed in id order.
pub fn write_unit_series(wtr: &mut csv::Writer<impl Write>, row: &UnitSeries) -> Result<()> {
    for (i, value) in row.series.values().iter().enumerate() {
        wtr.write_record(&[
            row.unit_id.clone(),
            row.series.timestamp(i).format(TIMESTAMP_FORMAT).to_string(),
            format!("{value:.4}"),
        ])
        .map_err(csv_err)?;
    }
    Ok(())
}

/// Writes the timeseries table for a collected batch.
pub fn write_timeseries_csv(writer: impl Write, rows: &[UnitSeries]) -> Result<()> {
    let mut wtr = timeseries_writer(writer)?;
    for row in rows {
        write_unit_series(&mut wtr, row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Starts a timeseries CSV with its header, for streaming runs that
/// append units one at a time via [`write_unit_series`].
pub fn timeseries_writer<W: Write>(writer: W) -> Result<csv::Writer<W>> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(TIMESERIES_HEADER.split(','))
        .map_err(csv_err)?;
    Ok(wtr)
}

/// Writes the per-timestamp validation table.
pub fn write_validation_csv(writer: impl Write, result: &ValidationResult) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(VALIDATION_HEADER.split(',').map(str::trim))
        .map_err(csv_err)?;
    let series = &result.synthesized;
    for i in 0..series.len() {
        wtr.write_record(&[
            series.timestamp(i).format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", series.values()[i]),
            format!("{:.4}", result.synthesized_without_industrial.values()[i]),
            format!("{:.4}", result.rescaled_reference.values()[i]),
            format!("{:.4}", result.residual.values()[i]),
            format!("{:.4}", result.industrial_estimate.values()[i]),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the peak table to a file.
pub fn export_peaks(path: &Path, rows: &[UnitPeak]) -> Result<()> {
    write_peaks_csv(BufWriter::new(File::create(path)?), rows)
}

/// Writes the timeseries table to a file.
pub fn export_timeseries(path: &Path, rows: &[UnitSeries]) -> Result<()> {
    write_timeseries_csv(BufWriter::new(File::create(path)?), rows)
}

/// Writes the validation table to a file.
pub fn export_validation(path: &Path, result: &ValidationResult) -> Result<()> {
    write_validation_csv(BufWriter::new(File::create(path)?), result)
}
