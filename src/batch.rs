//! Batch driver: iterate all spatial units and assemble a unit-indexed
//! result collection.
//!
//! Units are processed in unit-id order, so timeseries results come out
//! (unit, timestamp) lexicographic no matter how the input was ordered.
//! The first per-unit failure aborts the whole batch; no partial result
//! collection is surfaced. For large fleets, [`run_streaming`] folds
//! composites through a sink chunk by chunk instead of growing one big
//! collection in memory.

use tracing::{debug, info, info_span};

use crate::aggregate::{Aggregator, SectorPeaks};
use crate::error::{Error, Result};
use crate::sector::SpatialUnit;
use crate::series::{Resolution, TimeSeries};

/// What the batch driver collects per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One scalar peak load (plus per-sector peaks) per unit.
    PeakLoad,
    /// The full composite demand curve per unit.
    Timeseries,
}

impl RunMode {
    /// Parses a mode name as it appears in config files.
    pub fn from_name(name: &str) -> Option<RunMode> {
        match name {
            "peak_load" => Some(RunMode::PeakLoad),
            "timeseries" => Some(RunMode::Timeseries),
            _ => None,
        }
    }
}

/// Peak-load row for one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitPeak {
    pub unit_id: String,
    /// Peak of the composite (all-sector) curve.
    pub peak_kw: f64,
    /// Per-sector peaks, each from the sector's own consumption.
    pub sectors: SectorPeaks,
}

/// Composite curve for one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSeries {
    pub unit_id: String,
    pub series: TimeSeries,
}

/// Unit-indexed batch output, ordered by unit id.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchResult {
    PeakLoad(Vec<UnitPeak>),
    Timeseries(Vec<UnitSeries>),
}

/// Default number of units whose composites are held in memory at once
/// during a streaming run.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// Indices into `units`, sorted by unit id for deterministic output order.
fn sorted_indices(units: &[SpatialUnit]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..units.len()).collect();
    order.sort_by(|&a, &b| units[a].id().cmp(units[b].id()));
    order
}

/// Generates the composites for one chunk of units, in the given order.
///
/// With the `parallel` feature the chunk is generated with rayon; results
/// are still inspected in input order, so the reported failure is the
/// same unit the sequential run would have stopped at.
fn composite_chunk(
    units: &[&SpatialUnit],
    aggregator: &Aggregator<'_>,
    target: Resolution,
) -> Result<Vec<UnitSeries>> {
    #[cfg(feature = "parallel")]
    let raw: Vec<Result<TimeSeries>> = {
        use rayon::prelude::*;
        units
            .par_iter()
            .map(|unit| aggregator.composite(unit, target))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let raw: Vec<Result<TimeSeries>> = units
        .iter()
        .map(|unit| aggregator.composite(unit, target))
        .collect();

    units
        .iter()
        .zip(raw)
        .map(|(unit, series)| match series {
            Ok(series) => Ok(UnitSeries {
                unit_id: unit.id().to_string(),
                series,
            }),
            Err(e) => Err(Error::for_unit(unit.id(), e)),
        })
        .collect()
}

/// Streams per-unit composites through `sink` in unit-id order, holding
/// at most `chunk_size` series in memory at a time.
///
/// # Errors
///
/// [`Error::EmptyInput`] for an empty unit list; otherwise the first
/// per-unit failure (wrapped in [`Error::Unit`]) or the first sink error.
pub fn run_streaming(
    units: &[SpatialUnit],
    aggregator: &Aggregator<'_>,
    target: Resolution,
    chunk_size: usize,
    mut sink: impl FnMut(UnitSeries) -> Result<()>,
) -> Result<()> {
    if units.is_empty() {
        return Err(Error::EmptyInput);
    }
    let chunk_size = chunk_size.max(1);
    let span = info_span!("batch", units = units.len(), chunk_size);
    let _guard = span.enter();

    let order = sorted_indices(units);
    let mut done = 0usize;
    for chunk in order.chunks(chunk_size) {
        let refs: Vec<&SpatialUnit> = chunk.iter().map(|&i| &units[i]).collect();
        for result in composite_chunk(&refs, aggregator, target)? {
            debug!(unit = %result.unit_id, "composite generated");
            sink(result)?;
        }
        done += chunk.len();
    }
    info!(units = done, "batch complete");
    Ok(())
}

/// Runs the whole batch and collects the results.
///
/// # Errors
///
/// Same failure modes as [`run_streaming`]; peak-load mode additionally
/// wraps generator failures per unit.
pub fn run(
    units: &[SpatialUnit],
    aggregator: &Aggregator<'_>,
    mode: RunMode,
    target: Resolution,
) -> Result<BatchResult> {
    match mode {
        RunMode::Timeseries => {
            let mut collected = Vec::with_capacity(units.len());
            run_streaming(units, aggregator, target, DEFAULT_CHUNK_SIZE, |row| {
                collected.push(row);
                Ok(())
            })?;
            Ok(BatchResult::Timeseries(collected))
        }
        RunMode::PeakLoad => {
            if units.is_empty() {
                return Err(Error::EmptyInput);
            }
            let span = info_span!("batch", units = units.len(), mode = "peak_load");
            let _guard = span.enter();
            let mut rows = Vec::with_capacity(units.len());
            for &i in &sorted_indices(units) {
                let unit = &units[i];
                let peak_kw = aggregator
                    .peak(unit, target)
                    .map_err(|e| Error::for_unit(unit.id(), e))?;
                let sectors = aggregator
                    .sector_peaks(unit, target)
                    .map_err(|e| Error::for_unit(unit.id(), e))?;
                debug!(unit = %unit.id(), peak_kw, "peak computed");
                rows.push(UnitPeak {
                    unit_id: unit.id().to_string(),
                    peak_kw,
                    sectors,
                });
            }
            info!(units = rows.len(), "batch complete");
            Ok(BatchResult::PeakLoad(rows))
        }
    }
}
