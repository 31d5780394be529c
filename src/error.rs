//! Pipeline error taxonomy.
//!
//! Every variant is terminal for the operation that raises it; nothing in
//! the core retries. The batch driver wraps per-unit failures in
//! [`Error::Unit`] so callers can tell which spatial unit aborted a run.

use thiserror::Error;

use crate::sector::Sector;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes of the synthesis and validation pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// No holiday rule set is configured for the requested region.
    #[error("unsupported region \"{0}\": no holiday rule set configured")]
    UnsupportedRegion(String),

    /// A sector was routed to the standard-profile path that it does not
    /// belong to (e.g. industrial, which has its own parametric shaper).
    #[error("sector {0} is not covered by the standard load profile generator")]
    InvalidSector(Sector),

    /// A business-window boundary is not a valid time of day.
    #[error("invalid business window time \"{0}\" (expected HH:MM)")]
    InvalidWindow(String),

    /// The batch driver was handed an empty unit list.
    #[error("no spatial units supplied")]
    EmptyInput,

    /// The reference series sums to zero, so it cannot be rescaled onto
    /// the synthesized annual total.
    #[error("reference series sums to zero; cannot rescale")]
    ZeroReferenceSum,

    /// Two series that must share a timestamp index do not.
    #[error("misaligned series: {0}")]
    MisalignedSeries(String),

    /// An annual consumption figure is negative or not finite.
    #[error("invalid annual consumption {value} for sector {sector}")]
    InvalidConsumption { sector: Sector, value: f64 },

    /// The shape table is unusable for a requested lookup: missing entry,
    /// wrong slot count, or a shape that integrates to zero against a
    /// nonzero annual total.
    #[error("shape error: {0}")]
    Shape(String),

    /// Underlying file-system failure in an I/O adapter.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input data handed to an I/O adapter.
    #[error("input data error: {0}")]
    Input(String),

    /// A per-unit failure, tagged with the unit that caused the abort.
    #[error("unit \"{unit}\": {source}")]
    Unit {
        unit: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps an error with the spatial unit id it occurred in.
    pub fn for_unit(unit: impl Into<String>, source: Error) -> Self {
        Error::Unit {
            unit: unit.into(),
            source: Box::new(source),
        }
    }
}
