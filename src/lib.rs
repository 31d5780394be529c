//! Load profile synthesis and validation for substations and load areas.
//!
//! Expands annual, sector-resolved consumption figures into sub-hourly
//! demand curves (standard load profiles for residential, retail, and
//! agricultural load; a parametric day/night model for industry),
//! aggregates them per spatial unit, and cross-checks the aggregate
//! against an independent reference demand series.

pub mod aggregate;
pub mod batch;
pub mod calendar;
pub mod config;
pub mod error;
pub mod io;
/// Profile generation: day classification, SLP expansion, industrial shaper.
pub mod profile;
pub mod sector;
pub mod series;
pub mod validate;

pub use error::{Error, Result};
