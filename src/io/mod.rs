//! CSV adapters at the pipeline boundary.
//!
//! These stand in for the database read/write collaborators of the
//! original deployment; they carry no algorithmic content.

pub mod export;
pub mod input;
