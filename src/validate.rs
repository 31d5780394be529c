//! Validation engine: cross-check a synthesized aggregate against an
//! independent reference demand series.
//!
//! The reference is rescaled so its annual sum matches the synthesized
//! one; the residual then quantifies shape disagreement, and the
//! difference between the all-sector and the all-sector-minus-industrial
//! curves isolates the synthesized industrial contribution. Pure and
//! deterministic; the only automatic correction is the documented
//! mean imputation of missing reference entries.

use tracing::debug;

use crate::error::{Error, Result};
use crate::series::{ReferenceSeries, TimeSeries};

/// Per-timestamp validation output, aligned with the synthesized series.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub synthesized: TimeSeries,
    pub synthesized_without_industrial: TimeSeries,
    pub rescaled_reference: TimeSeries,
    /// `rescaled_reference - synthesized`.
    pub residual: TimeSeries,
    /// `synthesized - synthesized_without_industrial`.
    pub industrial_estimate: TimeSeries,
    /// Factor the reference was multiplied by.
    pub rescale_factor: f64,
}

/// Fills missing reference entries with the mean over the defined domain.
///
/// # Errors
///
/// [`Error::ZeroReferenceSum`] if the series has no defined entries at
/// all (the imputation mean is undefined, and an all-missing reference
/// could only ever rescale from zero anyway).
fn impute_mean(reference: &ReferenceSeries) -> Result<Vec<f64>> {
    let defined: Vec<f64> = reference.values().iter().flatten().copied().collect();
    if defined.is_empty() {
        return Err(Error::ZeroReferenceSum);
    }
    let mean = defined.iter().sum::<f64>() / defined.len() as f64;
    Ok(reference
        .values()
        .iter()
        .map(|v| v.unwrap_or(mean))
        .collect())
}

/// Validates a synthesized aggregate against a reference series.
///
/// # Errors
///
/// - [`Error::MisalignedSeries`] if the three series disagree on year,
///   resolution, or length.
/// - [`Error::ZeroReferenceSum`] if the reference sums to zero (or is
///   entirely missing), making the rescale undefined.
pub fn validate(
    synthesized: &TimeSeries,
    synthesized_without_industrial: &TimeSeries,
    reference: &ReferenceSeries,
) -> Result<ValidationResult> {
    synthesized.check_aligned_with(
        synthesized_without_industrial.year(),
        synthesized_without_industrial.resolution(),
        synthesized_without_industrial.len(),
    )?;
    synthesized.check_aligned_with(reference.year(), reference.resolution(), reference.len())?;

    let filled = impute_mean(reference)?;
    let reference_sum: f64 = filled.iter().sum();
    if reference_sum == 0.0 {
        return Err(Error::ZeroReferenceSum);
    }

    let rescale_factor = synthesized.sum() / reference_sum;
    debug!(
        rescale_factor,
        missing = reference.len() - reference.defined_count(),
        "reference rescaled"
    );
    let rescaled_reference = TimeSeries::from_values(
        synthesized.year(),
        synthesized.resolution(),
        filled.iter().map(|v| v * rescale_factor).collect(),
    );

    let residual = rescaled_reference.sub(synthesized)?;
    let industrial_estimate = synthesized.sub(synthesized_without_industrial)?;

    Ok(ValidationResult {
        synthesized: synthesized.clone(),
        synthesized_without_industrial: synthesized_without_industrial.clone(),
        rescaled_reference,
        residual,
        industrial_estimate,
        rescale_factor,
    })
}
