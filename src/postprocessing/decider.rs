use crate::constants::{BEHAV, NON_BEHAV, PCUTOFF_DEFER};
use crate::error::{BehavError, Result};
use ndarray::Array1;

/// 1 where `probability > pcutoff`, else 0. Equality is a negative.
pub fn decide(probabilities: &Array1<f64>, pcutoff: f64) -> Array1<f64> {
    probabilities.mapv(|p| if p > pcutoff { BEHAV } else { NON_BEHAV })
}

/// Resolve a configured pcutoff. `-1` defers to `fallback` (the classifier's
/// own default); whichever value is used must lie in [0, 1].
pub fn resolve_pcutoff(pcutoff: f64, fallback: f64) -> Result<f64> {
    let value = if pcutoff == PCUTOFF_DEFER { fallback } else { pcutoff };
    if !(0.0..=1.0).contains(&value) {
        return Err(BehavError::InvalidThreshold { value });
    }
    Ok(value)
}
