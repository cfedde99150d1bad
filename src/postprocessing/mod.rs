//! Turning probabilities into behaviour calls
//!
//! [`decide`] thresholds per-frame probabilities at a pcutoff and
//! [`merge_short_gaps`] fills short negative runs between positive bouts.

mod bouts;
mod decider;

pub use bouts::{merge_short_gaps, vect2bouts, Bout};
pub use decider::{decide, resolve_pcutoff};
