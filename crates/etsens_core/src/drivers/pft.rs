//! Dominant plant functional type (PFT) per site.
//!
//! Each site carries a vector of class codes (one per subgrid pixel). The
//! dominant class is the most frequent finite code. Ties go to the smallest
//! code, so the assignment never depends on pixel order. A site whose codes
//! are all missing has no dominant class.

use std::collections::BTreeMap;

use crate::error::DataError;
use crate::store::Dataset;

/// Majority vote over `codes`, ignoring missing and out-of-range values
#[must_use]
pub fn dominant_class(codes: &[f64]) -> Option<u8> {
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for &code in codes {
        if code.is_finite() && code >= 0.0 && code <= f64::from(u8::MAX) && code.fract() == 0.0 {
            *counts.entry(code as u8).or_default() += 1;
        }
    }
    // Ascending iteration + strict comparison keeps the smallest code on ties
    let mut best: Option<(u8, usize)> = None;
    for (class, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((class, count));
        }
    }
    best.map(|(class, _)| class)
}

/// Dominant class for every site of a `[site]` or `[site, subgrid]` dataset
pub fn dominant_classes(state: &Dataset) -> Result<Vec<Option<u8>>, DataError> {
    match state.shape() {
        [_] => Ok(state.data().iter().map(|&c| dominant_class(&[c])).collect()),
        [_, 0] => Ok(vec![None; state.shape()[0]]),
        [_, subgrid] => Ok(state.data().chunks(*subgrid).map(dominant_class).collect()),
        other => Err(DataError::ShapeMismatch {
            what: "PFT state (expected [site] or [site, subgrid])".to_string(),
            expected: vec![],
            found: other.to_vec(),
        }),
    }
}
