//! Typed selection masks.
//!
//! - `SiteMask` runs along the site axis (axis 1 of every `[time, site]` array).
//! - `CellMask` covers the full `[time, site]` grid in row-major order, so
//!   applying it flattens a grid to the selected cells, time-major.

use crate::error::DataError;
use crate::store::Dataset;

/// True where a site is part of the analysed population
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMask(Vec<bool>);

impl SiteMask {
    /// Keep every site
    #[must_use]
    pub fn all(n_sites: usize) -> Self {
        Self(vec![true; n_sites])
    }

    #[must_use]
    pub fn from_vec(keep: Vec<bool>) -> Self {
        Self(keep)
    }

    /// Keep sites whose dominant class equals `class`
    #[must_use]
    pub fn for_class(dominant: &[Option<u8>], class: u8) -> Self {
        Self(dominant.iter().map(|d| *d == Some(class)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of selected sites
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&k| k).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Indices of the selected sites
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
    }
}

/// True where a `(time, site)` cell holds usable data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMask {
    n_steps: usize,
    n_sites: usize,
    cells: Vec<bool>,
}

impl CellMask {
    /// Cells where `observations` is not missing
    pub fn not_missing(observations: &Dataset) -> Result<Self, DataError> {
        let &[n_steps, n_sites] = observations.shape() else {
            return Err(DataError::ShapeMismatch {
                what: "observations (expected [time, site])".to_string(),
                expected: vec![],
                found: observations.shape().to_vec(),
            });
        };
        Ok(Self {
            n_steps,
            n_sites,
            cells: observations.data().iter().map(|v| !v.is_nan()).collect(),
        })
    }

    #[must_use]
    pub fn shape(&self) -> [usize; 2] {
        [self.n_steps, self.n_sites]
    }

    /// Number of selected cells
    #[must_use]
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }

    /// AND with a site mask broadcast across every time step
    pub fn and_sites(&self, sites: &SiteMask) -> Result<CellMask, DataError> {
        if sites.len() != self.n_sites {
            return Err(DataError::ShapeMismatch {
                what: "site mask against cell mask".to_string(),
                expected: vec![self.n_sites],
                found: vec![sites.len()],
            });
        }
        let keep = sites.as_slice();
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, &c)| c && keep[i % self.n_sites])
            .collect();
        Ok(Self {
            n_steps: self.n_steps,
            n_sites: self.n_sites,
            cells,
        })
    }

    /// Flatten a `[time, site]` dataset to the selected cells
    pub fn apply(&self, grid: &Dataset) -> Result<Vec<f64>, DataError> {
        grid.expect_shape("masked driver", &self.shape())?;
        Ok(grid
            .data()
            .iter()
            .zip(&self.cells)
            .filter_map(|(&v, &keep)| keep.then_some(v))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observations() -> Dataset {
        Dataset::from_data(vec![2, 3], vec![1.0, f64::NAN, 3.0, f64::NAN, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn test_not_missing() {
        let mask = CellMask::not_missing(&observations()).unwrap();
        assert_eq!(mask.as_slice(), &[true, false, true, false, true, true]);
        assert_eq!(mask.count(), 4);
    }

    #[test]
    fn test_not_missing_requires_2d() {
        let flat = Dataset::filled(vec![4], 1.0);
        assert!(CellMask::not_missing(&flat).is_err());
    }

    #[test]
    fn test_and_sites_broadcasts_over_time() {
        let mask = CellMask::not_missing(&observations()).unwrap();
        let sites = SiteMask::from_vec(vec![false, true, true]);
        let combined = mask.and_sites(&sites).unwrap();
        assert_eq!(combined.as_slice(), &[false, false, true, false, true, true]);
    }

    #[test]
    fn test_and_sites_shape_mismatch() {
        let mask = CellMask::not_missing(&observations()).unwrap();
        assert!(mask.and_sites(&SiteMask::all(2)).is_err());
    }

    #[test]
    fn test_apply_flattens_time_major() {
        let mask = CellMask::not_missing(&observations()).unwrap();
        let driver = Dataset::from_data(vec![2, 3], vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0])
            .unwrap();
        assert_eq!(mask.apply(&driver).unwrap(), vec![10.0, 12.0, 14.0, 15.0]);
        assert!(mask.apply(&Dataset::filled(vec![3, 2], 0.0)).is_err());
    }

    #[test]
    fn test_site_mask_for_class() {
        let dominant = [Some(1), Some(4), None, Some(1)];
        let mask = SiteMask::for_class(&dominant, 1);
        assert_eq!(mask.as_slice(), &[true, false, false, true]);
        assert_eq!(mask.selected().collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(mask.count(), 2);
    }
}
