//! Parameter space: calibration parameters and their admissible bounds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ProblemError;

/// Built-in bounds for the MOD16 calibration parameters
pub const DEFAULT_BOUNDS: &[(&str, f64, f64)] = &[
    ("tmin_close", -35.0, 0.0),
    ("tmin_open", 0.0, 25.0),
    ("vpd_open", 0.0, 1000.0),
    ("vpd_close", 1000.0, 8000.0),
    ("gl_sh", 0.001, 0.2),
    ("gl_wv", 0.001, 0.2),
    ("g_cuticular", 1e-7, 1e-2),
    ("csl", 0.0001, 0.1),
    ("rbl_min", 10.0, 1000.0),
    ("rbl_max", 100.0, 2000.0),
    ("beta", 0.0, 2000.0),
];

/// Admissible interval for one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBound {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

impl ParameterBound {
    pub fn new(name: impl Into<String>, lower: f64, upper: f64) -> Result<Self, ProblemError> {
        let name = name.into();
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(ProblemError::InvalidBound {
                parameter: name,
                lower,
                upper,
            });
        }
        Ok(Self { name, lower, upper })
    }

    /// Map a unit-interval coordinate into this bound
    #[must_use]
    pub fn scale(&self, unit: f64) -> f64 {
        self.lower + unit * (self.upper - self.lower)
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Registry of known parameter bounds (name -> [lower, upper])
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundsRegistry {
    bounds: BTreeMap<String, [f64; 2]>,
}

impl BoundsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with `DEFAULT_BOUNDS`
    #[must_use]
    pub fn mod16() -> Self {
        let mut registry = Self::new();
        for &(name, lower, upper) in DEFAULT_BOUNDS {
            registry.insert(name, lower, upper);
        }
        registry
    }

    pub fn insert(&mut self, name: impl Into<String>, lower: f64, upper: f64) {
        self.bounds.insert(name.into(), [lower, upper]);
    }

    /// Overlay entries from configuration on top of this registry
    #[must_use]
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, [f64; 2]>) -> Self {
        for (name, &[lower, upper]) in overrides {
            self.insert(name.clone(), lower, upper);
        }
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<[f64; 2]> {
        self.bounds.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

/// Ordered parameter names with one bound each.
///
/// Column `j` of every sample matrix built from this specification is
/// parameter `names()[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSpec {
    parameters: Vec<ParameterBound>,
}

impl ProblemSpec {
    /// Build the specification for `required` from `registry`.
    pub fn build(required: &[&str], registry: &BoundsRegistry) -> Result<Self, ProblemError> {
        let mut parameters: Vec<ParameterBound> = Vec::with_capacity(required.len());
        for &name in required {
            if parameters.iter().any(|p| p.name == name) {
                return Err(ProblemError::DuplicateParameter {
                    parameter: name.to_string(),
                });
            }
            let [lower, upper] =
                registry
                    .get(name)
                    .ok_or_else(|| ProblemError::MissingBound {
                        parameter: name.to_string(),
                    })?;
            parameters.push(ParameterBound::new(name, lower, upper)?);
        }
        Ok(Self { parameters })
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.parameters.len()
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParameterBound] {
        &self.parameters
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    #[must_use]
    pub fn bounds(&self) -> Vec<[f64; 2]> {
        self.parameters.iter().map(|p| [p.lower, p.upper]).collect()
    }

    /// Scale a point of the unit hypercube into parameter space
    #[must_use]
    pub fn scale(&self, unit_row: &[f64]) -> Vec<f64> {
        self.parameters
            .iter()
            .zip(unit_row)
            .map(|(p, &u)| p.scale(u))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_preserves_required_order() {
        let registry = BoundsRegistry::mod16();
        let problem = ProblemSpec::build(&["beta", "csl", "tmin_open"], &registry).unwrap();
        let names: Vec<&str> = problem.names().collect();
        assert_eq!(names, vec!["beta", "csl", "tmin_open"]);
        assert_eq!(problem.bounds()[1], [0.0001, 0.1]);
    }

    #[test]
    fn test_missing_bound() {
        let registry = BoundsRegistry::mod16();
        let err = ProblemSpec::build(&["beta", "not_a_parameter"], &registry).unwrap_err();
        assert_eq!(
            err,
            ProblemError::MissingBound {
                parameter: "not_a_parameter".into()
            }
        );
    }

    #[test]
    fn test_invalid_bound() {
        let mut registry = BoundsRegistry::new();
        registry.insert("a", 1.0, 1.0);
        let err = ProblemSpec::build(&["a"], &registry).unwrap_err();
        assert!(matches!(err, ProblemError::InvalidBound { .. }));

        registry.insert("a", f64::NAN, 1.0);
        assert!(ProblemSpec::build(&["a"], &registry).is_err());
    }

    #[test]
    fn test_duplicate_parameter() {
        let registry = BoundsRegistry::mod16();
        let err = ProblemSpec::build(&["beta", "beta"], &registry).unwrap_err();
        assert!(matches!(err, ProblemError::DuplicateParameter { .. }));
    }

    #[test]
    fn test_overrides() {
        let overrides = BTreeMap::from([
            ("beta".to_string(), [10.0, 20.0]),
            ("extra".to_string(), [0.0, 1.0]),
        ]);
        let registry = BoundsRegistry::mod16().with_overrides(&overrides);
        assert_eq!(registry.get("beta"), Some([10.0, 20.0]));
        assert_eq!(registry.get("extra"), Some([0.0, 1.0]));
        assert_eq!(registry.len(), DEFAULT_BOUNDS.len() + 1);
    }

    #[test]
    fn test_scale_unit_row() {
        let mut registry = BoundsRegistry::new();
        registry.insert("a", 0.0, 10.0);
        registry.insert("b", -1.0, 1.0);
        let problem = ProblemSpec::build(&["a", "b"], &registry).unwrap();
        let row = problem.scale(&[0.5, 0.25]);
        assert!((row[0] - 5.0).abs() < 1e-12);
        assert!((row[1] + 0.5).abs() < 1e-12);
    }
}
