//! ET scoring models.
//!
//! The orchestrator only sees the `EtModel` contract: an ordered parameter
//! list, the driver set in calling order, and one prediction per cell. Any
//! model implementing it can be swapped in without touching the pipeline.

mod mod16;
pub mod physics;

pub use mod16::{Mod16, Mod16Params};

use crate::drivers::DriverSet;
use crate::error::ModelError;

/// Contract for an ET model scored against observations.
///
/// `predict` must be deterministic and side-effect free. Rows of a sample
/// matrix may be evaluated from several threads, hence `Sync`.
pub trait EtModel: Sync {
    /// Parameter names, in the order `predict` expects their values
    fn required_parameters(&self) -> &[&'static str];

    /// Predicted target value for every cell of `drivers`
    fn predict(&self, params: &[f64], drivers: &DriverSet) -> Result<Vec<f64>, ModelError>;

    /// Vapour pressure deficit [Pa] derived while assembling drivers
    fn vpd(&self, qv10m: f64, pressure: f64, temp_k: f64) -> f64 {
        physics::vpd(qv10m, pressure, temp_k)
    }

    /// Surface air pressure [Pa] derived from elevation [m]
    fn air_pressure(&self, elevation_m: f64) -> f64 {
        physics::air_pressure(elevation_m)
    }
}
