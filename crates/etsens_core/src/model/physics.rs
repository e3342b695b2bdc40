//! Atmospheric and surface-energy relations shared by ET models.
//!
//! Pure functions of already-loaded drivers. Temperatures are in K unless the
//! argument name says otherwise; pressures in Pa.

/// Freezing point of water [K]
pub const ZERO_CELSIUS: f64 = 273.15;

/// Specific heat of air at constant pressure [J kg-1 K-1]
pub const SPECIFIC_HEAT_AIR: f64 = 1013.0;

/// Stefan-Boltzmann constant [W m-2 K-4]
pub const STEFAN_BOLTZMANN: f64 = 5.67e-8;

/// Standard sea-level pressure [Pa]
pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0;

/// Specific gas constant of dry air [J kg-1 K-1]
const GAS_CONSTANT_AIR: f64 = 287.05;

/// Ratio of molecular weights of water vapour and dry air
const EPSILON: f64 = 0.622;

/// Saturation vapour pressure over water [Pa], Magnus form.
pub fn svp(temp_c: f64) -> f64 {
    610.7 * ((17.38 * temp_c) / (239.0 + temp_c)).exp()
}

/// Slope of the saturation vapour pressure curve [Pa K-1]
pub fn svp_slope(temp_c: f64) -> f64 {
    17.38 * 239.0 * svp(temp_c) / (239.0 + temp_c).powi(2)
}

/// Actual vapour pressure [Pa] from specific humidity [kg kg-1]
pub fn avp(qv10m: f64, pressure: f64) -> f64 {
    (qv10m * pressure) / (EPSILON + 0.379 * qv10m)
}

/// Vapour pressure deficit [Pa], floored at zero.
pub fn vpd(qv10m: f64, pressure: f64, temp_k: f64) -> f64 {
    let deficit = svp(temp_k - ZERO_CELSIUS) - avp(qv10m, pressure);
    // NaN passes through so missing drivers stay missing
    if deficit < 0.0 { 0.0 } else { deficit }
}

/// Air pressure [Pa] at elevation [m] (standard atmosphere)
pub fn air_pressure(elevation_m: f64) -> f64 {
    SEA_LEVEL_PRESSURE * (1.0 - 2.25577e-5 * elevation_m).powf(5.25588)
}

/// Latent heat of vaporization [J kg-1]
pub fn latent_heat_vaporization(temp_c: f64) -> f64 {
    (2.501 - 0.002361 * temp_c) * 1e6
}

/// Psychrometric constant [Pa K-1]
pub fn psychrometric_constant(pressure: f64, temp_c: f64) -> f64 {
    (SPECIFIC_HEAT_AIR * pressure) / (EPSILON * latent_heat_vaporization(temp_c))
}

/// Density of moist air approximated by the ideal gas law [kg m-3]
pub fn air_density(pressure: f64, temp_k: f64) -> f64 {
    pressure / (GAS_CONSTANT_AIR * temp_k)
}

/// Resistance to radiative heat transfer through air [s m-1]
pub fn radiative_resistance(density: f64, temp_k: f64) -> f64 {
    (density * SPECIFIC_HEAT_AIR) / (4.0 * STEFAN_BOLTZMANN * temp_k.powi(3))
}

/// Ramp from 0 at `low` to 1 at `high`, clamped outside.
pub fn ramp(x: f64, low: f64, high: f64) -> f64 {
    if x <= low {
        0.0
    } else if x >= high {
        1.0
    } else {
        (x - low) / (high - low)
    }
}

/// Parallel combination of two resistances
pub fn parallel(a: f64, b: f64) -> f64 {
    (a * b) / (a + b)
}
