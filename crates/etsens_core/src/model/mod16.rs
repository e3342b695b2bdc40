//! MOD16-style evapotranspiration model.
//!
//! Daily latent heat flux [W m-2] is the mean of a daytime and a nighttime
//! estimate. Each is the sum of:
//! - wet-canopy evaporation
//! - transpiration (Penman-Monteith, stomata closed at night)
//! - soil evaporation, split into wet and moisture-constrained parts
//!
//! Parameters:
//! - `tmin_close`, `tmin_open`: minimum temperature [C] ramp for stomatal closure
//! - `vpd_open`, `vpd_close`: VPD [Pa] ramp for stomatal closure
//! - `gl_sh`: leaf conductance to sensible heat [m s-1]
//! - `gl_wv`: leaf conductance to evaporated water [m s-1]
//! - `g_cuticular`: cuticular conductance [m s-1]
//! - `csl`: mean potential stomatal conductance [m s-1]
//! - `rbl_min`, `rbl_max`: soil boundary-layer resistance range [s m-1]
//! - `beta`: soil moisture constraint on soil evaporation [Pa]

use super::EtModel;
use super::physics::{
    SPECIFIC_HEAT_AIR, ZERO_CELSIUS, air_density, parallel, psychrometric_constant,
    radiative_resistance, ramp, svp, svp_slope,
};
use crate::drivers::{DriverSet, DriverVariable};
use crate::error::ModelError;

/// Parameter names in calling order.
pub const PARAM_NAMES: &[&str] = &[
    "tmin_close",
    "tmin_open",
    "vpd_open",
    "vpd_close",
    "gl_sh",
    "gl_wv",
    "g_cuticular",
    "csl",
    "rbl_min",
    "rbl_max",
    "beta",
];

/// Relative humidity below which the canopy and soil surface are dry.
const WET_SURFACE_RH: f64 = 0.7;

/// Ground heat flux coefficient [W m-2 K-1]
const GROUND_HEAT_COEFF: f64 = 4.73;

/// Ground heat flux cannot exceed this fraction of available energy.
const GROUND_HEAT_MAX_FRACTION: f64 = 0.39;

/// Reference temperature for conductance corrections [K]
const REFERENCE_TEMP: f64 = 293.15;

/// Reference pressure for conductance corrections [Pa]
const REFERENCE_PRESSURE: f64 = 101_300.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mod16Params {
    pub tmin_close: f64,
    pub tmin_open: f64,
    pub vpd_open: f64,
    pub vpd_close: f64,
    pub gl_sh: f64,
    pub gl_wv: f64,
    pub g_cuticular: f64,
    pub csl: f64,
    pub rbl_min: f64,
    pub rbl_max: f64,
    pub beta: f64,
}

impl Mod16Params {
    pub fn from_slice(values: &[f64]) -> Result<Self, ModelError> {
        let &[
            tmin_close,
            tmin_open,
            vpd_open,
            vpd_close,
            gl_sh,
            gl_wv,
            g_cuticular,
            csl,
            rbl_min,
            rbl_max,
            beta,
        ] = values
        else {
            return Err(ModelError::ParameterCount {
                expected: PARAM_NAMES.len(),
                found: values.len(),
            });
        };
        Ok(Self {
            tmin_close,
            tmin_open,
            vpd_open,
            vpd_close,
            gl_sh,
            gl_wv,
            g_cuticular,
            csl,
            rbl_min,
            rbl_max,
            beta,
        })
    }

    /// Stomatal opening in [0, 1] from minimum temperature [K] and VPD [Pa]
    fn stomatal_opening(&self, tmin_k: f64, vpd: f64) -> f64 {
        let m_tmin = ramp(tmin_k - ZERO_CELSIUS, self.tmin_close, self.tmin_open);
        let m_vpd = 1.0 - ramp(vpd, self.vpd_open, self.vpd_close);
        m_tmin * m_vpd
    }

    /// Soil boundary-layer resistance: `rbl_max` under humid air, falling
    /// linearly to `rbl_min` as VPD approaches `vpd_close`.
    fn boundary_layer_resistance(&self, vpd: f64) -> f64 {
        self.rbl_max - (self.rbl_max - self.rbl_min) * ramp(vpd, self.vpd_open, self.vpd_close)
    }
}

/// Meteorology and vegetation state for one half-day
#[derive(Debug, Clone, Copy)]
struct HalfDay {
    sw_rad: f64,
    lw_net: f64,
    albedo: f64,
    temp_k: f64,
    temp_annual_k: f64,
    tmin_k: f64,
    vpd: f64,
    pressure: f64,
    fpar: f64,
    lai: f64,
    daytime: bool,
}

impl HalfDay {
    fn latent_heat(&self, p: &Mod16Params) -> f64 {
        let temp_c = self.temp_k - ZERO_CELSIUS;
        let available = self.sw_rad * (1.0 - self.albedo) + self.lw_net;
        // f64::clamp panics on NaN bounds
        let limit = GROUND_HEAT_MAX_FRACTION * available.abs();
        let ground = (GROUND_HEAT_COEFF * (temp_c - (self.temp_annual_k - ZERO_CELSIUS)))
            .max(-limit)
            .min(limit);
        let canopy_energy = self.fpar * available;
        let soil_energy = (1.0 - self.fpar) * available - ground;

        let rho = air_density(self.pressure, self.temp_k);
        let cp_rho = rho * SPECIFIC_HEAT_AIR;
        let gamma = psychrometric_constant(self.pressure, temp_c);
        let s = svp_slope(temp_c);
        let rr = radiative_resistance(rho, self.temp_k);

        let rh = (1.0 - self.vpd / svp(temp_c)).clamp(0.0, 1.0);
        let fwet = if rh < WET_SURFACE_RH { 0.0 } else { rh.powi(4) };

        // Conductances scale with air temperature and pressure
        let rcorr = 1.0
            / ((REFERENCE_PRESSURE / self.pressure) * (self.temp_k / REFERENCE_TEMP).powf(1.75));

        let wet_canopy = if fwet > 0.0 && self.lai > 0.0 {
            let rhc = 1.0 / (p.gl_sh * self.lai * fwet);
            let rhrc = parallel(rhc, rr);
            let rvc = 1.0 / (p.gl_wv * self.lai * fwet);
            (s * canopy_energy * fwet + cp_rho * self.fpar * self.vpd * fwet / rhrc)
                / (s + gamma * (rvc / rhrc))
        } else {
            0.0
        };

        let transpiration = if self.lai > 0.0 && fwet < 1.0 {
            let gs = if self.daytime {
                p.csl * p.stomatal_opening(self.tmin_k, self.vpd) * rcorr
            } else {
                0.0
            };
            let gcu = p.g_cuticular * rcorr;
            let leaf = (p.gl_sh * (gs + gcu)) / (p.gl_sh + gs + gcu);
            let canopy_conductance = self.lai * (1.0 - fwet) * leaf;
            if canopy_conductance > 0.0 {
                let rs = 1.0 / canopy_conductance;
                let ra = parallel(1.0 / p.gl_sh, rr);
                (1.0 - fwet) * (s * canopy_energy + cp_rho * self.fpar * self.vpd / ra)
                    / (s + gamma * (1.0 + rs / ra))
            } else {
                0.0
            }
        } else {
            0.0
        };

        let rtot = p.boundary_layer_resistance(self.vpd) / rcorr;
        let ras = parallel(rtot, rr);
        let potential_soil = (s * soil_energy + cp_rho * (1.0 - self.fpar) * self.vpd / ras)
            / (s + gamma * rtot / ras);
        let moisture = if p.beta > 0.0 {
            rh.powf(self.vpd / p.beta)
        } else {
            0.0
        };
        let soil = fwet * potential_soil + (1.0 - fwet) * potential_soil * moisture;

        wet_canopy + transpiration + soil
    }
}

/// The bundled MOD16-style model
#[derive(Debug, Clone, Copy, Default)]
pub struct Mod16;

impl EtModel for Mod16 {
    fn required_parameters(&self) -> &[&'static str] {
        PARAM_NAMES
    }

    fn predict(&self, params: &[f64], drivers: &DriverSet) -> Result<Vec<f64>, ModelError> {
        use DriverVariable as D;

        let p = Mod16Params::from_slice(params)?;
        let n = drivers.len();
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let at = |var: D| drivers.get(var)[i];
            let day = HalfDay {
                sw_rad: at(D::SwRadDay),
                lw_net: at(D::LwNetDay),
                albedo: at(D::SwAlbedo),
                temp_k: at(D::TempDay),
                temp_annual_k: at(D::TempAnnual),
                tmin_k: at(D::Tmin),
                vpd: at(D::VpdDay),
                pressure: at(D::Pressure),
                fpar: at(D::Fpar),
                lai: at(D::Lai),
                daytime: true,
            };
            let night = HalfDay {
                sw_rad: at(D::SwRadNight),
                lw_net: at(D::LwNetNight),
                temp_k: at(D::TempNight),
                vpd: at(D::VpdNight),
                daytime: false,
                ..day
            };
            let value = 0.5 * (day.latent_heat(&p) + night.latent_heat(&p));
            // Missing drivers give NaN, which the skill score skips
            if value.is_infinite() {
                return Err(ModelError::NonFinite { index: i });
            }
            out.push(value);
        }
        Ok(out)
    }
}
