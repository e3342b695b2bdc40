//! Driver data assembly.
//!
//! Loads per-timestep, per-site meteorological and vegetation drivers plus the
//! observed target from a `DataStore`, stratifies sites by vegetation class,
//! masks out missing observations, and returns co-indexed 1-D arrays: element
//! `i` of every driver and of the observations refers to the same original
//! `(time, site)` cell.

mod assemble;
mod mask;
mod pft;

pub use assemble::{assemble, assemble_from_file};
pub use mask::{CellMask, SiteMask};
pub use pft::{dominant_class, dominant_classes};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Driver variables, in the model's calling order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DriverVariable {
    LwNetDay,
    LwNetNight,
    SwRadDay,
    SwRadNight,
    SwAlbedo,
    TempDay,
    TempNight,
    TempAnnual,
    Tmin,
    VpdDay,
    VpdNight,
    Pressure,
    Fpar,
    Lai,
}

pub const DRIVER_COUNT: usize = 14;

impl DriverVariable {
    pub const ALL: [DriverVariable; DRIVER_COUNT] = [
        DriverVariable::LwNetDay,
        DriverVariable::LwNetNight,
        DriverVariable::SwRadDay,
        DriverVariable::SwRadNight,
        DriverVariable::SwAlbedo,
        DriverVariable::TempDay,
        DriverVariable::TempNight,
        DriverVariable::TempAnnual,
        DriverVariable::Tmin,
        DriverVariable::VpdDay,
        DriverVariable::VpdNight,
        DriverVariable::Pressure,
        DriverVariable::Fpar,
        DriverVariable::Lai,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            DriverVariable::LwNetDay => "lw_net_day",
            DriverVariable::LwNetNight => "lw_net_night",
            DriverVariable::SwRadDay => "sw_rad_day",
            DriverVariable::SwRadNight => "sw_rad_night",
            DriverVariable::SwAlbedo => "sw_albedo",
            DriverVariable::TempDay => "temp_day",
            DriverVariable::TempNight => "temp_night",
            DriverVariable::TempAnnual => "temp_annual",
            DriverVariable::Tmin => "tmin",
            DriverVariable::VpdDay => "vpd_day",
            DriverVariable::VpdNight => "vpd_night",
            DriverVariable::Pressure => "pressure",
            DriverVariable::Fpar => "fpar",
            DriverVariable::Lai => "lai",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DriverVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Masked, co-indexed driver arrays
#[derive(Debug, Clone, PartialEq)]
pub struct DriverSet {
    columns: [Vec<f64>; DRIVER_COUNT],
}

impl DriverSet {
    /// Columns must be given in `DriverVariable::ALL` order and share one length
    pub fn new(columns: [Vec<f64>; DRIVER_COUNT]) -> Result<Self, DataError> {
        let n = columns[0].len();
        for (var, column) in DriverVariable::ALL.iter().zip(&columns) {
            if column.len() != n {
                return Err(DataError::ShapeMismatch {
                    what: format!("driver {var}"),
                    expected: vec![n],
                    found: vec![column.len()],
                });
            }
        }
        Ok(Self { columns })
    }

    /// Number of cells (common length of every driver)
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, var: DriverVariable) -> &[f64] {
        &self.columns[var.index()]
    }

    /// Drivers in calling order
    pub fn iter(&self) -> impl Iterator<Item = (DriverVariable, &[f64])> {
        DriverVariable::ALL
            .iter()
            .map(move |&var| (var, self.get(var)))
    }
}

/// Which part of the site population an analysis covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stratum {
    /// Every site; `validation` restricts cells to the validation subset
    Population { validation: bool },
    /// Sites whose dominant vegetation class is this code
    Pft(u8),
}

impl Stratum {
    /// Stratum for an invocation with an optional class filter.
    ///
    /// Without a class the whole population is restricted to the validation
    /// subset; with a class there is no validation restriction.
    #[must_use]
    pub fn for_invocation(pft: Option<u8>) -> Self {
        match pft {
            None => Stratum::Population { validation: true },
            Some(class) => Stratum::Pft(class),
        }
    }

    #[must_use]
    pub fn pft(self) -> Option<u8> {
        match self {
            Stratum::Population { .. } => None,
            Stratum::Pft(class) => Some(class),
        }
    }
}

impl fmt::Display for Stratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stratum::Population { validation: true } => write!(f, "all sites, validation subset"),
            Stratum::Population { validation: false } => write!(f, "all sites"),
            Stratum::Pft(class) => write!(f, "PFT {class}"),
        }
    }
}

/// Output of the assembler: drivers and observations ready for scoring
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledData {
    pub stratum: Stratum,
    pub drivers: DriverSet,
    pub observations: Vec<f64>,
    /// Identifiers of the selected sites (empty when the store has none)
    pub sites: Vec<String>,
}

impl AssembledData {
    /// Number of co-indexed cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
