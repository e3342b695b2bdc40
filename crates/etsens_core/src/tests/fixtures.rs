//! Shared test data: a small synthetic tower network and a linear stub model.

use std::path::Path;

use serde_json::{Map, Value, json};

use crate::config::{DataConfig, StaticDatasets};
use crate::drivers::{AssembledData, DRIVER_COUNT, DriverSet, DriverVariable, Stratum};
use crate::error::ModelError;
use crate::model::EtModel;
use crate::problem::BoundsRegistry;
use crate::store::{DataStore, Dataset, MemoryStore};

const NAN: f64 = f64::NAN;

const MET_NAMES: &[&str] = &[
    "LWGNT_daytime",
    "LWGNT_nighttime",
    "SWGDN_daytime",
    "SWGDN_nighttime",
    "T10M_daytime",
    "T10M_nighttime",
    "T10M",
    "Tmin",
    "QV10M_daytime",
    "QV10M_nighttime",
    "PS_daytime",
    "PS_nighttime",
];

pub fn static_datasets() -> StaticDatasets {
    StaticDatasets {
        albedo: "MODIS/MCD43GF_black_sky_sw_albedo".to_string(),
        elevation: "state/elevation_m".to_string(),
        fpar: "MODIS/MOD15A2HGF_fPAR".to_string(),
        lai: "MODIS/MOD15A2HGF_LAI".to_string(),
    }
}

pub fn data_config() -> DataConfig {
    DataConfig::new("towers.json", static_datasets())
}

/// Six days at four towers with three subgrid cells each.
///
/// Dominant classes are `[1, 2, 1, 4]` (tower 2 is a 1/2 tie). Three
/// observations are missing and towers 0 and 2 form the validation subset.
#[derive(Debug, Clone)]
pub struct TowerFixture {
    pub n_steps: usize,
    pub n_sites: usize,
    pub pft: Vec<[f64; 3]>,
    pub missing: Vec<(usize, usize)>,
    pub validation: Vec<(usize, usize)>,
}

impl Default for TowerFixture {
    fn default() -> Self {
        Self {
            n_steps: 6,
            n_sites: 4,
            pft: vec![
                [1.0, 1.0, 2.0],
                [2.0, 2.0, 1.0],
                [1.0, 2.0, NAN],
                [4.0, 4.0, 4.0],
            ],
            missing: vec![(0, 1), (3, 2), (5, 0)],
            validation: vec![(2, 0), (0, 2), (4, 2)],
        }
    }
}

impl TowerFixture {
    pub fn site_ids(&self) -> Vec<String> {
        (0..self.n_sites).map(|s| format!("XX-T{s:02}")).collect()
    }

    /// Expected dominant class of each tower
    pub fn dominant(&self) -> Vec<Option<u8>> {
        vec![Some(1), Some(2), Some(1), Some(4)]
    }

    pub fn observed_cells(&self) -> usize {
        self.n_steps * self.n_sites - self.missing.len()
    }

    pub fn expected_validation_cells(&self) -> usize {
        let flagged: Vec<usize> = (0..self.n_sites)
            .filter(|s| self.validation.iter().any(|&(_, site)| site == *s))
            .collect();
        flagged
            .iter()
            .map(|&s| {
                self.n_steps - self.missing.iter().filter(|&&(_, site)| site == s).count()
            })
            .sum()
    }

    /// Observed cells of the towers whose dominant class is `class`
    pub fn cells_for_class(&self, class: u8) -> usize {
        self.dominant()
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == Some(class))
            .map(|(s, _)| {
                self.n_steps - self.missing.iter().filter(|&&(_, site)| site == s).count()
            })
            .sum()
    }

    fn grid(&self, f: impl Fn(usize, usize) -> f64) -> Dataset {
        let data = (0..self.n_steps)
            .flat_map(|t| (0..self.n_sites).map(move |s| (t, s)))
            .map(|(t, s)| f(t, s))
            .collect();
        Dataset::from_data(vec![self.n_steps, self.n_sites], data).unwrap()
    }

    fn subgrid(&self, f: impl Fn(usize, usize, usize) -> f64) -> Dataset {
        let mut data = Vec::with_capacity(self.n_steps * self.n_sites * 3);
        for t in 0..self.n_steps {
            for s in 0..self.n_sites {
                for k in 0..3 {
                    data.push(f(t, s, k));
                }
            }
        }
        Dataset::from_data(vec![self.n_steps, self.n_sites, 3], data).unwrap()
    }

    pub fn store(&self) -> MemoryStore {
        let config = data_config();
        let datasets = &config.datasets;
        let warm = |t: usize, s: usize| 290.0 + t as f64 + 0.5 * s as f64;

        let mut store = MemoryStore::new();
        store.insert(config.met("LWGNT_daytime"), self.grid(|_, _| -60.0));
        store.insert(config.met("LWGNT_nighttime"), self.grid(|_, _| -45.0));
        store.insert(
            config.met("SWGDN_daytime"),
            self.grid(|t, s| 350.0 + 20.0 * t as f64 + 10.0 * s as f64),
        );
        store.insert(config.met("SWGDN_nighttime"), self.grid(|_, _| 0.0));
        store.insert(config.met("T10M_daytime"), self.grid(|t, s| warm(t, s) + 5.0));
        store.insert(config.met("T10M_nighttime"), self.grid(|t, s| warm(t, s) - 5.0));
        store.insert(config.met("T10M"), self.grid(warm));
        store.insert(config.met("Tmin"), self.grid(|t, s| warm(t, s) - 8.0));
        store.insert(config.met("QV10M_daytime"), self.grid(|_, s| 0.006 + 0.001 * s as f64));
        store.insert(config.met("QV10M_nighttime"), self.grid(|_, _| 0.007));
        store.insert(config.met("PS_daytime"), self.grid(|_, _| 97_000.0));
        store.insert(config.met("PS_nighttime"), self.grid(|_, _| 97_100.0));

        let elevation = (0..self.n_sites)
            .flat_map(|s| [100.0 * s as f64, 100.0 * s as f64 + 20.0, NAN])
            .collect();
        store.insert(
            datasets.elevation.clone(),
            Dataset::from_data(vec![self.n_sites, 3], elevation).unwrap(),
        );
        store.insert(datasets.albedo.clone(), self.subgrid(|_, _, _| 0.15));
        store.insert(
            datasets.fpar.clone(),
            self.subgrid(|t, _, k| if k == 2 { NAN } else { 40.0 + 5.0 * t as f64 }),
        );
        store.insert(
            datasets.lai.clone(),
            self.subgrid(|_, s, _| 20.0 + 5.0 * s as f64),
        );

        let pft = self.pft.iter().flatten().copied().collect();
        store.insert(
            config.pft.clone(),
            Dataset::from_data(vec![self.n_sites, 3], pft).unwrap(),
        );
        store.insert_strings(config.site_id.clone(), self.site_ids());

        store.insert(
            config.observations.clone(),
            self.grid(|t, s| {
                if self.missing.contains(&(t, s)) {
                    NAN
                } else {
                    80.0 + 15.0 * ((t * 7 + s * 3) % 5) as f64
                }
            }),
        );
        store.insert(
            config.validation_mask.clone(),
            self.grid(|t, s| {
                if self.validation.contains(&(t, s)) {
                    1.0
                } else {
                    0.0
                }
            }),
        );
        store
    }

    /// Write the fixture as a JSON store document at `path`
    pub fn write_json(&self, path: &Path) {
        let store = self.store();
        let config = data_config();
        let mut names: Vec<String> = MET_NAMES.iter().map(|n| config.met(n)).collect();
        names.extend([
            config.datasets.albedo.clone(),
            config.datasets.elevation.clone(),
            config.datasets.fpar.clone(),
            config.datasets.lai.clone(),
            config.pft.clone(),
            config.observations.clone(),
            config.validation_mask.clone(),
        ]);

        let mut datasets = Map::new();
        for name in names {
            let dataset = store.dataset(&name).unwrap();
            let data: Vec<Value> = dataset
                .data()
                .iter()
                .map(|v| if v.is_nan() { Value::Null } else { json!(v) })
                .collect();
            datasets.insert(name, json!({ "shape": dataset.shape(), "data": data }));
        }
        let mut strings = Map::new();
        strings.insert(config.site_id.clone(), json!(self.site_ids()));

        let document = json!({ "datasets": datasets, "strings": strings });
        std::fs::write(path, serde_json::to_vec(&document).unwrap()).unwrap();
    }
}

/// `slope * temp_day + offset`, ignoring every other driver
#[derive(Debug, Clone, Copy)]
pub struct LinearModel;

impl EtModel for LinearModel {
    fn required_parameters(&self) -> &[&'static str] {
        &["slope", "offset"]
    }

    fn predict(&self, params: &[f64], drivers: &DriverSet) -> Result<Vec<f64>, ModelError> {
        let &[slope, offset] = params else {
            return Err(ModelError::ParameterCount {
                expected: 2,
                found: params.len(),
            });
        };
        Ok(drivers
            .get(DriverVariable::TempDay)
            .iter()
            .map(|x| slope * x + offset)
            .collect())
    }
}

pub fn linear_registry() -> BoundsRegistry {
    let mut registry = BoundsRegistry::new();
    registry.insert("slope", 0.0, 2.0);
    registry.insert("offset", -1.0, 1.0);
    registry
}

/// Cells whose `temp_day` is `1, 2, ..., n` against `observations`
pub fn linear_data(observations: &[f64]) -> AssembledData {
    let n = observations.len();
    let columns: [Vec<f64>; DRIVER_COUNT] = std::array::from_fn(|j| {
        if DriverVariable::ALL[j] == DriverVariable::TempDay {
            (1..=n).map(|x| x as f64).collect()
        } else {
            vec![0.0; n]
        }
    });
    AssembledData {
        stratum: Stratum::Population { validation: false },
        drivers: DriverSet::new(columns).unwrap(),
        observations: observations.to_vec(),
        sites: Vec::new(),
    }
}
