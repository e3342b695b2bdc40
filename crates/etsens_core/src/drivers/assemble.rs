use crate::config::DataConfig;
use crate::error::DataError;
use crate::model::EtModel;
use crate::store::{DataStore, Dataset, JsonStore};

use super::{
    AssembledData, CellMask, DRIVER_COUNT, DriverSet, SiteMask, Stratum, dominant_classes,
};

/// Open the store named in `config`, assemble, and release the store.
pub fn assemble_from_file<M: EtModel + ?Sized>(
    config: &DataConfig,
    model: &M,
    stratum: Stratum,
) -> Result<AssembledData, DataError> {
    let store = JsonStore::open(&config.file)?;
    let assembled = assemble(&store, config, model, stratum);
    drop(store);
    tracing::debug!(path = %config.file.display(), "Released backing store");
    assembled
}

/// Build co-indexed driver arrays and observations for `stratum`.
///
/// Every returned driver and the observation vector have the same length;
/// element `i` of each comes from the same `(time, site)` cell.
pub fn assemble<S, M>(
    store: &S,
    config: &DataConfig,
    model: &M,
    stratum: Stratum,
) -> Result<AssembledData, DataError>
where
    S: DataStore + ?Sized,
    M: EtModel + ?Sized,
{
    tracing::info!(%stratum, "Loading driver datasets");

    let tmin_raw = store.dataset(&config.met("Tmin"))?;
    let &[n_steps, n_sites] = tmin_raw.shape() else {
        return Err(DataError::ShapeMismatch {
            what: config.met("Tmin"),
            expected: vec![],
            found: tmin_raw.shape().to_vec(),
        });
    };

    let (sites, site_ids) = select_sites(store, config, stratum, n_sites)?;
    tracing::info!(
        selected = sites.count(),
        total = n_sites,
        steps = n_steps,
        "Selected sites"
    );

    let met = |name: &str| load_grid(store, &config.met(name), &sites, n_steps);

    let lw_net_day = met("LWGNT_daytime")?;
    let lw_net_night = met("LWGNT_nighttime")?;
    let sw_rad_day = met("SWGDN_daytime")?;
    let sw_rad_night = met("SWGDN_nighttime")?;
    let temp_day = met("T10M_daytime")?;
    let temp_night = met("T10M_nighttime")?;
    let tmin = tmin_raw.select(1, sites.as_slice())?;
    // Balanced years make the overall mean equal to the annual mean
    let temp_annual = met("T10M")?.mean_axis0().broadcast_leading(n_steps);
    let vpd_day = derive_vpd(
        model,
        &met("QV10M_daytime")?,
        &met("PS_daytime")?,
        &temp_day,
    )?;
    let vpd_night = derive_vpd(
        model,
        &met("QV10M_nighttime")?,
        &met("PS_nighttime")?,
        &temp_night,
    )?;

    // After VPD, air pressure comes from elevation alone
    let elevation = load_static(store, &config.datasets.elevation, &sites)?;
    let pressure = elevation
        .map(|z| model.air_pressure(z))
        .broadcast_leading(n_steps);

    let sw_albedo = load_subsite(store, &config.datasets.albedo, &sites, n_steps)?;
    // fPAR is stored in percent, LAI scaled by 10
    let fpar = load_subsite(store, &config.datasets.fpar, &sites, n_steps)?.map(|v| v / 100.0);
    let lai = load_subsite(store, &config.datasets.lai, &sites, n_steps)?.map(|v| v / 10.0);

    let observed = load_grid(store, &config.observations, &sites, n_steps)?;

    let mut mask = CellMask::not_missing(&observed)?;
    if let Stratum::Population { validation: true } = stratum {
        let flags = load_grid(store, &config.validation_mask, &sites, n_steps)?;
        mask = mask.and_sites(&validation_sites(&flags))?;
    }

    let cells = mask.count();
    if cells == 0 {
        return Err(DataError::EmptyMask {
            stratum: stratum.to_string(),
        });
    }

    // Calling order of the model
    let grids: [&Dataset; DRIVER_COUNT] = [
        &lw_net_day,
        &lw_net_night,
        &sw_rad_day,
        &sw_rad_night,
        &sw_albedo,
        &temp_day,
        &temp_night,
        &temp_annual,
        &tmin,
        &vpd_day,
        &vpd_night,
        &pressure,
        &fpar,
        &lai,
    ];
    let mut columns: [Vec<f64>; DRIVER_COUNT] = Default::default();
    for (column, grid) in columns.iter_mut().zip(grids) {
        *column = mask.apply(grid)?;
    }
    let drivers = DriverSet::new(columns)?;
    let observations = mask.apply(&observed)?;

    tracing::info!(cells, sites = site_ids.len(), "Driver data assembled");
    Ok(AssembledData {
        stratum,
        drivers,
        observations,
        sites: site_ids,
    })
}

/// Site selection for the stratum, with the identifiers of the kept sites
fn select_sites<S: DataStore + ?Sized>(
    store: &S,
    config: &DataConfig,
    stratum: Stratum,
    n_sites: usize,
) -> Result<(SiteMask, Vec<String>), DataError> {
    let sites = match stratum {
        Stratum::Pft(class) => {
            let dominant = dominant_classes(&store.dataset(&config.pft)?)?;
            if dominant.len() != n_sites {
                return Err(DataError::ShapeMismatch {
                    what: config.pft.clone(),
                    expected: vec![n_sites],
                    found: vec![dominant.len()],
                });
            }
            SiteMask::for_class(&dominant, class)
        }
        Stratum::Population { .. } => SiteMask::all(n_sites),
    };

    // Identifiers are required to report a class selection, optional otherwise
    let ids = if matches!(stratum, Stratum::Pft(_)) || store.contains(&config.site_id) {
        let all = store.strings(&config.site_id)?;
        if all.len() != n_sites {
            return Err(DataError::ShapeMismatch {
                what: config.site_id.clone(),
                expected: vec![n_sites],
                found: vec![all.len()],
            });
        }
        sites.selected().map(|i| all[i].clone()).collect()
    } else {
        Vec::new()
    };
    Ok((sites, ids))
}

/// Load a `[time, site]` dataset and keep the selected sites
fn load_grid<S: DataStore + ?Sized>(
    store: &S,
    path: &str,
    sites: &SiteMask,
    n_steps: usize,
) -> Result<Dataset, DataError> {
    let raw = store.dataset(path)?;
    raw.expect_shape(path, &[n_steps, sites.len()])?;
    raw.select(1, sites.as_slice())
}

/// Load a `[time, site]` or `[time, site, subgrid]` dataset, averaging the
/// subgrid while skipping missing values
fn load_subsite<S: DataStore + ?Sized>(
    store: &S,
    path: &str,
    sites: &SiteMask,
    n_steps: usize,
) -> Result<Dataset, DataError> {
    let raw = store.dataset(path)?;
    match raw.shape() {
        [_, _] => {
            raw.expect_shape(path, &[n_steps, sites.len()])?;
            raw.select(1, sites.as_slice())
        }
        &[steps, n, _] if steps == n_steps && n == sites.len() => {
            Ok(raw.select(1, sites.as_slice())?.nanmean_last_axis())
        }
        other => Err(DataError::ShapeMismatch {
            what: path.to_string(),
            expected: vec![n_steps, sites.len()],
            found: other.to_vec(),
        }),
    }
}

/// Load a static `[site]` or `[site, subgrid]` field as one value per site
fn load_static<S: DataStore + ?Sized>(
    store: &S,
    path: &str,
    sites: &SiteMask,
) -> Result<Dataset, DataError> {
    let raw = store.dataset(path)?;
    if raw.ndim() == 0 || raw.ndim() > 2 || raw.shape()[0] != sites.len() {
        return Err(DataError::ShapeMismatch {
            what: path.to_string(),
            expected: vec![sites.len()],
            found: raw.shape().to_vec(),
        });
    }
    let selected = raw.select(0, sites.as_slice())?;
    Ok(if selected.ndim() == 2 {
        selected.nanmean_last_axis()
    } else {
        selected
    })
}

fn derive_vpd<M: EtModel + ?Sized>(
    model: &M,
    qv10m: &Dataset,
    pressure: &Dataset,
    temp: &Dataset,
) -> Result<Dataset, DataError> {
    let shape = temp.shape().to_vec();
    qv10m.expect_shape("specific humidity", &shape)?;
    pressure.expect_shape("surface pressure", &shape)?;
    let data = qv10m
        .data()
        .iter()
        .zip(pressure.data())
        .zip(temp.data())
        .map(|((&q, &p), &t)| model.vpd(q, p, t))
        .collect();
    Dataset::from_data(shape.clone(), data).ok_or(DataError::ShapeMismatch {
        what: "vapour pressure deficit".to_string(),
        expected: shape,
        found: vec![],
    })
}

/// Sites flagged for validation at any time step.
///
/// Missing flags count as "not flagged". A summed float mask would let a
/// single `NaN` flag mark the whole site; here a site needs a real nonzero
/// flag.
fn validation_sites(flags: &Dataset) -> SiteMask {
    let n_sites = flags.shape().get(1).copied().unwrap_or(0);
    let mut keep = vec![false; n_sites];
    for row in flags.data().chunks(n_sites.max(1)) {
        for (k, &flag) in keep.iter_mut().zip(row) {
            if flag.is_finite() && flag != 0.0 {
                *k = true;
            }
        }
    }
    SiteMask::from_vec(keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::DriverVariable;
    use crate::model::Mod16;
    use crate::store::MemoryStore;
    use crate::tests::fixtures::{self, TowerFixture};

    #[test]
    fn test_population_mode_applies_validation_subset() {
        let fixture = TowerFixture::default();
        let data = assemble(
            &fixture.store(),
            &fixtures::data_config(),
            &Mod16,
            Stratum::Population { validation: true },
        )
        .unwrap();
        assert_eq!(data.len(), fixture.expected_validation_cells());
        assert_eq!(data.sites.len(), fixture.n_sites);
    }

    #[test]
    fn test_population_without_validation_keeps_all_observed_cells() {
        let fixture = TowerFixture::default();
        let data = assemble(
            &fixture.store(),
            &fixtures::data_config(),
            &Mod16,
            Stratum::Population { validation: false },
        )
        .unwrap();
        assert_eq!(data.len(), fixture.observed_cells());
    }

    #[test]
    fn test_drivers_are_co_indexed() {
        let fixture = TowerFixture::default();
        let data = assemble(
            &fixture.store(),
            &fixtures::data_config(),
            &Mod16,
            Stratum::Population { validation: false },
        )
        .unwrap();
        for (var, column) in data.drivers.iter() {
            assert_eq!(column.len(), data.observations.len(), "driver {var}");
        }
    }

    #[test]
    fn test_unit_conversions_and_derivations() {
        let fixture = TowerFixture::default();
        let data = assemble(
            &fixture.store(),
            &fixtures::data_config(),
            &Mod16,
            Stratum::Population { validation: false },
        )
        .unwrap();
        let fpar = data.drivers.get(DriverVariable::Fpar);
        assert!(fpar.iter().all(|&v| (0.0..=1.0).contains(&v)));
        let pressure = data.drivers.get(DriverVariable::Pressure);
        assert!(pressure.iter().all(|&p| p > 80_000.0 && p <= 101_325.0));
        let vpd = data.drivers.get(DriverVariable::VpdDay);
        assert!(vpd.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_missing_dataset_is_data_source_error() {
        let fixture = TowerFixture::default();
        let mut store = fixture.store();
        store.remove("MERRA2/SWGDN_daytime");
        let err = assemble(
            &store,
            &fixtures::data_config(),
            &Mod16,
            Stratum::Population { validation: true },
        )
        .unwrap_err();
        assert!(
            matches!(err, DataError::DataSource { ref path, .. } if path == "MERRA2/SWGDN_daytime")
        );
    }

    #[test]
    fn test_wrong_driver_shape() {
        let fixture = TowerFixture::default();
        let mut store = fixture.store();
        store.insert("MERRA2/T10M_daytime", Dataset::filled(vec![2, 2], 290.0));
        let err = assemble(
            &store,
            &fixtures::data_config(),
            &Mod16,
            Stratum::Population { validation: false },
        )
        .unwrap_err();
        assert!(matches!(err, DataError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_validation_sites_ignores_missing_flags() {
        let flags =
            Dataset::from_data(vec![2, 3], vec![0.0, f64::NAN, 0.0, 1.0, f64::NAN, 0.0]).unwrap();
        assert_eq!(validation_sites(&flags).as_slice(), &[true, false, false]);

        // NaN next to a real flag does not unflag the site
        let mixed = Dataset::from_data(vec![2, 2], vec![f64::NAN, 0.0, 2.0, f64::NAN]).unwrap();
        assert_eq!(validation_sites(&mixed).as_slice(), &[true, false]);
    }

    #[test]
    fn test_assemble_from_missing_file() {
        let mut config = fixtures::data_config();
        config.file = "/nonexistent/towers.json".into();
        let err = assemble_from_file(&config, &Mod16, Stratum::Pft(1)).unwrap_err();
        assert!(matches!(err, DataError::DataSource { .. }));
    }

    #[test]
    fn test_empty_store() {
        let err = assemble(
            &MemoryStore::new(),
            &fixtures::data_config(),
            &Mod16,
            Stratum::Pft(1),
        )
        .unwrap_err();
        assert!(matches!(err, DataError::DataSource { ref path, .. } if path == "MERRA2/Tmin"));
    }
}
