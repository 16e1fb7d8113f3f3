//! Equilibrium lattice parameters from Birch-Murnaghan fit results.
//!
//! A fit file stores the fitted minimum volume of the simulation cell for each
//! `element-configuration` pair. The lattice parameter reported here is the
//! edge of the conventional cube that holds the same number of atoms, i.e.
//! `cbrt(min_volume / atoms_in_cell * volume_per_atom_to_cubic_volume)`.

use crate::domain::{AcwfError, AcwfResult, AlatMap, FitKey};
use crate::modules::serialization::read_json_artifact;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const SUPPORTED_SCRIPT_VERSIONS: [&str; 2] = ["0.0.3", "0.0.4"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FitRecord {
    pub min_volume: f64,
}

pub type FitTable = BTreeMap<String, Option<FitRecord>>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawDataset {
    pub script_version: String,
    #[serde(rename = "BM_fit_data")]
    pub fit_data: FitTable,
    #[serde(default)]
    pub num_atoms_in_sim_cell: BTreeMap<String, u32>,
}

/// A file that only carries fit results, without the dataset metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FitDataFile {
    #[serde(rename = "BM_fit_data")]
    pub fit_data: FitTable,
}

impl RawDataset {
    pub fn load(path: &Path) -> AcwfResult<Self> {
        read_json_artifact(path)
    }

    /// Keeps this dataset's metadata and replaces its fit results.
    pub fn with_fit_data(&self, fit_data: FitTable) -> Self {
        Self {
            script_version: self.script_version.clone(),
            fit_data,
            num_atoms_in_sim_cell: self.num_atoms_in_sim_cell.clone(),
        }
    }
}

impl FitDataFile {
    pub fn load(path: &Path) -> AcwfResult<Self> {
        read_json_artifact(path)
    }
}

pub fn extract_alats(dataset: &RawDataset) -> AcwfResult<AlatMap> {
    if !SUPPORTED_SCRIPT_VERSIONS.contains(&dataset.script_version.as_str()) {
        return Err(AcwfError::input_validation(
            "INPUT.SCRIPT_VERSION",
            format!(
                "unsupported script_version '{}'; expected one of {:?}",
                dataset.script_version, SUPPORTED_SCRIPT_VERSIONS
            ),
        ));
    }

    let mut alats = AlatMap::new();
    for (raw_key, record) in &dataset.fit_data {
        let key = FitKey::parse(raw_key)?;
        let Some(record) = record else {
            alats.insert(key.configuration, &key.element, None);
            continue;
        };

        let num_atoms = key.configuration.atoms_in_simulation_cell();
        if let Some(&declared) = dataset.num_atoms_in_sim_cell.get(raw_key) {
            if declared != num_atoms {
                return Err(AcwfError::input_validation(
                    "INPUT.NUM_ATOMS_MISMATCH",
                    format!(
                        "'{}' declares {} atoms in the simulation cell, expected {}",
                        raw_key, declared, num_atoms
                    ),
                ));
            }
        }

        let alat = alat_from_min_volume(raw_key, &key, record.min_volume, num_atoms)?;
        alats.insert(key.configuration, &key.element, Some(alat));
    }

    tracing::debug!(
        configurations = alats.configurations().len(),
        script_version = %dataset.script_version,
        "extracted lattice parameters"
    );
    Ok(alats)
}

fn alat_from_min_volume(
    raw_key: &str,
    key: &FitKey,
    min_volume: f64,
    num_atoms: u32,
) -> AcwfResult<f64> {
    if !(min_volume.is_finite() && min_volume > 0.0) {
        return Err(AcwfError::input_validation(
            "INPUT.MIN_VOLUME",
            format!("'{}' has non-positive min_volume {}", raw_key, min_volume),
        ));
    }
    let volume_per_atom = min_volume / f64::from(num_atoms);
    let cubic_volume = volume_per_atom * key.configuration.volume_per_atom_to_cubic_volume();
    Ok(cubic_volume.cbrt())
}
