use super::CliError;
use acwf_core::domain::{AcwfError, AlatMap, ConfigurationFamily};
use acwf_core::modules::alat::{FitDataFile, RawDataset, extract_alats};
use anyhow::Context;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub(super) const LABELS_FILE: &str = "labels.json";

/// Index of the published datasets, found at the root of the data folder.
#[derive(Debug, Deserialize, Clone)]
pub(super) struct LabelsIndex {
    #[serde(rename = "all-electron-keys")]
    pub(super) all_electron_keys: BTreeMap<String, String>,
    #[serde(rename = "methods-main")]
    pub(super) methods_main: BTreeMap<String, BTreeMap<String, String>>,
}

impl LabelsIndex {
    pub(super) fn dataset_path(
        &self,
        code: ReferenceCode,
        family: ConfigurationFamily,
    ) -> Result<PathBuf, CliError> {
        let label = self.all_electron_keys.get(code.as_str()).ok_or_else(|| {
            CliError::Compute(AcwfError::input_validation(
                "INPUT.LABELS_INDEX",
                format!("'{}' has no all-electron key for {}", LABELS_FILE, code.as_str()),
            ))
        })?;
        let relative = self
            .methods_main
            .get(label)
            .and_then(|sets| sets.get(family.as_str()))
            .ok_or_else(|| {
                CliError::Compute(AcwfError::input_validation(
                    "INPUT.LABELS_INDEX",
                    format!(
                        "'{}' lists no {} dataset for method '{}'",
                        LABELS_FILE,
                        family.as_str(),
                        label
                    ),
                ))
            })?;
        Ok(PathBuf::from(relative))
    }
}

/// The two all-electron codes whose average is the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(super) enum ReferenceCode {
    #[serde(rename = "FLEUR")]
    Fleur,
    #[serde(rename = "WIEN2k")]
    Wien2k,
}

impl ReferenceCode {
    pub(super) const fn as_str(self) -> &'static str {
        match self {
            Self::Fleur => "FLEUR",
            Self::Wien2k => "WIEN2k",
        }
    }
}

/// Optional datasets for the subplot and histogram stages.
#[derive(Debug, Deserialize, Clone, Default)]
pub(super) struct PipelineConfig {
    #[serde(default)]
    pub(super) functionals: Vec<DatasetSpec>,
    #[serde(default)]
    pub(super) histogram: Option<HistogramPair>,
}

#[derive(Debug, Deserialize, Clone)]
pub(super) struct DatasetSpec {
    pub(super) label: String,
    pub(super) path: PathBuf,
    /// Reference whose metadata is combined with this file's fit results.
    #[serde(default)]
    pub(super) metadata_from: Option<ReferenceCode>,
}

#[derive(Debug, Deserialize, Clone)]
pub(super) struct HistogramPair {
    pub(super) a: DatasetSpec,
    pub(super) b: DatasetSpec,
}

/// Raw reference datasets, kept so that fit-only files can borrow their metadata.
pub(super) struct ReferenceDatasets {
    pub(super) fleur: RawDataset,
    pub(super) wien2k: RawDataset,
}

impl ReferenceDatasets {
    pub(super) fn get(&self, code: ReferenceCode) -> &RawDataset {
        match code {
            ReferenceCode::Fleur => &self.fleur,
            ReferenceCode::Wien2k => &self.wien2k,
        }
    }
}

pub(super) fn load_json_config<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T, CliError> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {} '{}'", what, path.display()))?;
    serde_json::from_str::<T>(&content)
        .with_context(|| format!("failed to parse {} '{}'", what, path.display()))
        .map_err(CliError::from)
}

pub(super) fn resolve_data_path(data_folder: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_folder.join(path)
    }
}

pub(super) fn load_dataset_alats(
    spec: &DatasetSpec,
    data_folder: &Path,
    references: &ReferenceDatasets,
) -> Result<AlatMap, CliError> {
    let path = resolve_data_path(data_folder, &spec.path);
    let dataset = match spec.metadata_from {
        Some(code) => {
            let fits = FitDataFile::load(&path).map_err(CliError::Compute)?;
            references.get(code).with_fit_data(fits.fit_data)
        }
        None => RawDataset::load(&path).map_err(CliError::Compute)?,
    };
    tracing::debug!(label = %spec.label, path = %path.display(), "loaded dataset");
    extract_alats(&dataset).map_err(CliError::Compute)
}

/// File-name friendly form of a dataset label, e.g. `WIEN2k-PBEsol` becomes `wien2k_pbesol`.
pub(super) fn label_slug(label: &str) -> String {
    label
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

pub(super) fn written_line(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("'{}' written.", name)
}
