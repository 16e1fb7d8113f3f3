use super::model::StructureRecord;
use crate::domain::AcwfResult;
use crate::modules::serialization::read_json_artifact;
use crate::modules::traits::StructureSource;
use std::path::Path;

/// Structure source backed by a JSON list of structure records.
#[derive(Debug, Clone, Default)]
pub struct CatalogStructureSource {
    records: Vec<StructureRecord>,
}

impl CatalogStructureSource {
    pub fn load(path: &Path) -> AcwfResult<Self> {
        let records: Vec<StructureRecord> = read_json_artifact(path)?;
        tracing::debug!("loaded {} structures from {}", records.len(), path.display());
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl StructureSource for CatalogStructureSource {
    fn query(&self, filters: &[(&str, &str)]) -> AcwfResult<Vec<StructureRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.matches(filters))
            .cloned()
            .collect())
    }
}
