use super::model::{EosInputs, JobHandle, SpoolEntry};
use crate::domain::{AcwfError, AcwfResult};
use crate::modules::serialization::write_json_artifact;
use crate::modules::traits::WorkflowEngine;
use std::fs;
use std::path::{Path, PathBuf};

/// Workflow engine that queues submissions as `<pk>.json` files in a directory.
///
/// The pk is one past the largest pk already present, starting at 1.
#[derive(Debug, Clone)]
pub struct SpoolWorkflowEngine {
    directory: PathBuf,
}

impl SpoolWorkflowEngine {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn entry_path(&self, handle: JobHandle) -> PathBuf {
        self.directory.join(format!("{}.json", handle.pk))
    }

    fn next_pk(&self) -> AcwfResult<u64> {
        let entries = fs::read_dir(&self.directory).map_err(|source| {
            AcwfError::io_system(
                "IO.SPOOL_READ",
                format!("failed to list '{}': {}", self.directory.display(), source),
            )
        })?;

        let mut highest = 0;
        for entry in entries {
            let entry = entry.map_err(|source| {
                AcwfError::io_system(
                    "IO.SPOOL_READ",
                    format!("failed to list '{}': {}", self.directory.display(), source),
                )
            })?;
            let path = entry.path();
            if path.extension().and_then(|extension| extension.to_str()) != Some("json") {
                continue;
            }
            if let Some(pk) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u64>().ok())
            {
                highest = highest.max(pk);
            }
        }
        Ok(highest + 1)
    }
}

impl WorkflowEngine for SpoolWorkflowEngine {
    fn submit(&self, workflow: &str, inputs: &EosInputs) -> AcwfResult<JobHandle> {
        fs::create_dir_all(&self.directory).map_err(|source| {
            AcwfError::io_system(
                "IO.SPOOL_CREATE",
                format!("failed to create '{}': {}", self.directory.display(), source),
            )
        })?;

        let handle = JobHandle {
            pk: self.next_pk()?,
        };
        let entry = SpoolEntry {
            workflow: workflow.to_string(),
            inputs: inputs.clone(),
        };
        let path = self.entry_path(handle);
        write_json_artifact(&path, &entry)?;
        tracing::debug!("spooled {} to {}", workflow, path.display());
        Ok(handle)
    }
}
