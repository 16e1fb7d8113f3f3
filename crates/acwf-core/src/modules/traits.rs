use crate::domain::AcwfResult;
use crate::modules::eos::{EosInputs, JobHandle, StructureRecord};

/// Read access to stored structures, filtered on their `extras` tags.
pub trait StructureSource {
    fn query(&self, filters: &[(&str, &str)]) -> AcwfResult<Vec<StructureRecord>>;
}

/// Accepts a workflow for execution and returns its handle.
pub trait WorkflowEngine {
    fn submit(&self, workflow: &str, inputs: &EosInputs) -> AcwfResult<JobHandle>;
}

#[cfg(test)]
mod tests {
    use super::{StructureSource, WorkflowEngine};
    use crate::domain::{AcwfError, AcwfErrorCategory, AcwfResult};
    use crate::modules::eos::{EosInputs, JobHandle, StructureRecord};

    struct OfflineEngine;

    impl WorkflowEngine for OfflineEngine {
        fn submit(&self, _workflow: &str, _inputs: &EosInputs) -> AcwfResult<JobHandle> {
            Err(AcwfError::io_system("IO.ENGINE_OFFLINE", "engine is not reachable"))
        }
    }

    struct EmptySource;

    impl StructureSource for EmptySource {
        fn query(&self, _filters: &[(&str, &str)]) -> AcwfResult<Vec<StructureRecord>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn trait_objects_share_the_error_type() {
        let engines: Vec<Box<dyn WorkflowEngine>> = vec![Box::new(OfflineEngine)];
        let inputs = EosInputs::example();
        let error = engines[0]
            .submit("common_workflows.eos", &inputs)
            .expect_err("offline engine should fail");
        assert_eq!(error.category(), AcwfErrorCategory::IoSystemError);
        assert_eq!(error.exit_code(), 3);

        let source: &dyn StructureSource = &EmptySource;
        assert!(source.query(&[("element", "Fe")]).expect("query should run").is_empty());
    }
}
