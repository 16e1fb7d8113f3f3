mod catalog;
mod model;
mod spool;

use super::traits::{StructureSource, WorkflowEngine};
use crate::domain::{AcwfError, AcwfResult};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub use catalog::CatalogStructureSource;
pub use model::{
    ElectronicType, EngineOptions, EosInputs, GeneratorInputs, JobHandle, RelaxType,
    SchedulerOptions, SchedulerResources, SpinType, SpoolEntry, StructureRecord, StructureSite,
};
pub use spool::SpoolWorkflowEngine;

pub const EOS_WORKFLOW: &str = "common_workflows.eos";
pub const RELAX_WORKFLOW_PREFIX: &str = "common_workflows.relax";
pub const FE_BCC_FILTERS: [(&str, &str); 2] = [("element", "Fe"), ("configuration", "X/BCC")];

/// Dense sampling around the equilibrium and in the compressed region,
/// coarse everywhere else.
const SCALE_FACTOR_SEGMENTS: [(f64, f64, f64); 5] = [
    (0.4, 0.5, 0.04),
    (0.5, 0.64, 0.01),
    (0.64, 1.1, 0.04),
    (1.1, 1.3, 0.01),
    (1.3, 1.65, 0.04),
];

/// User settings for one EOS submission, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmissionConfig {
    pub plugin: String,
    pub engine_types: Vec<String>,
    pub engine_options: EngineOptions,
    #[serde(default)]
    pub sub_process_overrides: Option<Value>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_magnetization_per_site")]
    pub magnetization_per_site: Vec<f64>,
}

fn default_protocol() -> String {
    model::DEFAULT_PROTOCOL.to_string()
}

fn default_magnetization_per_site() -> Vec<f64> {
    model::DEFAULT_MAGNETIZATION_PER_SITE.to_vec()
}

impl SubmissionConfig {
    pub fn validate(&self) -> AcwfResult<()> {
        if self.plugin.trim().is_empty() {
            return Err(AcwfError::input_validation(
                "INPUT.SUBMISSION_CONFIG",
                "submission config needs a non-empty 'plugin'",
            ));
        }
        if self.engine_types.is_empty() {
            return Err(AcwfError::input_validation(
                "INPUT.SUBMISSION_CONFIG",
                format!("plugin '{}' lists no engine types", self.plugin),
            ));
        }
        if self.engine_options.code.trim().is_empty() {
            return Err(AcwfError::input_validation(
                "INPUT.SUBMISSION_CONFIG",
                "engine options need a non-empty 'code'",
            ));
        }
        Ok(())
    }

    pub fn sub_process_class(&self) -> String {
        format!("{}.{}", RELAX_WORKFLOW_PREFIX, self.plugin)
    }
}

/// Scale factors of the volume sweep, rounded to three decimals.
pub fn eos_scale_factors() -> Vec<f64> {
    SCALE_FACTOR_SEGMENTS
        .iter()
        .flat_map(|&(start, stop, step)| arange(start, stop, step))
        .map(|value| (value * 1000.0).round() / 1000.0)
        .collect()
}

// Half-open range with the length rule `ceil((stop - start) / step)`, so
// floating error can admit a value at `stop` itself.
fn arange(start: f64, stop: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..count).map(move |index| start + index as f64 * step)
}

/// Returns the only structure of a query result.
pub fn select_single_structure(mut matches: Vec<StructureRecord>) -> AcwfResult<StructureRecord> {
    match matches.len() {
        0 => Err(AcwfError::input_validation(
            "INPUT.STRUCTURE_NOT_FOUND",
            "no Fe BCC structure found",
        )),
        1 => matches.pop().ok_or_else(|| {
            AcwfError::internal("SYS.STRUCTURE_QUERY", "query result vanished")
        }),
        _ => Err(AcwfError::input_validation(
            "INPUT.STRUCTURE_AMBIGUOUS",
            "More than one Fe BCC structure found.",
        )),
    }
}

pub fn build_eos_inputs(
    config: &SubmissionConfig,
    structure: StructureRecord,
) -> AcwfResult<EosInputs> {
    config.validate()?;
    let engines: BTreeMap<String, EngineOptions> = config
        .engine_types
        .iter()
        .map(|engine| (engine.clone(), config.engine_options.clone()))
        .collect();

    Ok(EosInputs {
        structure,
        scale_factors: eos_scale_factors(),
        generator_inputs: GeneratorInputs {
            engines,
            protocol: config.protocol.clone(),
            relax_type: RelaxType::None,
            electronic_type: ElectronicType::Metal,
            spin_type: SpinType::Collinear,
            magnetization_per_site: config.magnetization_per_site.clone(),
        },
        sub_process_class: config.sub_process_class(),
        sub_process: config.sub_process_overrides.clone(),
    })
}

/// Looks up the Fe BCC structure and submits one EOS workflow for it.
pub fn submit_eos(
    config: &SubmissionConfig,
    source: &dyn StructureSource,
    engine: &dyn WorkflowEngine,
) -> AcwfResult<JobHandle> {
    let structure = select_single_structure(source.query(&FE_BCC_FILTERS)?)?;
    tracing::debug!("selected structure {}", structure.uuid);
    let inputs = build_eos_inputs(config, structure)?;
    let handle = engine.submit(EOS_WORKFLOW, &inputs)?;
    tracing::info!(
        "submitted {} with {} scale factors as pk {}",
        EOS_WORKFLOW,
        inputs.scale_factors.len(),
        handle.pk
    );
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::{
        EOS_WORKFLOW, FE_BCC_FILTERS, SubmissionConfig, build_eos_inputs, eos_scale_factors,
        select_single_structure, submit_eos,
    };
    use crate::domain::AcwfResult;
    use crate::modules::eos::{EosInputs, JobHandle, SpinType, StructureRecord};
    use crate::modules::traits::{StructureSource, WorkflowEngine};
    use std::cell::RefCell;

    fn config() -> SubmissionConfig {
        serde_json::from_str(
            r#"{
                "plugin": "quantum_espresso",
                "engine_types": ["relax"],
                "engine_options": {
                    "code": "qe-7.3-pw@thor",
                    "options": {
                        "resources": {"num_machines": 1, "num_mpiprocs_per_machine": 48},
                        "queue_name": "lms",
                        "max_wallclock_seconds": 3600
                    }
                },
                "sub_process_overrides": {"clean_workdir": true}
            }"#,
        )
        .expect("config should parse")
    }

    fn structure(uuid: &str) -> StructureRecord {
        let mut structure = EosInputs::example().structure;
        structure.uuid = uuid.to_string();
        structure
    }

    struct FixedSource(Vec<StructureRecord>);

    impl StructureSource for FixedSource {
        fn query(&self, filters: &[(&str, &str)]) -> AcwfResult<Vec<StructureRecord>> {
            Ok(self
                .0
                .iter()
                .filter(|record| record.matches(filters))
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingEngine {
        submitted: RefCell<Vec<(String, EosInputs)>>,
    }

    impl WorkflowEngine for RecordingEngine {
        fn submit(&self, workflow: &str, inputs: &EosInputs) -> AcwfResult<JobHandle> {
            self.submitted
                .borrow_mut()
                .push((workflow.to_string(), inputs.clone()));
            Ok(JobHandle { pk: 4242 })
        }
    }

    #[test]
    fn scale_factors_follow_the_segmented_sweep() {
        let factors = eos_scale_factors();
        assert_eq!(factors.first().copied(), Some(0.4));
        assert_eq!(factors.last().copied(), Some(1.62));
        assert_eq!(&factors[..4], &[0.4, 0.44, 0.48, 0.5]);
        assert!(factors.contains(&1.0));
        assert!(factors.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(factors.iter().all(|value| ((value * 1000.0).round() / 1000.0 - value).abs() == 0.0));
    }

    #[test]
    fn structure_selection_requires_exactly_one_match() {
        let error = select_single_structure(Vec::new()).expect_err("empty must fail");
        assert_eq!(error.placeholder(), "INPUT.STRUCTURE_NOT_FOUND");
        assert_eq!(error.exit_code(), 2);

        let error = select_single_structure(vec![structure("a"), structure("b")])
            .expect_err("two matches must fail");
        assert_eq!(error.placeholder(), "INPUT.STRUCTURE_AMBIGUOUS");

        let only = select_single_structure(vec![structure("a")]).expect("one match is fine");
        assert_eq!(only.uuid, "a");
    }

    #[test]
    fn payload_shares_engine_options_across_engine_types() {
        let mut config = config();
        config.engine_types = vec!["relax".to_string(), "scf".to_string()];
        let inputs = build_eos_inputs(&config, structure("a")).expect("payload should build");

        assert_eq!(inputs.generator_inputs.engines.len(), 2);
        assert_eq!(
            inputs.generator_inputs.engines["scf"],
            inputs.generator_inputs.engines["relax"]
        );
        assert_eq!(inputs.generator_inputs.protocol, "verification-PBE-v1");
        assert_eq!(inputs.generator_inputs.magnetization_per_site, vec![3.0]);
        assert_eq!(inputs.generator_inputs.spin_type, SpinType::Collinear);
        assert_eq!(inputs.sub_process_class, "common_workflows.relax.quantum_espresso");

        let json = serde_json::to_value(&inputs).expect("payload should serialize");
        assert_eq!(json["generator_inputs"]["relax_type"], "none");
        assert_eq!(json["generator_inputs"]["electronic_type"], "metal");
        assert_eq!(json["generator_inputs"]["spin_type"], "collinear");
        assert_eq!(json["sub_process"]["clean_workdir"], true);
    }

    #[test]
    fn invalid_config_is_rejected_before_submission() {
        let mut config = config();
        config.engine_types.clear();
        let error = build_eos_inputs(&config, structure("a")).expect_err("no engines must fail");
        assert_eq!(error.placeholder(), "INPUT.SUBMISSION_CONFIG");
    }

    #[test]
    fn submit_queries_fe_bcc_and_submits_once() {
        let mut other = structure("other");
        other
            .extras
            .insert("configuration".to_string(), serde_json::Value::from("X/FCC"));
        let source = FixedSource(vec![structure("fe-bcc"), other]);
        let engine = RecordingEngine::default();

        let handle = submit_eos(&config(), &source, &engine).expect("submission should succeed");
        assert_eq!(handle.pk, 4242);

        let submitted = engine.submitted.borrow();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].0, EOS_WORKFLOW);
        assert_eq!(submitted[0].1.structure.uuid, "fe-bcc");
        assert!(submitted[0].1.structure.matches(&FE_BCC_FILTERS));
    }

    #[test]
    fn ambiguous_catalog_never_reaches_the_engine() {
        let source = FixedSource(vec![structure("a"), structure("b")]);
        let engine = RecordingEngine::default();

        let error = submit_eos(&config(), &source, &engine).expect_err("ambiguity must fail");
        assert_eq!(error.placeholder(), "INPUT.STRUCTURE_AMBIGUOUS");
        assert!(engine.submitted.borrow().is_empty());
    }
}
