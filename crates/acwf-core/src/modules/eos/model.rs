use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub(crate) const DEFAULT_PROTOCOL: &str = "verification-PBE-v1";
pub(crate) const DEFAULT_MAGNETIZATION_PER_SITE: [f64; 1] = [3.0];

/// One stored crystal structure, tagged through free-form `extras`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub uuid: String,
    #[serde(default)]
    pub extras: BTreeMap<String, Value>,
    pub cell: [[f64; 3]; 3],
    #[serde(default)]
    pub sites: Vec<StructureSite>,
}

impl StructureRecord {
    /// True when every filter names an extra whose string value matches.
    pub fn matches(&self, filters: &[(&str, &str)]) -> bool {
        filters.iter().all(|(key, expected)| {
            self.extras.get(*key).and_then(Value::as_str) == Some(*expected)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSite {
    pub symbol: String,
    pub position: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerResources {
    pub num_machines: u32,
    pub num_mpiprocs_per_machine: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerOptions {
    pub resources: SchedulerResources,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wallclock_seconds: Option<u64>,
}

/// Code and scheduler settings handed to every engine of the relax plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub code: String,
    pub options: SchedulerOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxType {
    None,
    Positions,
    PositionsCell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectronicType {
    Metal,
    Insulator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinType {
    None,
    Collinear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorInputs {
    pub engines: BTreeMap<String, EngineOptions>,
    pub protocol: String,
    pub relax_type: RelaxType,
    pub electronic_type: ElectronicType,
    pub spin_type: SpinType,
    pub magnetization_per_site: Vec<f64>,
}

/// Complete input payload of one equation-of-state workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EosInputs {
    pub structure: StructureRecord,
    pub scale_factors: Vec<f64>,
    pub generator_inputs: GeneratorInputs,
    pub sub_process_class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_process: Option<Value>,
}

#[cfg(test)]
impl EosInputs {
    pub(crate) fn example() -> Self {
        let engine = EngineOptions {
            code: "pw@localhost".to_string(),
            options: SchedulerOptions {
                resources: SchedulerResources {
                    num_machines: 1,
                    num_mpiprocs_per_machine: 4,
                },
                queue_name: None,
                max_wallclock_seconds: Some(3600),
            },
        };
        Self {
            structure: StructureRecord {
                uuid: "fe-bcc".to_string(),
                extras: BTreeMap::from([
                    ("element".to_string(), Value::from("Fe")),
                    ("configuration".to_string(), Value::from("X/BCC")),
                ]),
                cell: [[2.83, 0.0, 0.0], [0.0, 2.83, 0.0], [0.0, 0.0, 2.83]],
                sites: vec![
                    StructureSite {
                        symbol: "Fe".to_string(),
                        position: [0.0, 0.0, 0.0],
                    },
                    StructureSite {
                        symbol: "Fe".to_string(),
                        position: [1.415, 1.415, 1.415],
                    },
                ],
            },
            scale_factors: vec![0.98, 1.0, 1.02],
            generator_inputs: GeneratorInputs {
                engines: BTreeMap::from([("relax".to_string(), engine)]),
                protocol: DEFAULT_PROTOCOL.to_string(),
                relax_type: RelaxType::None,
                electronic_type: ElectronicType::Metal,
                spin_type: SpinType::Collinear,
                magnetization_per_site: DEFAULT_MAGNETIZATION_PER_SITE.to_vec(),
            },
            sub_process_class: "common_workflows.relax.quantum_espresso".to_string(),
            sub_process: None,
        }
    }
}

/// Handle returned by a workflow engine for a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub pk: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpoolEntry {
    pub workflow: String,
    pub inputs: EosInputs,
}
