pub mod alat;
pub mod eos;
pub mod histogram;
pub mod plot;
pub mod reference;
pub mod serialization;
pub mod series;

mod traits;

pub use traits::{StructureSource, WorkflowEngine};
