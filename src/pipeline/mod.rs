// Stage orchestration: stage identities, run bookkeeping and the runner

pub mod runner;
pub mod stage;

pub use runner::{ComponentFactory, PipelineRunner};
pub use stage::{Stage, StageOutput, StageReport, StageStatus, StepLog};
