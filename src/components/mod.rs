// Stage components: each takes its resolved config and acts on the filesystem

pub mod data_ingestion;
pub mod data_validation;
pub mod table;

pub use data_ingestion::{DataIngestion, TransferOutcome};
pub use data_validation::{DataValidation, ValidationOutcome};
pub use table::DataTable;

use crate::config::DataIngestionConfig;
use crate::error::Result;
use crate::pipeline::{Stage, StageOutput, StepLog};

/// A stage implementation constructed from one resolved config
pub trait StageComponent {
    fn stage(&self) -> Stage;

    /// Invoke the component's operations in their fixed order, recording each
    /// step in `steps` as it runs.
    fn run(&self, steps: &mut StepLog) -> Result<StageOutput>;
}

/// Where ingestion's source data comes from before it is transferred
///
/// The default methods do nothing: data is assumed to already be on local
/// disk. Variants that fetch or unpack data override them.
pub trait ArtifactSource: Send + Sync {
    fn download(&self, _config: &DataIngestionConfig) -> Result<()> {
        Ok(())
    }

    fn extract(&self, _config: &DataIngestionConfig) -> Result<()> {
        Ok(())
    }
}

/// Data already present at `local_data_file`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalArtifactSource;

impl ArtifactSource for LocalArtifactSource {}
