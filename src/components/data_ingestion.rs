use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use super::table::DataTable;
use super::{ArtifactSource, LocalArtifactSource, StageComponent};
use crate::artifacts;
use crate::config::DataIngestionConfig;
use crate::constants::DEFAULT_DATA_FILE_NAME;
use crate::error::{PipelineError, Result};
use crate::observability::{EventSink, PipelineEvent};
use crate::pipeline::{Stage, StageOutput, StepLog};

/// Result of copying the local source into the ingestion root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub file_name: String,
    pub bytes: u64,
    /// Destination already held byte-identical content before the copy
    pub unchanged: bool,
}

/// Makes the stage's input data available under its artifact directory
///
/// No transformation happens here: the local file is copied as-is into
/// `root_dir` and can then be read back as a table.
pub struct DataIngestion {
    config: DataIngestionConfig,
    source: Box<dyn ArtifactSource>,
    sink: Arc<dyn EventSink>,
}

impl DataIngestion {
    pub fn new(config: DataIngestionConfig, sink: Arc<dyn EventSink>) -> Self {
        Self::with_source(config, Box::new(LocalArtifactSource), sink)
    }

    pub fn with_source(
        config: DataIngestionConfig,
        source: Box<dyn ArtifactSource>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            source,
            sink,
        }
    }

    pub fn config(&self) -> &DataIngestionConfig {
        &self.config
    }

    pub fn download_data(&self) -> Result<()> {
        self.source.download(&self.config)
    }

    pub fn extract_archive(&self) -> Result<()> {
        self.source.extract(&self.config)
    }

    /// Copy `local_data_file` into `root_dir`, keeping its file name.
    ///
    /// Re-running simply overwrites the destination. A crash mid-copy can
    /// leave a truncated file behind; the stage is re-run from scratch.
    pub fn transfer_data(&self) -> Result<TransferOutcome> {
        let source = &self.config.local_data_file;
        if !source.is_file() {
            return Err(PipelineError::source_not_found(source));
        }
        let file_name = source
            .file_name()
            .ok_or_else(|| PipelineError::source_not_found(source))?;

        artifacts::create_directory(&self.config.root_dir, self.sink.as_ref())?;
        let destination = self.config.root_dir.join(file_name);

        let unchanged = destination.is_file()
            && artifacts::get_size(&destination)? == artifacts::get_size(source)?
            && artifacts::file_digest(&destination)? == artifacts::file_digest(source)?;

        let bytes = artifacts::copy_preserving(source, &destination)?;

        self.sink.emit(&PipelineEvent::ArtifactCopied {
            source: source.clone(),
            destination: destination.clone(),
            bytes,
            unchanged,
        });

        Ok(TransferOutcome {
            source: source.clone(),
            destination,
            file_name: file_name.to_string_lossy().into_owned(),
            bytes,
            unchanged,
        })
    }

    /// Read `root_dir/<file_name>` into a table without modifying it
    pub fn read_data_file(&self, file_name: &str) -> Result<DataTable> {
        let path = self.config.root_dir.join(file_name);
        if !path.is_file() {
            return Err(PipelineError::source_not_found(path));
        }

        let table = DataTable::from_csv_path(&path)?;
        let (rows, columns) = table.shape();
        self.sink.emit(&PipelineEvent::TableRead {
            path,
            rows,
            columns,
        });
        Ok(table)
    }

    pub fn read_default(&self) -> Result<DataTable> {
        self.read_data_file(DEFAULT_DATA_FILE_NAME)
    }
}

impl StageComponent for DataIngestion {
    fn stage(&self) -> Stage {
        Stage::DataIngestion
    }

    fn run(&self, steps: &mut StepLog) -> Result<StageOutput> {
        steps.step("download_data", || self.download_data())?;
        steps.step("extract_archive", || self.extract_archive())?;
        let transfer = steps.step("transfer_data", || self.transfer_data())?;
        let table = steps.step("read_data_file", || self.read_data_file(&transfer.file_name))?;

        let (rows, columns) = table.shape();
        Ok(StageOutput::Ingestion {
            transfer,
            rows,
            columns,
        })
    }
}
