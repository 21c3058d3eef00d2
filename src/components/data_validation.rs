use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::StageComponent;
use crate::artifacts;
use crate::config::DataValidationConfig;
use crate::error::{PipelineError, Result};
use crate::observability::{EventSink, PipelineEvent};
use crate::pipeline::{Stage, StageOutput, StepLog};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub status: bool,
    pub status_file: PathBuf,
    /// Columns present in the data but not declared in the schema
    pub undeclared_columns: Vec<String>,
    /// Declared columns the data does not carry. Informational only.
    pub missing_columns: Vec<String>,
}

/// Checks the ingested file's columns against the schema document
pub struct DataValidation {
    config: DataValidationConfig,
    sink: Arc<dyn EventSink>,
}

impl DataValidation {
    pub fn new(config: DataValidationConfig, sink: Arc<dyn EventSink>) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &DataValidationConfig {
        &self.config
    }

    /// Compare the data's header row with the schema's declared columns and
    /// overwrite `status_file` with `Validation status: <bool>`.
    ///
    /// A `false` status is still `Ok`: only I/O and parse failures are errors.
    pub fn validate_all_columns(&self) -> Result<ValidationOutcome> {
        let source = &self.config.data_source_file;
        if !source.is_file() {
            return Err(PipelineError::source_not_found(source));
        }

        let mut reader = csv::Reader::from_path(source)?;
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let undeclared_columns: Vec<String> = columns
            .iter()
            .filter(|c| !self.config.schema.contains_key(c.as_str()))
            .cloned()
            .collect();
        let missing_columns: Vec<String> = self
            .config
            .schema
            .keys()
            .filter(|declared| !columns.iter().any(|c| c == *declared))
            .cloned()
            .collect();
        let status = undeclared_columns.is_empty();

        if let Some(parent) = self.config.status_file.parent() {
            artifacts::create_directory(parent, self.sink.as_ref())?;
        }
        fs::write(&self.config.status_file, format!("Validation status: {status}"))?;

        self.sink.emit(&PipelineEvent::ValidationWritten {
            status_file: self.config.status_file.clone(),
            status,
            undeclared_columns: undeclared_columns.clone(),
        });

        Ok(ValidationOutcome {
            status,
            status_file: self.config.status_file.clone(),
            undeclared_columns,
            missing_columns,
        })
    }
}

impl StageComponent for DataValidation {
    fn stage(&self) -> Stage {
        Stage::DataValidation
    }

    fn run(&self, steps: &mut StepLog) -> Result<StageOutput> {
        let outcome = steps.step("validate_all_columns", || self.validate_all_columns())?;
        Ok(StageOutput::Validation(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::RecordingSink;
    use serde_json::{json, Map, Value};
    use tempfile::tempdir;

    fn schema(columns: &[&str]) -> Map<String, Value> {
        columns
            .iter()
            .map(|c| (c.to_string(), json!("object")))
            .collect()
    }

    fn validation(root: &std::path::Path, columns: &[&str], sink: Arc<RecordingSink>) -> DataValidation {
        DataValidation::new(
            DataValidationConfig {
                root_dir: root.join("artifacts/data_validation"),
                data_source_file: root.join("artifacts/data_ingestion/gsearch_jobs.csv"),
                status_file: root.join("artifacts/data_validation/status.txt"),
                schema: schema(columns),
            },
            sink,
        )
    }

    fn write_source(root: &std::path::Path, contents: &str) {
        let dir = root.join("artifacts/data_ingestion");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("gsearch_jobs.csv"), contents).unwrap();
    }

    #[test]
    fn test_declared_columns_pass() {
        let tmp = tempdir().unwrap();
        write_source(tmp.path(), "title,company_name\nAnalyst,Acme\n");
        let sink = Arc::new(RecordingSink::new());
        let component = validation(tmp.path(), &["title", "company_name", "salary"], sink.clone());

        let outcome = component.validate_all_columns().unwrap();

        assert!(outcome.status);
        assert_eq!(outcome.missing_columns, vec!["salary"]);
        let written = fs::read_to_string(&outcome.status_file).unwrap();
        assert_eq!(written, "Validation status: true");
        assert_eq!(sink.count("validation_written"), 1);
        assert!(matches!(
            &sink.events()[0],
            PipelineEvent::DirectoryCreated { path, already_existed: false }
                if *path == tmp.path().join("artifacts/data_validation")
        ));
    }

    #[test]
    fn test_undeclared_column_fails_status_but_not_call() {
        let tmp = tempdir().unwrap();
        write_source(tmp.path(), "title,extra\nAnalyst,x\n");
        let component = validation(tmp.path(), &["title"], Arc::new(RecordingSink::new()));

        let outcome = component.validate_all_columns().unwrap();

        assert!(!outcome.status);
        assert_eq!(outcome.undeclared_columns, vec!["extra"]);
        assert_eq!(
            fs::read_to_string(&outcome.status_file).unwrap(),
            "Validation status: false"
        );
    }

    #[test]
    fn test_missing_source_is_reported() {
        let tmp = tempdir().unwrap();
        let component = validation(tmp.path(), &["title"], Arc::new(RecordingSink::new()));

        let mut steps = StepLog::new();
        let err = component.run(&mut steps).unwrap_err();

        assert!(matches!(err, PipelineError::SourceNotFound { .. }));
        assert_eq!(steps.current(), Some("validate_all_columns"));
        assert!(!tmp.path().join("artifacts/data_validation/status.txt").exists());
    }
}
