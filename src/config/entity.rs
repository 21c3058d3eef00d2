use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{PipelineError, Result};
use crate::pipeline::Stage;

/// Expected dataset columns, copied verbatim from the schema document
pub type SchemaColumns = Map<String, Value>;

/// A stage section that passed field validation, with paths made absolute
///
/// Only the registry builds these; stage records are constructed from one
/// through [`StageSettings::from_section`].
#[derive(Debug, Clone)]
pub struct ResolvedSection {
    stage: Stage,
    paths: BTreeMap<&'static str, PathBuf>,
    values: Map<String, Value>,
    schema: Option<SchemaColumns>,
    params: Map<String, Value>,
}

impl ResolvedSection {
    pub(crate) fn new(
        stage: Stage,
        paths: BTreeMap<&'static str, PathBuf>,
        values: Map<String, Value>,
        schema: Option<SchemaColumns>,
        params: Map<String, Value>,
    ) -> Self {
        Self {
            stage,
            paths,
            values,
            schema,
            params,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn path(&self, field: &str) -> Result<PathBuf> {
        self.paths
            .get(field)
            .cloned()
            .ok_or_else(|| PipelineError::missing_field(self.stage.key(), field))
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field).filter(|v| !v.is_null())
    }

    pub fn required_value(&self, field: &str) -> Result<Value> {
        self.value(field)
            .cloned()
            .ok_or_else(|| PipelineError::missing_field(self.stage.key(), field))
    }

    /// A boolean field; optional fields already carry their declared default
    pub fn bool(&self, field: &str) -> Result<bool> {
        match self.value(field) {
            None => Err(PipelineError::missing_field(self.stage.key(), field)),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.invalid(field, "a boolean")),
        }
    }

    pub fn string_list(&self, field: &str) -> Result<Vec<String>> {
        match self.value(field) {
            None => Err(PipelineError::missing_field(self.stage.key(), field)),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid(field, "a list of strings"))
                })
                .collect(),
            Some(_) => Err(self.invalid(field, "a list of strings")),
        }
    }

    pub fn schema(&self) -> Result<SchemaColumns> {
        self.schema
            .clone()
            .ok_or_else(|| PipelineError::missing_field("schema", crate::constants::SCHEMA_COLUMNS_KEY))
    }

    pub fn params(&self) -> Map<String, Value> {
        self.params.clone()
    }

    fn invalid(&self, field: &str, expected: &'static str) -> PipelineError {
        PipelineError::InvalidField {
            section: self.stage.key().to_string(),
            field: field.to_string(),
            expected,
        }
    }
}

/// A typed, immutable per-stage configuration record
pub trait StageSettings: Sized + Into<StageConfig> {
    const STAGE: Stage;

    fn from_section(section: &ResolvedSection) -> Result<Self>;
}

/// Where ingestion copies the local source file to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataIngestionConfig {
    /// Directory where data ingestion artifacts are stored
    pub root_dir: PathBuf,
    /// Local file the data is already saved in
    pub local_data_file: PathBuf,
}

impl StageSettings for DataIngestionConfig {
    const STAGE: Stage = Stage::DataIngestion;

    fn from_section(section: &ResolvedSection) -> Result<Self> {
        Ok(Self {
            root_dir: section.path("root_dir")?,
            local_data_file: section.path("local_data_file")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataValidationConfig {
    pub root_dir: PathBuf,
    /// Ingested file whose columns are checked
    pub data_source_file: PathBuf,
    /// Where the validation status record is written
    pub status_file: PathBuf,
    pub schema: SchemaColumns,
}

impl StageSettings for DataValidationConfig {
    const STAGE: Stage = Stage::DataValidation;

    fn from_section(section: &ResolvedSection) -> Result<Self> {
        Ok(Self {
            root_dir: section.path("root_dir")?,
            data_source_file: section.path("data_source_file")?,
            status_file: section.path("status_file")?,
            schema: section.schema()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataTransformationConfig {
    pub root_dir: PathBuf,
    pub data_source_file: PathBuf,
    /// Validated output consumed by the transformation
    pub data_validation: PathBuf,
}

impl StageSettings for DataTransformationConfig {
    const STAGE: Stage = Stage::DataTransformation;

    fn from_section(section: &ResolvedSection) -> Result<Self> {
        Ok(Self {
            root_dir: section.path("root_dir")?,
            data_source_file: section.path("data_source_file")?,
            data_validation: section.path("data_validation")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpacyNerConfig {
    pub root_dir: PathBuf,
    pub ner_job_description_extractor_dir: PathBuf,
    pub json_annotated_path: PathBuf,
    pub output_path: PathBuf,
    pub train_data_path: PathBuf,
    pub test_data_path: PathBuf,
    pub val_data_path: PathBuf,
    pub spacy_train: PathBuf,
    pub spacy_dev: PathBuf,
    pub original_dataset_path: PathBuf,
    pub train_data_extracted_entities: PathBuf,
    pub merged_output_path: PathBuf,
    pub pretrained_model_dir: PathBuf,
    pub custom_model_dir: PathBuf,
    pub gpu_allocator: bool,
    pub components: Vec<String>,
    /// Training block passed through to the trainer untouched
    pub training: Value,
    pub training_metrics_path_custom: PathBuf,
    pub training_metrics_path_finetuned: PathBuf,
    /// Tunable hyperparameters from the params document
    pub params: Map<String, Value>,
}

impl StageSettings for SpacyNerConfig {
    const STAGE: Stage = Stage::SpacyNer;

    fn from_section(section: &ResolvedSection) -> Result<Self> {
        Ok(Self {
            root_dir: section.path("root_dir")?,
            ner_job_description_extractor_dir: section.path("ner_job_description_extractor_dir")?,
            json_annotated_path: section.path("json_annotated_path")?,
            output_path: section.path("output_path")?,
            train_data_path: section.path("train_data_path")?,
            test_data_path: section.path("test_data_path")?,
            val_data_path: section.path("val_data_path")?,
            spacy_train: section.path("spacy_train")?,
            spacy_dev: section.path("spacy_dev")?,
            original_dataset_path: section.path("original_dataset_path")?,
            train_data_extracted_entities: section.path("train_data_extracted_entities")?,
            merged_output_path: section.path("merged_output_path")?,
            pretrained_model_dir: section.path("pretrained_model_dir")?,
            custom_model_dir: section.path("custom_model_dir")?,
            gpu_allocator: section.bool("gpu_allocator")?,
            components: section.string_list("components")?,
            training: section.required_value("training")?,
            training_metrics_path_custom: section.path("training_metrics_path_custom")?,
            training_metrics_path_finetuned: section.path("training_metrics_path_finetuned")?,
            params: section.params(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BerTopicConfig {
    pub root_dir: PathBuf,
    pub data_path: PathBuf,
    pub output_path: PathBuf,
    pub params: Map<String, Value>,
}

impl StageSettings for BerTopicConfig {
    const STAGE: Stage = Stage::BerTopic;

    fn from_section(section: &ResolvedSection) -> Result<Self> {
        Ok(Self {
            root_dir: section.path("root_dir")?,
            data_path: section.path("data_path")?,
            output_path: section.path("output_path")?,
            params: section.params(),
        })
    }
}

/// One fully-resolved configuration record, tagged by stage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageConfig {
    DataIngestion(DataIngestionConfig),
    DataValidation(DataValidationConfig),
    DataTransformation(DataTransformationConfig),
    SpacyNer(SpacyNerConfig),
    BerTopic(BerTopicConfig),
}

impl StageConfig {
    pub fn stage(&self) -> Stage {
        match self {
            StageConfig::DataIngestion(_) => Stage::DataIngestion,
            StageConfig::DataValidation(_) => Stage::DataValidation,
            StageConfig::DataTransformation(_) => Stage::DataTransformation,
            StageConfig::SpacyNer(_) => Stage::SpacyNer,
            StageConfig::BerTopic(_) => Stage::BerTopic,
        }
    }

    pub fn root_dir(&self) -> &PathBuf {
        match self {
            StageConfig::DataIngestion(c) => &c.root_dir,
            StageConfig::DataValidation(c) => &c.root_dir,
            StageConfig::DataTransformation(c) => &c.root_dir,
            StageConfig::SpacyNer(c) => &c.root_dir,
            StageConfig::BerTopic(c) => &c.root_dir,
        }
    }
}

impl From<DataIngestionConfig> for StageConfig {
    fn from(c: DataIngestionConfig) -> Self {
        StageConfig::DataIngestion(c)
    }
}

impl From<DataValidationConfig> for StageConfig {
    fn from(c: DataValidationConfig) -> Self {
        StageConfig::DataValidation(c)
    }
}

impl From<DataTransformationConfig> for StageConfig {
    fn from(c: DataTransformationConfig) -> Self {
        StageConfig::DataTransformation(c)
    }
}

impl From<SpacyNerConfig> for StageConfig {
    fn from(c: SpacyNerConfig) -> Self {
        StageConfig::SpacyNer(c)
    }
}

impl From<BerTopicConfig> for StageConfig {
    fn from(c: BerTopicConfig) -> Self {
        StageConfig::BerTopic(c)
    }
}

/// Used by the registry for path fields that are present but not strings
pub(crate) fn expect_path_string<'a>(stage: Stage, field: &str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| PipelineError::InvalidField {
        section: stage.key().to_string(),
        field: field.to_string(),
        expected: "a path string",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(stage: Stage, values: Value) -> ResolvedSection {
        ResolvedSection::new(
            stage,
            BTreeMap::new(),
            values.as_object().cloned().unwrap_or_default(),
            None,
            Map::new(),
        )
    }

    #[test]
    fn test_typed_accessors_read_present_values() {
        let s = section(Stage::SpacyNer, json!({ "gpu_allocator": true, "components": ["ner"] }));
        assert!(s.bool("gpu_allocator").unwrap());
        assert_eq!(s.string_list("components").unwrap(), vec!["ner"]);
    }

    #[test]
    fn test_typed_accessors_reject_absent_or_ill_typed_values() {
        let s = section(Stage::SpacyNer, json!({ "gpu_allocator": "yes", "components": ["ner", 3] }));
        assert!(matches!(
            s.bool("gpu_allocator"),
            Err(PipelineError::InvalidField { field, .. }) if field == "gpu_allocator"
        ));
        assert!(matches!(
            s.string_list("components"),
            Err(PipelineError::InvalidField { field, .. }) if field == "components"
        ));
        assert!(matches!(
            s.bool("missing"),
            Err(PipelineError::MissingField { field, .. }) if field == "missing"
        ));
    }

    #[test]
    fn test_missing_schema_names_columns() {
        let s = section(Stage::DataValidation, json!({}));
        assert!(matches!(
            s.schema(),
            Err(PipelineError::MissingField { section, field }) if section == "schema" && field == "columns"
        ));
    }

    #[test]
    fn test_stage_config_is_tagged_by_stage_key() {
        let config: StageConfig = DataIngestionConfig {
            root_dir: PathBuf::from("/work/artifacts/data_ingestion"),
            local_data_file: PathBuf::from("/work/data/raw/gsearch_jobs.csv"),
        }
        .into();

        assert_eq!(config.stage(), Stage::DataIngestion);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["stage"], json!("data_ingestion"));
        assert_eq!(json["root_dir"], json!("/work/artifacts/data_ingestion"));
    }
}
