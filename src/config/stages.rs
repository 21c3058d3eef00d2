//! Declarative description of what each stage needs from the configuration.
//!
//! The registry runs one generic resolve-and-validate routine over these
//! entries; adding a stage means adding a row here and a record in `entity`.

use serde_json::Value;

use crate::pipeline::Stage;

/// Default and accepted type of a field a stage may omit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalField {
    Bool(bool),
    /// Defaults to an empty list
    StringList,
}

impl OptionalField {
    /// Value the resolver fills in when the field is absent or null
    pub fn default_value(&self) -> Value {
        match self {
            OptionalField::Bool(b) => Value::Bool(*b),
            OptionalField::StringList => Value::Array(Vec::new()),
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            OptionalField::Bool(_) => value.is_boolean(),
            OptionalField::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }

    pub fn expected(&self) -> &'static str {
        match self {
            OptionalField::Bool(_) => "a boolean",
            OptionalField::StringList => "a list of strings",
        }
    }
}

/// Field-level contract of one stage's config section
#[derive(Debug)]
pub struct StageSpec {
    pub stage: Stage,
    /// Fields that must be present and non-null, checked in this order
    pub required: &'static [&'static str],
    /// Fields resolved to absolute paths
    pub paths: &'static [&'static str],
    /// Fields that may be omitted, with the default the resolver fills in
    pub optional: &'static [(&'static str, OptionalField)],
    /// Path fields naming directories the stage writes into
    pub create_dirs: &'static [&'static str],
    /// Path fields naming files whose parent directory must exist
    pub create_parents: &'static [&'static str],
    /// Whether the schema `columns` mapping is carried into the record
    pub schema_columns: bool,
    /// Whether the params document section with the same key is carried
    pub params: bool,
}

impl StageSpec {
    pub fn key(&self) -> &'static str {
        self.stage.key()
    }
}

const NER_PATHS: &[&str] = &[
    "root_dir",
    "ner_job_description_extractor_dir",
    "json_annotated_path",
    "output_path",
    "train_data_path",
    "test_data_path",
    "val_data_path",
    "spacy_train",
    "spacy_dev",
    "original_dataset_path",
    "train_data_extracted_entities",
    "merged_output_path",
    "pretrained_model_dir",
    "custom_model_dir",
    "training_metrics_path_custom",
    "training_metrics_path_finetuned",
];

const NER_REQUIRED: &[&str] = &[
    "root_dir",
    "ner_job_description_extractor_dir",
    "json_annotated_path",
    "output_path",
    "train_data_path",
    "test_data_path",
    "val_data_path",
    "spacy_train",
    "spacy_dev",
    "original_dataset_path",
    "train_data_extracted_entities",
    "merged_output_path",
    "pretrained_model_dir",
    "custom_model_dir",
    "training",
    "training_metrics_path_custom",
    "training_metrics_path_finetuned",
];

pub static STAGES: [StageSpec; 5] = [
    StageSpec {
        stage: Stage::DataIngestion,
        required: &["root_dir", "local_data_file"],
        paths: &["root_dir", "local_data_file"],
        optional: &[],
        create_dirs: &["root_dir"],
        create_parents: &[],
        schema_columns: false,
        params: false,
    },
    StageSpec {
        stage: Stage::DataValidation,
        required: &["root_dir", "data_source_file", "status_file"],
        paths: &["root_dir", "data_source_file", "status_file"],
        optional: &[],
        create_dirs: &["root_dir"],
        create_parents: &["status_file"],
        schema_columns: true,
        params: false,
    },
    StageSpec {
        stage: Stage::DataTransformation,
        required: &["root_dir", "data_source_file", "data_validation"],
        paths: &["root_dir", "data_source_file", "data_validation"],
        optional: &[],
        create_dirs: &["root_dir"],
        create_parents: &[],
        schema_columns: false,
        params: false,
    },
    StageSpec {
        stage: Stage::SpacyNer,
        required: NER_REQUIRED,
        paths: NER_PATHS,
        optional: &[
            ("gpu_allocator", OptionalField::Bool(false)),
            ("components", OptionalField::StringList),
        ],
        create_dirs: &["root_dir"],
        create_parents: &[],
        schema_columns: false,
        params: true,
    },
    StageSpec {
        stage: Stage::BerTopic,
        required: &["root_dir", "data_path", "output_path"],
        paths: &["root_dir", "data_path", "output_path"],
        optional: &[],
        create_dirs: &["root_dir"],
        create_parents: &[],
        schema_columns: false,
        params: true,
    },
];

pub fn spec_for(stage: Stage) -> &'static StageSpec {
    STAGES
        .iter()
        .find(|spec| spec.stage == stage)
        .unwrap_or_else(|| unreachable!("every Stage has a row in STAGES"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_stage_has_exactly_one_spec() {
        for stage in Stage::ALL {
            assert_eq!(STAGES.iter().filter(|s| s.stage == stage).count(), 1);
            assert_eq!(spec_for(stage).key(), stage.key());
        }
    }

    #[test]
    fn test_directory_fields_are_path_fields() {
        for spec in &STAGES {
            for field in spec.create_dirs.iter().chain(spec.create_parents) {
                assert!(spec.paths.contains(field), "{}.{field}", spec.key());
            }
            for field in spec.paths {
                assert!(spec.required.contains(field), "{}.{field} is not required", spec.key());
            }
            for (field, _) in spec.optional {
                assert!(!spec.required.contains(field), "{}.{field} is both", spec.key());
            }
        }
    }

    #[test]
    fn test_optional_defaults_satisfy_their_own_type() {
        for field in [OptionalField::Bool(true), OptionalField::StringList] {
            assert!(field.accepts(&field.default_value()));
        }
        assert!(!OptionalField::StringList.accepts(&serde_json::json!(["ner", 3])));
        assert!(!OptionalField::Bool(false).accepts(&serde_json::json!("yes")));
    }

    #[test]
    fn test_every_stage_writes_into_its_root_dir() {
        assert!(STAGES.iter().all(|s| s.create_dirs.contains(&"root_dir")));
    }
}
