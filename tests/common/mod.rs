#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use artifact_pipeline::config::{ConfigRegistry, DocumentPaths};
use artifact_pipeline::observability::RecordingSink;
use tempfile::TempDir;

pub const FULL_CONFIG: &str = r#"
artifacts_root: artifacts

data_ingestion:
  root_dir: artifacts/data_ingestion
  local_data_file: data/raw/gsearch_jobs.csv

data_validation:
  root_dir: artifacts/data_validation
  data_source_file: artifacts/data_ingestion/gsearch_jobs.csv
  status_file: artifacts/data_validation/status/status.txt

data_transformation:
  root_dir: artifacts/data_transformation
  data_source_file: artifacts/data_ingestion/gsearch_jobs.csv
  data_validation: artifacts/data_validation/status/status.txt

spacy_ner:
  root_dir: artifacts/spacy_ner
  ner_job_description_extractor_dir: artifacts/spacy_ner/extractor
  json_annotated_path: artifacts/spacy_ner/annotated.json
  output_path: artifacts/spacy_ner/output
  train_data_path: artifacts/spacy_ner/train.json
  test_data_path: artifacts/spacy_ner/test.json
  val_data_path: artifacts/spacy_ner/val.json
  spacy_train: artifacts/spacy_ner/train.spacy
  spacy_dev: artifacts/spacy_ner/dev.spacy
  original_dataset_path: artifacts/data_transformation/jobs.csv
  train_data_extracted_entities: artifacts/spacy_ner/entities.csv
  merged_output_path: artifacts/spacy_ner/merged.csv
  pretrained_model_dir: artifacts/spacy_ner/pretrained
  custom_model_dir: artifacts/spacy_ner/custom
  gpu_allocator: true
  components: [tok2vec, ner]
  training:
    max_epochs: 20
  training_metrics_path_custom: artifacts/spacy_ner/metrics_custom.json
  training_metrics_path_finetuned: artifacts/spacy_ner/metrics_finetuned.json

ber_topic:
  root_dir: artifacts/ber_topic
  data_path: artifacts/spacy_ner/merged.csv
  output_path: artifacts/ber_topic/topics.csv
"#;

pub const PARAMS: &str = r#"
spacy_ner:
  dropout: 0.2
ber_topic:
  nr_topics: 12
"#;

pub const SCHEMA: &str = r#"
columns:
  title: object
  company_name: object
  location: object
  via: object
  salary: object
"#;

/// A throwaway project directory holding the three documents
pub struct Project {
    pub dir: TempDir,
    pub sink: Arc<RecordingSink>,
}

impl Project {
    pub fn new(config: &str) -> Self {
        Self::with_documents(config, PARAMS, SCHEMA)
    }

    pub fn with_documents(config: &str, params: &str, schema: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config/config.yaml"), config).unwrap();
        fs::write(dir.path().join("params.yaml"), params).unwrap();
        fs::write(dir.path().join("schema.yaml"), schema).unwrap();
        Self {
            dir,
            sink: Arc::new(RecordingSink::new()),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn registry(&self) -> ConfigRegistry {
        ConfigRegistry::load_with(self.root(), &DocumentPaths::default(), self.sink.clone()).unwrap()
    }

    /// Write a CSV with `rows` data rows over the five schema columns
    pub fn write_jobs(&self, relative: &str, rows: usize) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut csv = String::from("title,company_name,location,via,salary\n");
        for i in 0..rows {
            csv.push_str(&format!("Analyst {i},Company {i},\"Seattle, WA\",LinkedIn,{}\n", 50_000 + i));
        }
        fs::write(path, csv).unwrap();
    }
}
