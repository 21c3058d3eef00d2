//! Layered configuration: base config, tunable params and schema documents
//! resolved into immutable per-stage records.

pub mod document;
pub mod entity;
pub mod stages;

pub use document::{Document, DocumentFormat, DocumentKind};
pub use entity::{
    BerTopicConfig, DataIngestionConfig, DataTransformationConfig, DataValidationConfig,
    ResolvedSection, SchemaColumns, SpacyNerConfig, StageConfig, StageSettings,
};
pub use stages::{spec_for, OptionalField, StageSpec, STAGES};

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::artifacts;
use crate::constants;
use crate::error::{PipelineError, Result};
use crate::observability::{EventSink, PipelineEvent, TracingSink};
use crate::pipeline::Stage;
use entity::expect_path_string;

/// Locations of the three declarative documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPaths {
    pub config: PathBuf,
    pub params: PathBuf,
    pub schema: PathBuf,
}

impl DocumentPaths {
    pub fn new(config: impl Into<PathBuf>, params: impl Into<PathBuf>, schema: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            params: params.into(),
            schema: schema.into(),
        }
    }
}

impl Default for DocumentPaths {
    fn default() -> Self {
        Self::new(
            constants::CONFIG_FILE_PATH,
            constants::PARAMS_FILE_PATH,
            constants::SCHEMA_FILE_PATH,
        )
    }
}

/// Single source of truth for per-stage configuration
///
/// Holds the three parsed documents for the lifetime of a run. Every stage
/// accessor either returns a complete record or fails before touching the
/// filesystem; directories a stage writes into are created only on success.
pub struct ConfigRegistry {
    project_root: PathBuf,
    artifacts_root: PathBuf,
    config: Document,
    params: Document,
    schema: Document,
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("project_root", &self.project_root)
            .field("artifacts_root", &self.artifacts_root)
            .field("config", &self.config.path())
            .field("params", &self.params.path())
            .field("schema", &self.schema.path())
            .finish_non_exhaustive()
    }
}

impl ConfigRegistry {
    /// Load the documents, resolving relative paths against the working directory
    pub fn load(
        config_path: impl Into<PathBuf>,
        params_path: impl Into<PathBuf>,
        schema_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let root = std::env::current_dir()?;
        let paths = DocumentPaths::new(config_path, params_path, schema_path);
        Self::load_with(root, &paths, Arc::new(TracingSink))
    }

    /// Load the documents from their default locations
    pub fn load_default() -> Result<Self> {
        let root = std::env::current_dir()?;
        Self::load_with(root, &DocumentPaths::default(), Arc::new(TracingSink))
    }

    pub fn load_with(
        project_root: impl Into<PathBuf>,
        paths: &DocumentPaths,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let project_root = absolute_root(project_root.into())?;
        let resolve = |p: &Path| resolve_against(&project_root, p);

        let config = load_document(DocumentKind::Config, &resolve(&paths.config), sink.as_ref())?;
        let params = load_document(DocumentKind::Params, &resolve(&paths.params), sink.as_ref())?;
        let schema = load_document(DocumentKind::Schema, &resolve(&paths.schema), sink.as_ref())?;

        let artifacts_root = match config.get(constants::ARTIFACTS_ROOT_KEY) {
            None | Some(Value::Null) => resolve(Path::new(constants::DEFAULT_ARTIFACTS_ROOT)),
            Some(Value::String(raw)) => resolve(Path::new(raw)),
            Some(_) => {
                return Err(PipelineError::ConfigLoad {
                    path: config.path().to_path_buf(),
                    reason: format!("'{}' must be a path string", constants::ARTIFACTS_ROOT_KEY),
                })
            }
        };
        artifacts::create_directory(&artifacts_root, sink.as_ref())?;

        Ok(Self {
            project_root,
            artifacts_root,
            config,
            params,
            schema,
            sink,
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn artifacts_root(&self) -> &Path {
        &self.artifacts_root
    }

    pub fn config_document(&self) -> &Document {
        &self.config
    }

    pub fn params_document(&self) -> &Document {
        &self.params
    }

    pub fn schema_document(&self) -> &Document {
        &self.schema
    }

    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.sink)
    }

    pub fn data_ingestion_config(&self) -> Result<DataIngestionConfig> {
        self.resolve()
    }

    pub fn data_validation_config(&self) -> Result<DataValidationConfig> {
        self.resolve()
    }

    pub fn data_transformation_config(&self) -> Result<DataTransformationConfig> {
        self.resolve()
    }

    pub fn spacy_ner_config(&self) -> Result<SpacyNerConfig> {
        self.resolve()
    }

    pub fn ber_topic_config(&self) -> Result<BerTopicConfig> {
        self.resolve()
    }

    /// Resolve any stage by value, for callers that pick the stage at runtime
    pub fn stage_config(&self, stage: Stage) -> Result<StageConfig> {
        match stage {
            Stage::DataIngestion => self.data_ingestion_config().map(Into::into),
            Stage::DataValidation => self.data_validation_config().map(Into::into),
            Stage::DataTransformation => self.data_transformation_config().map(Into::into),
            Stage::SpacyNer => self.spacy_ner_config().map(Into::into),
            Stage::BerTopic => self.ber_topic_config().map(Into::into),
        }
    }

    /// The one resolve-and-validate routine behind every stage accessor
    pub fn resolve<T: StageSettings>(&self) -> Result<T> {
        let spec = stages::spec_for(T::STAGE);
        let (section, dirs) = self.resolve_section(spec)?;
        let settings = T::from_section(&section)?;
        artifacts::create_directories(&dirs, self.sink.as_ref())?;
        Ok(settings)
    }

    fn resolve_section(&self, spec: &StageSpec) -> Result<(ResolvedSection, Vec<PathBuf>)> {
        let key = spec.key();
        let section = match self.config.get(key) {
            None | Some(Value::Null) => return Err(PipelineError::missing_section(key)),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(PipelineError::InvalidField {
                    section: DocumentKind::Config.as_str().to_string(),
                    field: key.to_string(),
                    expected: "a mapping",
                })
            }
        };

        if let Some(field) = spec
            .required
            .iter()
            .find(|field| section.get(**field).map_or(true, Value::is_null))
        {
            return Err(PipelineError::missing_field(key, *field));
        }

        let mut values = section.clone();
        for (field, optional) in spec.optional {
            match values.get(*field) {
                None | Some(Value::Null) => {
                    values.insert(field.to_string(), optional.default_value());
                }
                Some(value) if optional.accepts(value) => {}
                Some(_) => {
                    return Err(PipelineError::InvalidField {
                        section: key.to_string(),
                        field: field.to_string(),
                        expected: optional.expected(),
                    })
                }
            }
        }

        let schema = if spec.schema_columns {
            Some(self.schema_columns()?)
        } else {
            None
        };

        let mut paths = BTreeMap::new();
        for field in spec.paths {
            match section.get(*field) {
                None | Some(Value::Null) => continue,
                Some(value) => {
                    let raw = expect_path_string(spec.stage, field, value)?;
                    paths.insert(*field, resolve_against(&self.project_root, Path::new(raw)));
                }
            }
        }

        let mut dirs: Vec<PathBuf> = spec
            .create_dirs
            .iter()
            .filter_map(|field| paths.get(field).cloned())
            .collect();
        dirs.extend(
            spec.create_parents
                .iter()
                .filter_map(|field| paths.get(field))
                .filter_map(|file| file.parent().map(Path::to_path_buf)),
        );

        let params = if spec.params {
            self.params.section(key).cloned().unwrap_or_default()
        } else {
            Map::new()
        };

        let resolved = ResolvedSection::new(spec.stage, paths, values, schema, params);
        Ok((resolved, dirs))
    }

    fn schema_columns(&self) -> Result<SchemaColumns> {
        match self.schema.get(constants::SCHEMA_COLUMNS_KEY) {
            Some(Value::Object(columns)) => Ok(columns.clone()),
            None | Some(Value::Null) => Err(PipelineError::missing_field(
                DocumentKind::Schema.as_str(),
                constants::SCHEMA_COLUMNS_KEY,
            )),
            Some(_) => Err(PipelineError::InvalidField {
                section: DocumentKind::Schema.as_str().to_string(),
                field: constants::SCHEMA_COLUMNS_KEY.to_string(),
                expected: "a mapping",
            }),
        }
    }
}

fn load_document(kind: DocumentKind, path: &Path, sink: &dyn EventSink) -> Result<Document> {
    let document = Document::load(kind, path)?;
    sink.emit(&PipelineEvent::DocumentLoaded {
        kind,
        path: path.to_path_buf(),
        keys: document.len(),
    });
    Ok(document)
}

fn absolute_root(root: PathBuf) -> Result<PathBuf> {
    if root.is_absolute() {
        Ok(root)
    } else {
        Ok(std::env::current_dir()?.join(root))
    }
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
