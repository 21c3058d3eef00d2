use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Which of the three layered documents a [`Document`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Config,
    Params,
    Schema,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Config => "config",
            DocumentKind::Params => "params",
            DocumentKind::Schema => "schema",
        }
    }
}

/// On-disk syntax, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// `.toml` is TOML; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// A parsed declarative document whose top level is a mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    kind: DocumentKind,
    path: PathBuf,
    root: Map<String, Value>,
}

impl Document {
    pub fn load(kind: DocumentKind, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            let reason = match e.kind() {
                io::ErrorKind::NotFound => "file not found".to_string(),
                _ => e.to_string(),
            };
            PipelineError::ConfigLoad {
                path: path.to_path_buf(),
                reason,
            }
        })?;
        Self::parse(kind, path, &text, DocumentFormat::from_path(path))
    }

    pub fn parse(kind: DocumentKind, path: &Path, text: &str, format: DocumentFormat) -> Result<Self> {
        let load_error = |reason: String| PipelineError::ConfigLoad {
            path: path.to_path_buf(),
            reason,
        };

        let value: Value = match format {
            DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| load_error(e.to_string()))?,
            DocumentFormat::Toml => toml::from_str(text).map_err(|e| load_error(e.to_string()))?,
        };

        match value {
            Value::Object(root) => Ok(Self {
                kind,
                path: path.to_path_buf(),
                root,
            }),
            Value::Null => Err(load_error("document is empty".to_string())),
            other => Err(load_error(format!(
                "top level must be a mapping, found {}",
                value_kind(&other)
            ))),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// The nested mapping under `key`, if present and a mapping
    pub fn section(&self, key: &str) -> Option<&Map<String, Value>> {
        self.root.get(key).and_then(Value::as_object)
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
