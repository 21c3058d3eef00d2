use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::components::{TransferOutcome, ValidationOutcome};
use crate::error::{PipelineError, Result};
use crate::observability::{EventSink, PipelineEvent};

/// Every stage the pipeline knows how to configure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DataIngestion,
    DataValidation,
    DataTransformation,
    SpacyNer,
    BerTopic,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::DataIngestion,
        Stage::DataValidation,
        Stage::DataTransformation,
        Stage::SpacyNer,
        Stage::BerTopic,
    ];

    /// Section key in the base config document
    pub fn key(&self) -> &'static str {
        match self {
            Stage::DataIngestion => "data_ingestion",
            Stage::DataValidation => "data_validation",
            Stage::DataTransformation => "data_transformation",
            Stage::SpacyNer => "spacy_ner",
            Stage::BerTopic => "ber_topic",
        }
    }

    /// Human-readable name used in logs and CLI output
    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::DataIngestion => "Data Ingestion Stage",
            Stage::DataValidation => "Data Validation Stage",
            Stage::DataTransformation => "Data Transformation Stage",
            Stage::SpacyNer => "spaCy NER Training Stage",
            Stage::BerTopic => "BERTopic Modeling Stage",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Stage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace('-', "_").to_lowercase();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.key() == wanted)
            .ok_or_else(|| PipelineError::UnknownStage(s.to_string()))
    }
}

/// Lifecycle of a single stage invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl StageStatus {
    /// Failed and Succeeded are terminal; a failed stage is re-run from the start.
    pub fn can_transition_to(self, next: StageStatus) -> bool {
        matches!(
            (self, next),
            (StageStatus::NotStarted, StageStatus::Running)
                | (StageStatus::Running, StageStatus::Succeeded)
                | (StageStatus::Running, StageStatus::Failed)
        )
    }
}

/// What a component's operations produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageOutput {
    Ingestion {
        transfer: TransferOutcome,
        rows: usize,
        columns: usize,
    },
    Validation(ValidationOutcome),
    /// Externally registered components with nothing structured to report
    Completed,
}

/// Ordered record of the steps of one stage run
///
/// `step` marks a step as current before running it and only moves it to
/// `completed` once it succeeds, so after a failure `current()` names the
/// step that failed.
#[derive(Default)]
pub struct StepLog {
    completed: Vec<&'static str>,
    current: Option<&'static str>,
    observer: Option<(Stage, Arc<dyn EventSink>)>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log that emits `StepCompleted` for `stage` as each step finishes
    pub fn observed(stage: Stage, sink: Arc<dyn EventSink>) -> Self {
        Self {
            observer: Some((stage, sink)),
            ..Self::default()
        }
    }

    pub fn step<T>(&mut self, name: &'static str, op: impl FnOnce() -> Result<T>) -> Result<T> {
        self.current = Some(name);
        let value = op()?;
        self.completed.push(name);
        self.current = None;
        if let Some((stage, sink)) = &self.observer {
            sink.emit(&PipelineEvent::StepCompleted {
                stage: *stage,
                step: name,
            });
        }
        Ok(value)
    }

    pub fn current(&self) -> Option<&'static str> {
        self.current
    }

    pub fn completed(&self) -> &[&'static str] {
        &self.completed
    }
}

impl fmt::Debug for StepLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepLog")
            .field("completed", &self.completed)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

/// Outcome of a successful `PipelineRunner::run_stage`
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub run_id: Uuid,
    pub stage: Stage,
    pub status: StageStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<&'static str>,
    pub output: StageOutput,
}
