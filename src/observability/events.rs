use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::DocumentKind;
use crate::pipeline::{Stage, StageStatus};

/// Structured record of something the core did to configuration or artifacts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    DocumentLoaded {
        kind: DocumentKind,
        path: PathBuf,
        keys: usize,
    },
    DirectoryCreated {
        path: PathBuf,
        already_existed: bool,
    },
    ArtifactCopied {
        source: PathBuf,
        destination: PathBuf,
        bytes: u64,
        unchanged: bool,
    },
    TableRead {
        path: PathBuf,
        rows: usize,
        columns: usize,
    },
    ValidationWritten {
        status_file: PathBuf,
        status: bool,
        undeclared_columns: Vec<String>,
    },
    StageStarted {
        stage: Stage,
        run_id: Uuid,
    },
    StatusChanged {
        stage: Stage,
        run_id: Uuid,
        from: StageStatus,
        to: StageStatus,
    },
    StepCompleted {
        stage: Stage,
        step: &'static str,
    },
    StageSucceeded {
        stage: Stage,
        run_id: Uuid,
        elapsed_secs: f64,
    },
    StageFailed {
        stage: Stage,
        run_id: Uuid,
        step: &'static str,
        kind: &'static str,
        error: String,
    },
    /// A run requested by a name that matches no stage
    StageRejected {
        name: String,
        error: String,
    },
}

impl PipelineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::DocumentLoaded { .. } => "document_loaded",
            PipelineEvent::DirectoryCreated { .. } => "directory_created",
            PipelineEvent::ArtifactCopied { .. } => "artifact_copied",
            PipelineEvent::TableRead { .. } => "table_read",
            PipelineEvent::ValidationWritten { .. } => "validation_written",
            PipelineEvent::StageStarted { .. } => "stage_started",
            PipelineEvent::StatusChanged { .. } => "status_changed",
            PipelineEvent::StepCompleted { .. } => "step_completed",
            PipelineEvent::StageSucceeded { .. } => "stage_succeeded",
            PipelineEvent::StageFailed { .. } => "stage_failed",
            PipelineEvent::StageRejected { .. } => "stage_rejected",
        }
    }
}
