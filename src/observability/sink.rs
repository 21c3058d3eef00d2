use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, info};

use super::events::PipelineEvent;
use super::metrics;

/// Receiver of structured pipeline events
///
/// The registry, the components and the runner report through a sink handed
/// to them at construction instead of a process-wide logger.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PipelineEvent);
}

/// Forwards events to `tracing` and records metrics for them
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::DocumentLoaded { kind, path, keys } => {
                info!(kind = ?kind, keys, "Loaded {:?} document from {}", kind, path.display());
                metrics::config::document_loaded(*kind);
            }
            PipelineEvent::DirectoryCreated {
                path,
                already_existed,
            } => {
                if *already_existed {
                    debug!("Directory already present: {}", path.display());
                } else {
                    info!("Created directory at: {}", path.display());
                }
                metrics::artifacts::directory_ensured(*already_existed);
            }
            PipelineEvent::ArtifactCopied {
                source,
                destination,
                bytes,
                unchanged,
            } => {
                info!(
                    bytes,
                    unchanged,
                    "Data transferred from {} to {}. File size: {}.",
                    source.display(),
                    destination.display(),
                    crate::artifacts::format_size(*bytes)
                );
                metrics::artifacts::copied(*bytes, *unchanged);
            }
            PipelineEvent::TableRead {
                path,
                rows,
                columns,
            } => {
                info!(
                    "Data file '{}' read into table. Shape: ({}, {}).",
                    path.display(),
                    rows,
                    columns
                );
                metrics::artifacts::table_read(*rows);
            }
            PipelineEvent::ValidationWritten {
                status_file,
                status,
                undeclared_columns,
            } => {
                info!(
                    status,
                    undeclared = ?undeclared_columns,
                    "Validation status written to {}",
                    status_file.display()
                );
                metrics::stage::validation_result(*status);
            }
            PipelineEvent::StageStarted { stage, run_id } => {
                info!(%run_id, ">>>>>> {} started <<<<<<", stage.display_name());
                metrics::stage::run_started(*stage);
            }
            PipelineEvent::StatusChanged {
                stage,
                run_id,
                from,
                to,
            } => {
                debug!(%run_id, stage = %stage, ?from, ?to, "Stage status changed");
            }
            PipelineEvent::StepCompleted { stage, step } => {
                debug!(stage = %stage, step, "Step completed");
            }
            PipelineEvent::StageSucceeded {
                stage,
                run_id,
                elapsed_secs,
            } => {
                info!(
                    %run_id,
                    elapsed_secs,
                    ">>>>>> {} completed <<<<<<",
                    stage.display_name()
                );
                metrics::stage::run_succeeded(*stage, *elapsed_secs);
            }
            PipelineEvent::StageFailed {
                stage,
                run_id,
                step,
                kind,
                error,
            } => {
                error!(
                    %run_id,
                    stage = %stage,
                    step,
                    kind,
                    "An error occurred during the {} at step '{}': {}",
                    stage.display_name(),
                    step,
                    error
                );
                metrics::stage::run_failed(*stage, *kind);
            }
            PipelineEvent::StageRejected { name, error } => {
                error!(name = %name, "Stage run rejected: {}", error);
                metrics::stage::run_rejected();
            }
        }
    }
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// Keeps every event in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events with the given `PipelineEvent::name`
    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.name() == name)
            .count()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &PipelineEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
