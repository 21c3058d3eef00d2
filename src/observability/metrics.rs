//! Metrics for the pipeline core
//!
//! Names are centralised in [`MetricName`]; the recording helpers are grouped
//! by phase so call sites read as `metrics::stage::run_started(stage)`.
//! Without an installed recorder every helper is a no-op.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::fmt;
use tracing::info;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Config metrics
    ConfigDocumentsLoaded,

    // Artifact metrics
    ArtifactDirectoriesCreated,
    ArtifactDirectoriesReused,
    ArtifactCopies,
    ArtifactCopiesUnchanged,
    ArtifactBytesCopied,
    ArtifactTableRows,

    // Stage metrics
    StageRunsStarted,
    StageRunsSucceeded,
    StageRunsFailed,
    StageRunsRejected,
    StageDuration,
    StageValidationResults,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ConfigDocumentsLoaded => "pipeline_config_documents_loaded_total",

            MetricName::ArtifactDirectoriesCreated => "pipeline_artifact_directories_created_total",
            MetricName::ArtifactDirectoriesReused => "pipeline_artifact_directories_reused_total",
            MetricName::ArtifactCopies => "pipeline_artifact_copies_total",
            MetricName::ArtifactCopiesUnchanged => "pipeline_artifact_copies_unchanged_total",
            MetricName::ArtifactBytesCopied => "pipeline_artifact_bytes_copied",
            MetricName::ArtifactTableRows => "pipeline_artifact_table_rows",

            MetricName::StageRunsStarted => "pipeline_stage_runs_started_total",
            MetricName::StageRunsSucceeded => "pipeline_stage_runs_succeeded_total",
            MetricName::StageRunsFailed => "pipeline_stage_runs_failed_total",
            MetricName::StageRunsRejected => "pipeline_stage_runs_rejected_total",
            MetricName::StageDuration => "pipeline_stage_duration_seconds",
            MetricName::StageValidationResults => "pipeline_stage_validation_results_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            ConfigDocumentsLoaded,
            ArtifactDirectoriesCreated,
            ArtifactDirectoriesReused,
            ArtifactCopies,
            ArtifactCopiesUnchanged,
            ArtifactBytesCopied,
            ArtifactTableRows,
            StageRunsStarted,
            StageRunsSucceeded,
            StageRunsFailed,
            StageRunsRejected,
            StageDuration,
            StageValidationResults,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder and return a handle for rendering
pub fn init() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("Metrics system initialized");
    Ok(handle)
}

// ============================================================================
// Config Metrics
// ============================================================================

pub mod config {
    use super::MetricName;
    use crate::config::DocumentKind;

    pub fn document_loaded(kind: DocumentKind) {
        ::metrics::counter!(MetricName::ConfigDocumentsLoaded.as_str(), "kind" => kind.as_str())
            .increment(1);
    }
}

// ============================================================================
// Artifact Metrics
// ============================================================================

pub mod artifacts {
    use super::MetricName;

    pub fn directory_ensured(already_existed: bool) {
        let name = if already_existed {
            MetricName::ArtifactDirectoriesReused
        } else {
            MetricName::ArtifactDirectoriesCreated
        };
        ::metrics::counter!(name.as_str()).increment(1);
    }

    pub fn copied(bytes: u64, unchanged: bool) {
        ::metrics::counter!(MetricName::ArtifactCopies.as_str()).increment(1);
        if unchanged {
            ::metrics::counter!(MetricName::ArtifactCopiesUnchanged.as_str()).increment(1);
        }
        ::metrics::histogram!(MetricName::ArtifactBytesCopied.as_str()).record(bytes as f64);
    }

    pub fn table_read(rows: usize) {
        ::metrics::histogram!(MetricName::ArtifactTableRows.as_str()).record(rows as f64);
    }
}

// ============================================================================
// Stage Metrics
// ============================================================================

pub mod stage {
    use super::MetricName;
    use crate::pipeline::Stage;

    pub fn run_started(stage: Stage) {
        ::metrics::counter!(MetricName::StageRunsStarted.as_str(), "stage" => stage.key())
            .increment(1);
    }

    pub fn run_succeeded(stage: Stage, elapsed_secs: f64) {
        ::metrics::counter!(MetricName::StageRunsSucceeded.as_str(), "stage" => stage.key())
            .increment(1);
        ::metrics::histogram!(MetricName::StageDuration.as_str(), "stage" => stage.key())
            .record(elapsed_secs);
    }

    pub fn run_failed(stage: Stage, kind: &'static str) {
        ::metrics::counter!(
            MetricName::StageRunsFailed.as_str(),
            "stage" => stage.key(),
            "kind" => kind
        )
        .increment(1);
    }

    pub fn run_rejected() {
        ::metrics::counter!(MetricName::StageRunsRejected.as_str()).increment(1);
    }

    pub fn validation_result(status: bool) {
        let status = if status { "passed" } else { "failed" };
        ::metrics::counter!(MetricName::StageValidationResults.as_str(), "status" => status)
            .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique_and_prefixed() {
        let names: Vec<&str> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();

        assert_eq!(names.len(), unique.len());
        assert!(names.iter().all(|n| n.starts_with("pipeline_")));
        assert_eq!(MetricName::StageDuration.to_string(), "pipeline_stage_duration_seconds");
    }
}
