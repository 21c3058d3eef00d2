mod common;

use std::fs;

use artifact_pipeline::components::StageComponent;
use artifact_pipeline::config::StageConfig;
use artifact_pipeline::observability::PipelineEvent;
use artifact_pipeline::pipeline::{StageOutput, StageStatus, StepLog};
use artifact_pipeline::{PipelineError, PipelineRunner, Result, Stage};
use common::{Project, FULL_CONFIG};

fn failures(project: &Project) -> Vec<PipelineEvent> {
    project
        .sink
        .events()
        .into_iter()
        .filter(|e| e.name() == "stage_failed")
        .collect()
}

#[test]
fn test_ingestion_stage_runs_end_to_end() {
    let project = Project::new(FULL_CONFIG);
    project.write_jobs("data/raw/gsearch_jobs.csv", 10);
    let runner = PipelineRunner::new(project.registry());

    let report = runner.run_stage(Stage::DataIngestion).unwrap();

    assert_eq!(report.status, StageStatus::Succeeded);
    assert_eq!(
        report.steps,
        vec![
            "resolve_config",
            "construct_component",
            "download_data",
            "extract_archive",
            "transfer_data",
            "read_data_file"
        ]
    );
    assert!(matches!(report.output, StageOutput::Ingestion { rows: 10, columns: 5, .. }));
    assert!(report.finished_at >= report.started_at);
    assert_eq!(project.sink.count("stage_started"), 1);
    assert_eq!(project.sink.count("stage_succeeded"), 1);
    assert!(failures(&project).is_empty());
}

#[test]
fn test_failed_step_is_logged_once_and_error_passes_through() {
    let project = Project::new(FULL_CONFIG);
    let runner = PipelineRunner::new(project.registry());

    let err = runner.run_stage(Stage::DataIngestion).unwrap_err();

    assert!(matches!(err, PipelineError::SourceNotFound { .. }));
    let failed = failures(&project);
    assert_eq!(failed.len(), 1);
    match &failed[0] {
        PipelineEvent::StageFailed {
            stage, step, kind, error, ..
        } => {
            assert_eq!(*stage, Stage::DataIngestion);
            assert_eq!(*step, "transfer_data");
            assert_eq!(*kind, "source_not_found");
            assert_eq!(*error, err.to_string());
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_validation_then_ingestion_order_matters() {
    let project = Project::new(FULL_CONFIG);
    project.write_jobs("data/raw/gsearch_jobs.csv", 2);
    let runner = PipelineRunner::new(project.registry());

    assert!(matches!(
        runner.run_stage(Stage::DataValidation),
        Err(PipelineError::SourceNotFound { .. })
    ));

    runner.run_stage_by_name("data_ingestion").unwrap();
    let report = runner.run_stage_by_name("data-validation").unwrap();

    match report.output {
        StageOutput::Validation(outcome) => assert!(outcome.status),
        other => panic!("unexpected output {other:?}"),
    }
}

#[test]
fn test_failure_in_one_stage_leaves_other_roots_alone() {
    let project = Project::new(FULL_CONFIG);
    let runner = PipelineRunner::new(project.registry());

    let _ = runner.run_stage(Stage::DataIngestion);

    assert!(project.path("artifacts/data_ingestion").is_dir());
    assert!(!project.path("artifacts/data_validation").exists());
    assert!(!project.path("artifacts/spacy_ner").exists());
}

struct WriteMarker {
    root: std::path::PathBuf,
}

impl StageComponent for WriteMarker {
    fn stage(&self) -> Stage {
        Stage::DataTransformation
    }

    fn run(&self, steps: &mut StepLog) -> Result<StageOutput> {
        steps.step("write_marker", || Ok(fs::write(self.root.join("done"), "ok")?))?;
        Ok(StageOutput::Completed)
    }
}

#[test]
fn test_custom_component_receives_resolved_config() {
    let project = Project::new(FULL_CONFIG);
    let mut runner = PipelineRunner::new(project.registry());
    assert!(!runner.has_component(Stage::DataTransformation));

    runner.register(
        Stage::DataTransformation,
        Box::new(|config, _sink| match config {
            StageConfig::DataTransformation(c) => Ok(Box::new(WriteMarker { root: c.root_dir }) as Box<dyn StageComponent>),
            other => Err(PipelineError::NoComponent(other.stage())),
        }),
    );
    let report = runner.run_stage(Stage::DataTransformation).unwrap();

    assert_eq!(report.output, StageOutput::Completed);
    assert_eq!(fs::read_to_string(project.path("artifacts/data_transformation/done")).unwrap(), "ok");
}

#[test]
fn test_stage_without_component_fails_after_resolving() {
    let project = Project::new(FULL_CONFIG);
    let runner = PipelineRunner::new(project.registry());

    let err = runner.run_stage(Stage::SpacyNer).unwrap_err();

    assert!(matches!(err, PipelineError::NoComponent(Stage::SpacyNer)));
    assert!(project.path("artifacts/spacy_ner").is_dir());
    assert!(matches!(
        &failures(&project)[0],
        PipelineEvent::StageFailed { step: "construct_component", .. }
    ));
}
