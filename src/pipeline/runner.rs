use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::stage::{Stage, StageReport, StageStatus, StepLog};
use crate::components::{DataIngestion, DataValidation, StageComponent};
use crate::config::{ConfigRegistry, StageConfig};
use crate::error::{PipelineError, Result};
use crate::observability::{EventSink, PipelineEvent};

/// Builds a stage's component from its resolved configuration
pub type ComponentFactory =
    Box<dyn Fn(StageConfig, Arc<dyn EventSink>) -> Result<Box<dyn StageComponent>> + Send + Sync>;

/// Drives one stage at a time: resolve config, construct the component,
/// invoke its operations.
///
/// Failures are reported exactly once, as a `StageFailed` event, and then
/// returned to the caller unchanged.
pub struct PipelineRunner {
    registry: ConfigRegistry,
    factories: HashMap<Stage, ComponentFactory>,
}

impl PipelineRunner {
    /// A runner with the built-in ingestion and validation components
    pub fn new(registry: ConfigRegistry) -> Self {
        let mut runner = Self {
            registry,
            factories: HashMap::new(),
        };

        runner.register(
            Stage::DataIngestion,
            Box::new(|config, sink| match config {
                StageConfig::DataIngestion(config) => {
                    Ok(Box::new(DataIngestion::new(config, sink)) as Box<dyn StageComponent>)
                }
                other => Err(PipelineError::NoComponent(other.stage())),
            }),
        );
        runner.register(
            Stage::DataValidation,
            Box::new(|config, sink| match config {
                StageConfig::DataValidation(config) => {
                    Ok(Box::new(DataValidation::new(config, sink)) as Box<dyn StageComponent>)
                }
                other => Err(PipelineError::NoComponent(other.stage())),
            }),
        );

        runner
    }

    /// Install or replace the component factory for `stage`
    pub fn register(&mut self, stage: Stage, factory: ComponentFactory) {
        self.factories.insert(stage, factory);
    }

    pub fn has_component(&self, stage: Stage) -> bool {
        self.factories.contains_key(&stage)
    }

    pub fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }

    /// Parse `name` and run that stage. A name that matches no stage is
    /// reported as `StageRejected` and returned as `UnknownStage`.
    pub fn run_stage_by_name(&self, name: &str) -> Result<StageReport> {
        let stage: Stage = match name.parse() {
            Ok(stage) => stage,
            Err(err) => {
                self.registry.sink().emit(&PipelineEvent::StageRejected {
                    name: name.to_string(),
                    error: err.to_string(),
                });
                return Err(err);
            }
        };
        self.run_stage(stage)
    }

    #[instrument(skip(self), fields(stage = %stage))]
    pub fn run_stage(&self, stage: Stage) -> Result<StageReport> {
        let sink = self.registry.sink();
        let mut run = StageRun::new(stage, Arc::clone(&sink));
        let started_at = Utc::now();
        let timer = Instant::now();

        sink.emit(&PipelineEvent::StageStarted {
            stage,
            run_id: run.run_id,
        });
        run.advance(StageStatus::Running);

        let mut steps = StepLog::observed(stage, Arc::clone(&sink));
        let outcome = self.execute(stage, &mut steps, &sink);

        match outcome {
            Ok(output) => {
                run.advance(StageStatus::Succeeded);
                sink.emit(&PipelineEvent::StageSucceeded {
                    stage,
                    run_id: run.run_id,
                    elapsed_secs: timer.elapsed().as_secs_f64(),
                });
                Ok(StageReport {
                    run_id: run.run_id,
                    stage,
                    status: run.status,
                    started_at,
                    finished_at: Utc::now(),
                    steps: steps.completed().to_vec(),
                    output,
                })
            }
            Err(err) => {
                run.advance(StageStatus::Failed);
                sink.emit(&PipelineEvent::StageFailed {
                    stage,
                    run_id: run.run_id,
                    step: steps.current().unwrap_or("unknown"),
                    kind: err.kind(),
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn execute(
        &self,
        stage: Stage,
        steps: &mut StepLog,
        sink: &Arc<dyn EventSink>,
    ) -> Result<super::StageOutput> {
        let config = steps.step("resolve_config", || self.registry.stage_config(stage))?;
        debug!("Resolved configuration for {}", stage.display_name());

        let component = steps.step("construct_component", || {
            let factory = self
                .factories
                .get(&stage)
                .ok_or(PipelineError::NoComponent(stage))?;
            factory(config, Arc::clone(sink))
        })?;

        component.run(steps)
    }
}

/// Status of one in-flight stage run; every change is reported to the sink
struct StageRun {
    stage: Stage,
    run_id: Uuid,
    status: StageStatus,
    sink: Arc<dyn EventSink>,
}

impl StageRun {
    fn new(stage: Stage, sink: Arc<dyn EventSink>) -> Self {
        Self {
            stage,
            run_id: Uuid::new_v4(),
            status: StageStatus::NotStarted,
            sink,
        }
    }

    fn advance(&mut self, next: StageStatus) {
        if !self.status.can_transition_to(next) {
            warn!(from = ?self.status, to = ?next, "Ignoring invalid stage status change");
            return;
        }
        self.sink.emit(&PipelineEvent::StatusChanged {
            stage: self.stage,
            run_id: self.run_id,
            from: self.status,
            to: next,
        });
        self.status = next;
    }
}
