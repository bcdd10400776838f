//! The pipeline executor (C5, spec §4.5), grounded on
//! `original_source/backend/rag_solution/pipeline/pipeline.py::Pipeline.process`
//! and `llmspell-rag/src/pipeline/builder.rs`'s builder-with-validation shape.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ragcore_types::{CoreError, SearchContext};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::stage::{Stage, StageName, StageOutcome};

/// Errors building a [`Pipeline`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineBuildError {
    #[error("a retrieval stage is required")]
    MissingRetrieval,
    #[error("a generation stage is required")]
    MissingGeneration,
}

/// Assembles stages into a [`Pipeline`] in the fixed order required by spec
/// §4.5, regardless of the order callers invoke the `with_*` methods in.
/// Reranking and the reasoning stage are optional; retrieval and
/// generation are not.
#[derive(Default)]
pub struct PipelineBuilder {
    resolution: Option<Arc<dyn Stage>>,
    query_enhancement: Option<Arc<dyn Stage>>,
    retrieval: Option<Arc<dyn Stage>>,
    reranking: Option<Arc<dyn Stage>>,
    reasoning: Option<Arc<dyn Stage>>,
    generation: Option<Arc<dyn Stage>>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_resolution(mut self, stage: Arc<dyn Stage>) -> Self {
        self.resolution = Some(stage);
        self
    }

    #[must_use]
    pub fn with_query_enhancement(mut self, stage: Arc<dyn Stage>) -> Self {
        self.query_enhancement = Some(stage);
        self
    }

    #[must_use]
    pub fn with_retrieval(mut self, stage: Arc<dyn Stage>) -> Self {
        self.retrieval = Some(stage);
        self
    }

    #[must_use]
    pub fn with_reranking(mut self, stage: Arc<dyn Stage>) -> Self {
        self.reranking = Some(stage);
        self
    }

    #[must_use]
    pub fn with_reasoning(mut self, stage: Arc<dyn Stage>) -> Self {
        self.reasoning = Some(stage);
        self
    }

    #[must_use]
    pub fn with_generation(mut self, stage: Arc<dyn Stage>) -> Self {
        self.generation = Some(stage);
        self
    }

    /// # Errors
    ///
    /// Returns [`PipelineBuildError`] if retrieval or generation was never
    /// set.
    pub fn build(self) -> Result<Pipeline, PipelineBuildError> {
        let retrieval = self.retrieval.ok_or(PipelineBuildError::MissingRetrieval)?;
        let generation = self.generation.ok_or(PipelineBuildError::MissingGeneration)?;

        let mut stages = Vec::with_capacity(6);
        stages.extend(self.resolution);
        stages.extend(self.query_enhancement);
        stages.push(retrieval);
        stages.extend(self.reranking);
        stages.extend(self.reasoning);
        stages.push(generation);

        Ok(Pipeline { stages })
    }
}

/// An ordered, immutable sequence of stages. Construct with
/// [`PipelineBuilder`] — there is no public way to build one with stages
/// out of order.
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    /// Runs every stage against `ctx` in order, subject to an overall
    /// `deadline` measured from the start of execution.
    ///
    /// A [`StageOutcome::RecoverableError`] is recorded and execution
    /// continues with the next stage. A [`StageOutcome::FatalError`], or
    /// the deadline elapsing before a stage starts, stops the pipeline
    /// immediately and returns `ctx` as it stands.
    pub async fn execute(&self, mut ctx: SearchContext, deadline: Duration) -> SearchContext {
        let start = Instant::now();

        for stage in &self.stages {
            let Some(remaining) = deadline.checked_sub(start.elapsed()).filter(|d| !d.is_zero()) else {
                let err = CoreError::cancellation(format!(
                    "pipeline deadline exceeded before stage {}",
                    stage.name().as_str()
                ));
                warn!(stage = stage.name().as_str(), "pipeline deadline exceeded before stage started");
                ctx.push_error(err.to_string());
                ctx.fatal_error = Some(err);
                break;
            };

            let stage_start = Instant::now();
            let outcome = match tokio::time::timeout(remaining, stage.run(&mut ctx)).await {
                Ok(outcome) => outcome,
                Err(_) => StageOutcome::FatalError(CoreError::cancellation(format!(
                    "stage {} timed out",
                    stage.name().as_str()
                ))),
            };
            let stage_elapsed = stage_start.elapsed();

            ctx.stage_metadata
                .entry(stage.name().as_str().to_string())
                .or_default()
                .duration = Some(stage_elapsed);

            match outcome {
                StageOutcome::Ok => {
                    debug!(stage = stage.name().as_str(), elapsed_ms = stage_elapsed.as_millis() as u64, "stage completed");
                }
                StageOutcome::RecoverableError(message) => {
                    warn!(stage = stage.name().as_str(), %message, "stage reported a recoverable error");
                    ctx.push_error(message);
                }
                StageOutcome::FatalError(err) => {
                    error!(stage = stage.name().as_str(), %err, "stage reported a fatal error, aborting pipeline");
                    ctx.push_error(err.to_string());
                    ctx.fatal_error = Some(err);
                    break;
                }
            }
        }

        ctx.execution_time = Some(start.elapsed());
        ctx
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use ragcore_types::SearchInput;

    use super::*;

    struct StubStage {
        name: StageName,
        outcome: fn() -> StageOutcome,
    }

    #[async_trait]
    impl Stage for StubStage {
        fn name(&self) -> StageName {
            self.name
        }

        async fn run(&self, _ctx: &mut SearchContext) -> StageOutcome {
            (self.outcome)()
        }
    }

    fn ctx() -> SearchContext {
        SearchContext::new(SearchInput {
            question: "q".into(),
            collection_id: "c1".into(),
            pipeline_id: None,
            user_id: "u1".into(),
            config_metadata: None,
        })
    }

    #[test]
    fn build_requires_retrieval_and_generation() {
        assert_eq!(PipelineBuilder::new().build().unwrap_err(), PipelineBuildError::MissingRetrieval);

        let retrieval: Arc<dyn Stage> = Arc::new(StubStage {
            name: StageName::Retrieval,
            outcome: || StageOutcome::Ok,
        });
        assert_eq!(
            PipelineBuilder::new().with_retrieval(retrieval).build().unwrap_err(),
            PipelineBuildError::MissingGeneration
        );
    }

    #[tokio::test]
    async fn stages_run_in_fixed_order_regardless_of_builder_call_order() {
        let order = std::sync::Arc::new(tokio::sync::Mutex::new(Vec::new()));

        struct RecordingStage {
            name: StageName,
            order: std::sync::Arc<tokio::sync::Mutex<Vec<StageName>>>,
        }

        #[async_trait]
        impl Stage for RecordingStage {
            fn name(&self) -> StageName {
                self.name
            }

            async fn run(&self, _ctx: &mut SearchContext) -> StageOutcome {
                self.order.lock().await.push(self.name);
                StageOutcome::Ok
            }
        }

        let pipeline = PipelineBuilder::new()
            .with_generation(Arc::new(RecordingStage {
                name: StageName::Generation,
                order: order.clone(),
            }))
            .with_reranking(Arc::new(RecordingStage {
                name: StageName::Reranking,
                order: order.clone(),
            }))
            .with_retrieval(Arc::new(RecordingStage {
                name: StageName::Retrieval,
                order: order.clone(),
            }))
            .build()
            .unwrap();

        pipeline.execute(ctx(), Duration::from_secs(5)).await;

        let recorded = order.lock().await.clone();
        assert_eq!(
            recorded,
            vec![StageName::Retrieval, StageName::Reranking, StageName::Generation]
        );
    }

    #[tokio::test]
    async fn fatal_error_stops_remaining_stages() {
        let pipeline = PipelineBuilder::new()
            .with_retrieval(Arc::new(StubStage {
                name: StageName::Retrieval,
                outcome: || StageOutcome::FatalError(CoreError::storage("backend down")),
            }))
            .with_generation(Arc::new(StubStage {
                name: StageName::Generation,
                outcome: || panic!("generation must not run after a fatal retrieval error"),
            }))
            .build()
            .unwrap();

        let result = pipeline.execute(ctx(), Duration::from_secs(5)).await;
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("backend down"));
        assert!(matches!(result.fatal_error, Some(CoreError::Storage { .. })));
    }

    #[tokio::test]
    async fn recoverable_error_does_not_stop_the_pipeline() {
        let pipeline = PipelineBuilder::new()
            .with_retrieval(Arc::new(StubStage {
                name: StageName::Retrieval,
                outcome: || StageOutcome::Ok,
            }))
            .with_reranking(Arc::new(StubStage {
                name: StageName::Reranking,
                outcome: || StageOutcome::RecoverableError("reranker unavailable".into()),
            }))
            .with_generation(Arc::new(StubStage {
                name: StageName::Generation,
                outcome: || StageOutcome::Ok,
            }))
            .build()
            .unwrap();

        let result = pipeline.execute(ctx(), Duration::from_secs(5)).await;
        assert_eq!(result.errors.len(), 1);
        assert!(result.stage_metadata.contains_key("generation"));
    }

    #[tokio::test]
    async fn already_elapsed_deadline_aborts_before_first_stage() {
        let pipeline = PipelineBuilder::new()
            .with_retrieval(Arc::new(StubStage {
                name: StageName::Retrieval,
                outcome: || panic!("must not run once the deadline has already elapsed"),
            }))
            .with_generation(Arc::new(StubStage {
                name: StageName::Generation,
                outcome: || StageOutcome::Ok,
            }))
            .build()
            .unwrap();

        let result = pipeline.execute(ctx(), Duration::from_millis(0)).await;
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.fatal_error, Some(CoreError::Cancellation { .. })));
    }
}
