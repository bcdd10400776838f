//! Optional chain-of-thought reasoning stage (spec §4.5 stage 5), run only
//! when [`ragcore_types::SearchConfigMetadata::cot_enabled`] is set.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use ragcore_types::{CoTOutput, ReasoningStep, SearchContext};

use crate::stage::{Stage, StageName, StageOutcome};

/// Produces a chain-of-thought trace for the current query/context. A
/// concrete multi-step reasoning engine (iterative LLM calls, a
/// tree-of-thought search) is out of scope here; this trait is the seam.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// # Errors
    ///
    /// Returns an error string on provider failure; the stage treats this
    /// as recoverable since chain-of-thought is an optional enrichment of
    /// the final answer, not a precondition for producing one.
    async fn reason(&self, query: &str, context_snippets: &[String]) -> Result<CoTOutput, String>;
}

/// A [`ReasoningEngine`] that always reports a single, trivial step. Used
/// when no reasoning engine is configured but the stage is still wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReasoner;

#[async_trait]
impl ReasoningEngine for NoopReasoner {
    async fn reason(&self, _query: &str, _context_snippets: &[String]) -> Result<CoTOutput, String> {
        Ok(CoTOutput {
            steps: vec![ReasoningStep {
                step_index: 0,
                description: "direct answer, no multi-step reasoning performed".into(),
                intermediate_answer: String::new(),
                confidence: 1.0,
                tokens_used: 0,
            }],
            aggregated_confidence: 1.0,
            total_execution_time: Duration::ZERO,
        })
    }
}

/// Runs only when the request opted into chain-of-thought (spec §4.5: "this
/// stage is skipped unless `cot_enabled` is set"); otherwise a no-op.
pub struct ReasoningStage<E: ReasoningEngine> {
    engine: E,
}

impl<E: ReasoningEngine> ReasoningStage<E> {
    pub const fn new(engine: E) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<E: ReasoningEngine> Stage for ReasoningStage<E> {
    fn name(&self) -> StageName {
        StageName::Reasoning
    }

    async fn run(&self, ctx: &mut SearchContext) -> StageOutcome {
        let cot_enabled = ctx
            .input
            .config_metadata
            .as_ref()
            .is_some_and(|metadata| metadata.cot_enabled);
        if !cot_enabled {
            return StageOutcome::Ok;
        }

        let query = ctx
            .rewritten_query
            .clone()
            .unwrap_or_else(|| ctx.input.question.clone());
        let snippets: Vec<String> = ctx.query_results.iter().map(|c| c.chunk().text.clone()).collect();

        let start = Instant::now();
        match self.engine.reason(&query, &snippets).await {
            Ok(mut output) => {
                output.total_execution_time = start.elapsed();
                ctx.cot_output = Some(output);
                StageOutcome::Ok
            }
            Err(message) => StageOutcome::RecoverableError(format!("reasoning stage failed: {message}")),
        }
    }
}
