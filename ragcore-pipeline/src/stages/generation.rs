//! Generation stage (spec §4.5 stage 6), grounded on
//! `original_source/backend/rag_solution/services/pipeline_service.py::_generate_answer`
//! and `::_format_context`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ragcore_types::{
    ContextStrategy, CoreError, GenerationOutput, GenerationParams, Llm, PromptInput, PromptTemplate, SearchContext,
    NO_DOCUMENTS_FOUND_ANSWER,
};

use crate::stage::{Stage, StageName, StageOutcome};

/// Joins retrieved chunk texts into one context string for the generation
/// prompt, per the pipeline's configured [`ContextStrategy`] (spec §3).
///
/// - `Simple`: chunks joined in retrieval order, one per paragraph.
/// - `Priority`: chunks joined highest-score-first (retrieval/reranking
///   already guarantee descending score order, so this is the same join as
///   `Simple` given the invariant upstream stages maintain).
/// - `Weighted`: each chunk is prefixed with its score so the generation
///   prompt can see relative confidence.
#[must_use]
pub fn format_context(chunks: &[ragcore_types::ScoredChunk], strategy: ContextStrategy) -> String {
    match strategy {
        ContextStrategy::Simple | ContextStrategy::Priority => chunks
            .iter()
            .map(|c| c.chunk().text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"),
        ContextStrategy::Weighted => chunks
            .iter()
            .map(|c| format!("[score={:.2}] {}", c.score(), c.chunk().text))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

/// Calls the LLM with the assembled context to produce the final answer.
/// If retrieval produced no chunks, short-circuits to
/// [`NO_DOCUMENTS_FOUND_ANSWER`] without a generation call (spec §4.5 step
/// 6, §8 boundary behavior).
pub struct GenerationStage {
    llm: Arc<dyn Llm>,
    template: PromptTemplate,
    context_strategy: ContextStrategy,
    params: Option<GenerationParams>,
}

impl GenerationStage {
    #[must_use]
    pub const fn new(
        llm: Arc<dyn Llm>,
        template: PromptTemplate,
        context_strategy: ContextStrategy,
        params: Option<GenerationParams>,
    ) -> Self {
        Self {
            llm,
            template,
            context_strategy,
            params,
        }
    }
}

#[async_trait]
impl Stage for GenerationStage {
    fn name(&self) -> StageName {
        StageName::Generation
    }

    async fn run(&self, ctx: &mut SearchContext) -> StageOutcome {
        if ctx.query_results.is_empty() {
            ctx.generated_answer = Some(NO_DOCUMENTS_FOUND_ANSWER.to_string());
            ctx.push_error("no documents found for query");
            return StageOutcome::Ok;
        }

        let query = ctx
            .rewritten_query
            .clone()
            .unwrap_or_else(|| ctx.input.question.clone());
        let context_text = format_context(&ctx.query_results, self.context_strategy);

        let mut variables = HashMap::new();
        variables.insert("context".to_string(), context_text);
        variables.insert("question".to_string(), query.clone());

        let prompt = match self.template.format(&variables) {
            Ok(prompt) => prompt,
            // A configured template missing a required variable is an
            // internal wiring mistake, not caller input, so it is reported
            // as Configuration rather than the template's own Validation
            // kind.
            Err(err) => {
                return StageOutcome::FatalError(CoreError::configuration(format!(
                    "failed to format generation prompt: {err}"
                )))
            }
        };

        match self
            .llm
            .generate(
                &ctx.resolved_user_id,
                PromptInput::Single(prompt),
                Some(&self.template),
                Some(&variables),
                self.params.as_ref(),
            )
            .await
        {
            Ok(output) => {
                let answer = output.into_vec().into_iter().next().unwrap_or_default();
                ctx.generated_answer = Some(answer);
                StageOutcome::Ok
            }
            Err(err) => StageOutcome::FatalError(err),
        }
    }
}
