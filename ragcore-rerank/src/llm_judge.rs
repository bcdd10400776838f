//! LLM-as-judge reranking strategy (spec §4.3), grounded on
//! `original_source/backend/rag_solution/retrieval/reranker.py`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ragcore_types::{GenerationOutput, Llm, PromptInput, PromptTemplate, ScoredChunk};
use tracing::{error, warn};

use crate::score_parse::{extract_normalized_score, FALLBACK_SCORE};
use crate::strategy::{sort_and_truncate, Reranker};

/// Scores each chunk by asking an LLM to rate `{query, document, scale}`
/// with a reranking [`PromptTemplate`], in batches of `batch_size`.
///
/// Batches within one `rerank` call are scored concurrently when
/// `concurrent` is `true`; the flattened, per-chunk results are identical
/// either way (spec §4.3's equivalence requirement) because concurrency
/// only overlaps the *awaiting* of independent batch calls — each batch's
/// results are placed back at their original positions before the final
/// sort.
pub struct LlmJudgeReranker {
    llm: Arc<dyn Llm>,
    user_id: String,
    template: PromptTemplate,
    batch_size: usize,
    score_scale: f32,
    concurrent: bool,
}

impl LlmJudgeReranker {
    /// # Errors
    ///
    /// Returns an error if `template` is not a reranking template declaring
    /// at least the `document` and `query` variables — the source system's
    /// `LLMReranker.__init__` raises `ValueError` for a `None` template; we
    /// generalize that into "the template must actually be usable".
    pub fn new(
        llm: Arc<dyn Llm>,
        user_id: impl Into<String>,
        template: PromptTemplate,
        batch_size: usize,
        score_scale: f32,
    ) -> Result<Self, String> {
        let required = ["query", "document"];
        for variable in required {
            if !template.input_variables.iter().any(|v| v == variable) {
                return Err(format!(
                    "reranking template must declare the '{variable}' variable"
                ));
            }
        }
        Ok(Self {
            llm,
            user_id: user_id.into(),
            template,
            batch_size: batch_size.max(1),
            score_scale,
            concurrent: true,
        })
    }

    #[must_use]
    pub const fn sequential(mut self) -> Self {
        self.concurrent = false;
        self
    }

    fn build_prompts(&self, query: &str, batch: &[ScoredChunk]) -> Vec<String> {
        batch
            .iter()
            .map(|scored| {
                let mut variables = HashMap::new();
                variables.insert("query".to_string(), query.to_string());
                variables.insert("document".to_string(), scored.chunk().text.clone());
                if self.template.input_variables.iter().any(|v| v == "scale") {
                    variables.insert("scale".to_string(), self.score_scale.to_string());
                }
                self.template
                    .format(&variables)
                    .unwrap_or_else(|_| scored.chunk().text.clone())
            })
            .collect()
    }

    async fn score_batch(&self, query: &str, batch: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
        let prompts = self.build_prompts(query, &batch);
        let response = self
            .llm
            .generate(&self.user_id, PromptInput::Batch(prompts), None, None, None)
            .await;

        let responses = match response {
            Ok(GenerationOutput::Batch(responses)) if responses.len() == batch.len() => responses,
            Ok(_) => {
                error!(
                    batch_size = batch.len(),
                    "LLM returned an unexpected response shape for reranking batch; \
                     falling back to original scores"
                );
                return batch;
            }
            Err(err) => {
                error!(
                    error = %err,
                    batch_size = batch.len(),
                    "reranking batch call failed; falling back to original scores"
                );
                return batch;
            }
        };

        batch
            .into_iter()
            .zip(responses)
            .map(|(mut scored, response)| {
                let score = extract_normalized_score(&response, self.score_scale).unwrap_or_else(|| {
                    warn!(
                        response = %response.chars().take(100).collect::<String>(),
                        "could not extract a reranking score from LLM response, defaulting to 0.5"
                    );
                    FALLBACK_SCORE
                });
                scored.rescore(score);
                scored
            })
            .collect()
    }
}

#[async_trait]
impl Reranker for LlmJudgeReranker {
    async fn rerank(
        &self,
        query: &str,
        chunks: Vec<ScoredChunk>,
        top_k: Option<usize>,
    ) -> Vec<ScoredChunk> {
        if chunks.is_empty() {
            return Vec::new();
        }

        let batches: Vec<Vec<ScoredChunk>> = chunks
            .chunks(self.batch_size)
            .map(<[ScoredChunk]>::to_vec)
            .collect();

        let scored = if self.concurrent {
            let futures = batches
                .into_iter()
                .map(|batch| self.score_batch(query, batch));
            futures::future::join_all(futures).await
        } else {
            let mut out = Vec::with_capacity(batches.len());
            for batch in batches {
                out.push(self.score_batch(query, batch).await);
            }
            out
        };

        let flattened: Vec<ScoredChunk> = scored.into_iter().flatten().collect();
        sort_and_truncate(flattened, top_k)
    }
}
