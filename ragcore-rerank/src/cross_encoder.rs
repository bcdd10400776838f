//! Cross-encoder reranking strategy (spec §4.3 supplement — a third
//! strategy alongside score-sort and LLM-as-judge, since a cross-encoder
//! model is a common production reranker and the capability trait below
//! generalizes cleanly from [`ragcore_types::Llm`]'s shape).

use async_trait::async_trait;
use ragcore_types::ScoredChunk;
use tracing::error;

use crate::strategy::{sort_and_truncate, Reranker};

/// A relevance-scoring model that takes `(query, document)` pairs directly,
/// as opposed to an LLM prompted into producing a score. Implementations
/// are typically a local ONNX/candle model or a hosted cross-encoder
/// endpoint; neither is in scope here (spec Non-goals: no concrete model
/// runtimes), only the trait boundary.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    /// Scores each `(query, document)` pair, returning one score per input
    /// document in the same order, already normalized to `[0.0, 1.0]`.
    ///
    /// # Errors
    ///
    /// Returns an error string on model/backend failure; the reranker
    /// catches it and falls back to the documents' original scores.
    async fn score_pairs(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, String>;
}

/// Reranks by delegating batch scoring to a [`CrossEncoder`]. On model
/// failure, or on a result whose length does not match the input, falls
/// back to the chunks' original scores rather than failing the caller
/// (same fallback contract as [`crate::llm_judge::LlmJudgeReranker`]).
pub struct CrossEncoderReranker<C: CrossEncoder> {
    model: C,
}

impl<C: CrossEncoder> CrossEncoderReranker<C> {
    pub const fn new(model: C) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<C: CrossEncoder> Reranker for CrossEncoderReranker<C> {
    async fn rerank(
        &self,
        query: &str,
        chunks: Vec<ScoredChunk>,
        top_k: Option<usize>,
    ) -> Vec<ScoredChunk> {
        if chunks.is_empty() {
            return Vec::new();
        }

        let documents: Vec<String> = chunks.iter().map(|c| c.chunk().text.clone()).collect();
        let scores = match self.model.score_pairs(query, &documents).await {
            Ok(scores) if scores.len() == chunks.len() => scores,
            Ok(scores) => {
                error!(
                    expected = chunks.len(),
                    got = scores.len(),
                    "cross-encoder returned a mismatched number of scores; falling back to original scores"
                );
                return sort_and_truncate(chunks, top_k);
            }
            Err(err) => {
                error!(error = %err, "cross-encoder scoring failed; falling back to original scores");
                return sort_and_truncate(chunks, top_k);
            }
        };

        let rescored: Vec<ScoredChunk> = chunks
            .into_iter()
            .zip(scores)
            .map(|(mut scored, score)| {
                scored.rescore(score.clamp(0.0, 1.0));
                scored
            })
            .collect();

        sort_and_truncate(rescored, top_k)
    }
}

#[cfg(test)]
mod tests {
    use ragcore_types::DocumentChunk;

    use super::*;

    struct StubModel {
        scores: Vec<f32>,
        fail: bool,
    }

    #[async_trait]
    impl CrossEncoder for StubModel {
        async fn score_pairs(&self, _query: &str, documents: &[String]) -> Result<Vec<f32>, String> {
            if self.fail {
                return Err("backend unavailable".to_string());
            }
            Ok(self.scores[..documents.len()].to_vec())
        }
    }

    fn chunk(id: &str, score: f32) -> ScoredChunk {
        ScoredChunk::new(DocumentChunk::new(id, format!("text-{id}")), score)
    }

    #[tokio::test]
    async fn rescored_output_is_sorted_descending() {
        let reranker = CrossEncoderReranker::new(StubModel {
            scores: vec![0.2, 0.9, 0.5],
            fail: false,
        });
        let chunks = vec![chunk("a", 0.1), chunk("b", 0.1), chunk("c", 0.1)];
        let result = reranker.rerank("q", chunks, None).await;
        let ids: Vec<_> = result.iter().map(|c| c.chunk().id.clone()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_original_scores() {
        let reranker = CrossEncoderReranker::new(StubModel {
            scores: vec![],
            fail: true,
        });
        let chunks = vec![chunk("a", 0.4), chunk("b", 0.9)];
        let result = reranker.rerank("q", chunks, None).await;
        let ids: Vec<_> = result.iter().map(|c| c.chunk().id.clone()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn empty_input_makes_no_model_calls() {
        let reranker = CrossEncoderReranker::new(StubModel {
            scores: vec![],
            fail: true,
        });
        let result = reranker.rerank("q", vec![], None).await;
        assert!(result.is_empty());
    }
}
