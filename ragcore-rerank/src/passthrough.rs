//! Passthrough (score-sort) reranking strategy (spec §4.3).

use async_trait::async_trait;
use ragcore_types::ScoredChunk;

use crate::strategy::{sort_and_truncate, Reranker};

/// Sorts by each chunk's existing score; does not call out to any model.
/// Idempotent: reranking an already-sorted list with the same `top_k`
/// yields the same ordering (spec §8).
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughReranker;

#[async_trait]
impl Reranker for PassthroughReranker {
    async fn rerank(
        &self,
        _query: &str,
        chunks: Vec<ScoredChunk>,
        top_k: Option<usize>,
    ) -> Vec<ScoredChunk> {
        sort_and_truncate(chunks, top_k)
    }
}
