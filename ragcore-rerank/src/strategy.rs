//! The reranker contract (spec §4.3).

use async_trait::async_trait;
use ragcore_types::ScoredChunk;

/// Reorders retrieved chunks by a relevance signal richer than the
/// first-pass vector score.
///
/// Implementations must never fail the caller: any internal error (a
/// malformed LLM response, a batch call that errors out) is absorbed into a
/// fallback score rather than propagated, so a reranker problem never
/// aborts the surrounding search (spec §4.3, §7).
///
/// Every implementation must uphold, for all inputs:
/// - output length `== min(top_k, input_len)` when `top_k` is set, else
///   `== input_len`;
/// - output sorted by non-increasing score;
/// - for every output chunk, `wrapper.score() == chunk().score` — guaranteed
///   structurally by [`ragcore_types::ScoredChunk`]'s API, not by this
///   trait.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        chunks: Vec<ScoredChunk>,
        top_k: Option<usize>,
    ) -> Vec<ScoredChunk>;
}

/// Sorts `chunks` by descending score and truncates to `min(top_k,
/// input_len)`. Shared by every strategy's final step so the invariant is
/// enforced in one place.
pub(crate) fn sort_and_truncate(mut chunks: Vec<ScoredChunk>, top_k: Option<usize>) -> Vec<ScoredChunk> {
    chunks.sort_by(|a, b| b.score().total_cmp(&a.score()));
    if let Some(k) = top_k {
        chunks.truncate(k);
    }
    chunks
}
