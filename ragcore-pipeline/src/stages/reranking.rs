//! Reranking stage (spec §4.5 stage 4). Thin adapter from [`Stage`] onto a
//! [`ragcore_rerank::Reranker`] — the reranker itself never fails the
//! caller (see `ragcore_rerank::Reranker`'s contract), so this stage always
//! returns [`StageOutcome::Ok`].

use std::sync::Arc;

use async_trait::async_trait;
use ragcore_rerank::Reranker;
use ragcore_types::SearchContext;

use crate::stage::{Stage, StageName, StageOutcome};

pub struct RerankingStage {
    reranker: Arc<dyn Reranker>,
    top_k: Option<usize>,
}

impl RerankingStage {
    #[must_use]
    pub const fn new(reranker: Arc<dyn Reranker>, top_k: Option<usize>) -> Self {
        Self { reranker, top_k }
    }
}

#[async_trait]
impl Stage for RerankingStage {
    fn name(&self) -> StageName {
        StageName::Reranking
    }

    async fn run(&self, ctx: &mut SearchContext) -> StageOutcome {
        let query = ctx
            .rewritten_query
            .clone()
            .unwrap_or_else(|| ctx.input.question.clone());
        let chunks = std::mem::take(&mut ctx.query_results);
        ctx.query_results = self.reranker.rerank(&query, chunks, self.top_k).await;
        StageOutcome::Ok
    }
}

#[cfg(test)]
mod tests {
    use ragcore_rerank::PassthroughReranker;
    use ragcore_types::{DocumentChunk, ScoredChunk};

    use super::*;

    #[tokio::test]
    async fn reranking_stage_sorts_chunks_by_score() {
        let stage = RerankingStage::new(Arc::new(PassthroughReranker), None);
        let mut context = SearchContext::new(ragcore_types::SearchInput {
            question: "q".into(),
            collection_id: "c1".into(),
            pipeline_id: None,
            user_id: "u1".into(),
            config_metadata: None,
        });
        context.query_results = vec![
            ScoredChunk::new(DocumentChunk::new("a", "low"), 0.2),
            ScoredChunk::new(DocumentChunk::new("b", "high"), 0.9),
        ];
        let outcome = stage.run(&mut context).await;
        assert!(matches!(outcome, StageOutcome::Ok));
        assert_eq!(context.query_results[0].chunk().id, "b");
    }
}
