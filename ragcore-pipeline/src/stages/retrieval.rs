//! Retrieval stage (spec §4.5 stage 3), grounded on
//! `original_source/backend/rag_solution/services/pipeline_service.py::_retrieve_documents`.

use std::sync::Arc;

use async_trait::async_trait;
use ragcore_types::{CoreError, SearchContext, VectorQuery, VectorStore};

use crate::stage::{Stage, StageName, StageOutcome};

/// Hard ceiling on `top_k` regardless of caller or per-request override
/// (spec §4.5 stage 3: "default 10, capped to 100").
pub const MAX_TOP_K: usize = 100;

/// Queries the resolved collection's vector store for the top-k chunks
/// matching the rewritten query, applying an optional post-retrieval
/// minimum-score filter (spec §4.5 stage 3). The capability boundary
/// (`VectorStore::retrieve`) takes a metadata filter, not a score
/// threshold, so the min-score cut is applied here rather than pushed into
/// the store.
pub struct RetrievalStage {
    store: Arc<dyn VectorStore>,
    top_k: usize,
    min_score: Option<f32>,
}

impl RetrievalStage {
    #[must_use]
    pub const fn new(store: Arc<dyn VectorStore>, top_k: usize) -> Self {
        Self {
            store,
            top_k,
            min_score: None,
        }
    }

    #[must_use]
    pub const fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }
}

#[async_trait]
impl Stage for RetrievalStage {
    fn name(&self) -> StageName {
        StageName::Retrieval
    }

    async fn run(&self, ctx: &mut SearchContext) -> StageOutcome {
        let Some(collection_name) = ctx.vector_collection_name.clone() else {
            return StageOutcome::FatalError(CoreError::configuration(
                "retrieval stage requires a resolved vector collection name",
            ));
        };
        let query = ctx
            .rewritten_query
            .clone()
            .unwrap_or_else(|| ctx.input.question.clone());

        let top_k = ctx
            .input
            .config_metadata
            .as_ref()
            .and_then(|metadata| metadata.top_k_override)
            .map_or(self.top_k, |override_k| override_k as usize)
            .min(MAX_TOP_K);

        match self
            .store
            .retrieve(VectorQuery::Text(query), &collection_name, top_k, None)
            .await
        {
            Ok(results) => {
                ctx.query_results = match self.min_score {
                    Some(min_score) => results
                        .into_iter()
                        .filter(|scored| scored.score() >= min_score)
                        .collect(),
                    None => results,
                };
                StageOutcome::Ok
            }
            Err(err) => StageOutcome::FatalError(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use ragcore_types::{DocumentChunk, EmbeddedChunk, MetadataFilter, Result, ScoredChunk, VectorCollectionConfig};

    use super::*;

    struct StubStore {
        results: Vec<ScoredChunk>,
    }

    #[async_trait]
    impl VectorStore for StubStore {
        async fn create_collection(&self, _name: &str, _config: VectorCollectionConfig) -> Result<()> {
            Ok(())
        }

        async fn delete_collection(&self, _name: &str) -> Result<()> {
            Ok(())
        }

        async fn upsert(&self, _name: &str, _chunks: Vec<EmbeddedChunk>) -> Result<()> {
            Ok(())
        }

        async fn retrieve(
            &self,
            _query: VectorQuery,
            _name: &str,
            _top_k: usize,
            _filter: Option<MetadataFilter>,
        ) -> Result<Vec<ScoredChunk>> {
            Ok(self.results.clone())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl VectorStore for FailingStore {
        async fn create_collection(&self, _name: &str, _config: VectorCollectionConfig) -> Result<()> {
            Ok(())
        }

        async fn delete_collection(&self, _name: &str) -> Result<()> {
            Ok(())
        }

        async fn upsert(&self, _name: &str, _chunks: Vec<EmbeddedChunk>) -> Result<()> {
            Ok(())
        }

        async fn retrieve(
            &self,
            _query: VectorQuery,
            _name: &str,
            _top_k: usize,
            _filter: Option<MetadataFilter>,
        ) -> Result<Vec<ScoredChunk>> {
            Err(CoreError::storage("vector backend unreachable"))
        }
    }

    fn ctx_with_collection() -> SearchContext {
        let mut context = SearchContext::new(ragcore_types::SearchInput {
            question: "capital of france".into(),
            collection_id: "c1".into(),
            pipeline_id: None,
            user_id: "u1".into(),
            config_metadata: None,
        });
        context.vector_collection_name = Some("collection_abc".into());
        context
    }

    #[tokio::test]
    async fn populates_query_results_from_store() {
        let store = Arc::new(StubStore {
            results: vec![ScoredChunk::new(DocumentChunk::new("c1", "Paris"), 0.9)],
        });
        let stage = RetrievalStage::new(store, 5);
        let mut context = ctx_with_collection();
        let outcome = stage.run(&mut context).await;
        assert!(matches!(outcome, StageOutcome::Ok));
        assert_eq!(context.query_results.len(), 1);
    }

    #[tokio::test]
    async fn top_k_override_is_capped_at_max() {
        let store = Arc::new(StubStore {
            results: vec![ScoredChunk::new(DocumentChunk::new("c1", "Paris"), 0.9)],
        });
        let stage = RetrievalStage::new(store, 5);
        let mut context = ctx_with_collection();
        context.input.config_metadata = Some(ragcore_types::SearchConfigMetadata {
            top_k_override: Some(1000),
            ..Default::default()
        });
        let outcome = stage.run(&mut context).await;
        assert!(matches!(outcome, StageOutcome::Ok));
    }

    #[tokio::test]
    async fn min_score_filters_out_low_scoring_chunks() {
        let store = Arc::new(StubStore {
            results: vec![
                ScoredChunk::new(DocumentChunk::new("c1", "Paris"), 0.9),
                ScoredChunk::new(DocumentChunk::new("c2", "Lyon"), 0.2),
            ],
        });
        let stage = RetrievalStage::new(store, 5).with_min_score(0.5);
        let mut context = ctx_with_collection();
        let outcome = stage.run(&mut context).await;
        assert!(matches!(outcome, StageOutcome::Ok));
        assert_eq!(context.query_results.len(), 1);
        assert_eq!(context.query_results[0].chunk().id, "c1");
    }

    #[tokio::test]
    async fn missing_vector_collection_name_is_fatal() {
        let store = Arc::new(StubStore { results: vec![] });
        let stage = RetrievalStage::new(store, 5);
        let mut context = SearchContext::new(ragcore_types::SearchInput {
            question: "q".into(),
            collection_id: "c1".into(),
            pipeline_id: None,
            user_id: "u1".into(),
            config_metadata: None,
        });
        let outcome = stage.run(&mut context).await;
        assert!(matches!(outcome, StageOutcome::FatalError(CoreError::Configuration { .. })));
    }

    #[tokio::test]
    async fn store_error_is_propagated_with_its_typed_kind() {
        let stage = RetrievalStage::new(Arc::new(FailingStore), 5);
        let mut context = ctx_with_collection();
        let outcome = stage.run(&mut context).await;
        assert!(matches!(outcome, StageOutcome::FatalError(CoreError::Storage { .. })));
    }
}
