//! Turn-level conversation orchestration (C7, spec §4.7), grounded on
//! `original_source/tests/unit/services/test_message_processing_orchestrator.py`
//! (`MessageProcessingOrchestrator.process_user_message`) and
//! `llmspell-rag/src/session_integration.rs`'s session-scoped coordination
//! style.

use std::sync::Arc;

use ragcore_pipeline::SearchService;
use ragcore_types::{
    capability::word_based_token_estimate, CoreError, Llm, MessageKind, MessageMetadata,
    MessageRole, Result, SearchConfigMetadata, SearchInput,
};
use tracing::instrument;

use crate::context::ContextService;
use crate::repository::ConversationRepository;
use crate::token_tracking::TokenTrackingService;

/// The result of processing one user turn: the persisted assistant
/// message plus an optional token-budget warning computed from the
/// session's running total (spec §4.7 step 6). The warning is not part of
/// [`ragcore_types::ConversationMessage`] itself — it is a transport-level
/// concern the caller surfaces alongside the stored message.
#[derive(Debug, Clone)]
pub struct ProcessedTurn {
    pub message: ragcore_types::ConversationMessage,
    pub token_warning: Option<ragcore_types::TokenWarning>,
}

/// Coordinates a single user turn: validates the session, persists the
/// user message, builds conversational context, enhances the question,
/// delegates to [`SearchService`], counts tokens, and persists the
/// assistant's reply. Wraps the search pipeline rather than duplicating
/// any of its stage logic (spec §2 control flow, "For conversations, C7
/// wraps this path").
pub struct ConversationOrchestrator {
    repository: Arc<dyn ConversationRepository>,
    context_service: Arc<dyn ContextService>,
    token_tracking: Arc<dyn TokenTrackingService>,
    search_service: Arc<SearchService>,
    llm: Arc<dyn Llm>,
    context_token_limit: u64,
}

impl ConversationOrchestrator {
    #[must_use]
    pub fn new(
        repository: Arc<dyn ConversationRepository>,
        context_service: Arc<dyn ContextService>,
        token_tracking: Arc<dyn TokenTrackingService>,
        search_service: Arc<SearchService>,
        llm: Arc<dyn Llm>,
        context_token_limit: u64,
    ) -> Self {
        Self {
            repository,
            context_service,
            token_tracking,
            search_service,
            llm,
            context_token_limit,
        }
    }

    /// Processes one user turn end-to-end and returns the persisted
    /// assistant message, per spec §4.7's eight steps.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the session does not exist or
    /// `user_id` does not own it; propagates whatever [`SearchService`]
    /// surfaces for validation/configuration/provider failures; propagates
    /// [`CoreError::Storage`] from the repository.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn process_user_message(
        &self,
        session_id: &str,
        user_id: &str,
        question: &str,
        cot_enabled: bool,
    ) -> Result<ProcessedTurn> {
        let session = self.repository.get_session(session_id).await?;
        if session.owner_user_id != user_id {
            return Err(CoreError::not_found("conversation session"));
        }

        let query_tokens = self.tokenize(question).await;
        self.repository
            .create_message(
                session_id,
                MessageRole::User,
                MessageKind::Question,
                question,
                query_tokens,
                0,
                MessageMetadata::default(),
            )
            .await?;

        // Re-fetch so `history` includes the message just persisted; this
        // is what makes `conversation_total` below equal the sum of every
        // stored message's token count without double-counting (spec §4.7
        // invariant (d)).
        let history = self.repository.messages_by_session(session_id).await?;
        let context = self.context_service.build_context(&history).await;
        let enhanced_question = self.context_service.enhance_question(question, &context).await;

        let config_metadata = SearchConfigMetadata {
            conversation_aware: true,
            conversation_context: Some(context.context_window.clone()),
            entities: context.extracted_entities.clone(),
            cot_enabled,
            top_k_override: None,
            score_scale: None,
            extra: serde_json::Map::new(),
        };

        let search_input = SearchInput {
            question: enhanced_question,
            collection_id: session.collection_id.clone(),
            pipeline_id: None,
            user_id: user_id.to_string(),
            config_metadata: Some(config_metadata),
        };

        let output = self.search_service.search(search_input).await?;

        let response_tokens = self.tokenize(&output.answer).await;
        let conversation_total: u64 = history.iter().map(|m| m.token_count).sum::<u64>() + response_tokens;
        let total_this_turn = query_tokens + response_tokens;

        let token_analysis = ragcore_types::TokenAnalysis {
            query_tokens,
            response_tokens,
            system_tokens: 0,
            total_this_turn,
            conversation_total,
        };

        let token_warning = self
            .token_tracking
            .check_usage_warning(conversation_total, self.context_token_limit);

        let sources: Vec<serde_json::Value> = output
            .query_results
            .iter()
            .map(|scored| {
                serde_json::json!({
                    "chunk_id": scored.chunk().id,
                    "document_id": scored.chunk().metadata.as_ref().and_then(|m| m.document_id.clone()),
                    "score": scored.score(),
                    "text": scored.chunk().text,
                })
            })
            .collect();

        let metadata = MessageMetadata {
            sources,
            cot_trace: output
                .cot_output
                .as_ref()
                .and_then(|cot| serde_json::to_value(cot).ok()),
            token_analysis: Some(token_analysis),
        };

        let assistant_message = self
            .repository
            .create_message(
                session_id,
                MessageRole::Assistant,
                MessageKind::Answer,
                &output.answer,
                response_tokens,
                u64::try_from(output.execution_time.as_millis()).unwrap_or(u64::MAX),
                metadata,
            )
            .await?;

        Ok(ProcessedTurn {
            message: assistant_message,
            token_warning,
        })
    }

    /// Tokenizes `text` via the LLM capability, falling back to the
    /// word-based estimator on provider failure (spec §4.7 step 2, §4.1).
    async fn tokenize(&self, text: &str) -> u64 {
        match self.llm.tokenize(text).await {
            Ok(count) => count as u64,
            Err(_) => word_based_token_estimate(text) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use ragcore_pipeline::{Stage, StageName, StageOutcome};
    use ragcore_types::{
        ChunkMetadata, ConversationMessage, ConversationSession, DocumentChunk,
        DocumentStore, FileRecord, GenerationOutput, GenerationParams, PromptInput, PromptTemplate,
        ScoredChunk, SearchContext, SessionStatus, SourceKind,
    };

    use super::*;
    use crate::context::TranscriptContextService;
    use crate::token_tracking::ThresholdTokenTrackingService;

    struct InMemoryRepository {
        session: ConversationSession,
        messages: Mutex<Vec<ConversationMessage>>,
    }

    #[async_trait]
    impl ConversationRepository for InMemoryRepository {
        async fn get_session(&self, session_id: &str) -> Result<ConversationSession> {
            if session_id == self.session.id {
                Ok(self.session.clone())
            } else {
                Err(CoreError::not_found("session"))
            }
        }

        async fn messages_by_session(&self, _session_id: &str) -> Result<Vec<ConversationMessage>> {
            Ok(self.messages.lock().unwrap().clone())
        }

        async fn create_message(
            &self,
            session_id: &str,
            role: MessageRole,
            kind: MessageKind,
            content: &str,
            token_count: u64,
            execution_time_ms: u64,
            metadata: MessageMetadata,
        ) -> Result<ConversationMessage> {
            let mut messages = self.messages.lock().unwrap();
            let message = ConversationMessage {
                id: format!("m{}", messages.len() + 1),
                session_id: session_id.to_string(),
                role,
                kind,
                content: content.to_string(),
                token_count,
                execution_time_ms,
                metadata,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            messages.push(message.clone());
            Ok(message)
        }
    }

    struct StubLlm;

    #[async_trait]
    impl Llm for StubLlm {
        async fn generate(
            &self,
            _user_id: &str,
            _prompt: PromptInput,
            _template: Option<&PromptTemplate>,
            _variables: Option<&HashMap<String, String>>,
            _params: Option<&GenerationParams>,
        ) -> Result<GenerationOutput> {
            unimplemented!("not used directly; pipeline stage stubs the answer")
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            unimplemented!("not used in orchestrator tests")
        }

        async fn tokenize(&self, text: &str) -> Result<usize> {
            Ok(text.split_whitespace().count())
        }

        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    struct StubDocumentStore;

    #[async_trait]
    impl DocumentStore for StubDocumentStore {
        async fn files_by_collection(&self, _collection_id: &str) -> Result<Vec<FileRecord>> {
            Ok(vec![FileRecord {
                document_id: "d1".into(),
                display_name: "ai.pdf".into(),
                page_count: 5,
                chunk_count: 10,
            }])
        }
    }

    struct AnsweringStage;

    #[async_trait]
    impl Stage for AnsweringStage {
        fn name(&self) -> StageName {
            StageName::Generation
        }

        async fn run(&self, ctx: &mut SearchContext) -> StageOutcome {
            ctx.query_results = vec![ScoredChunk::new(
                DocumentChunk::new("c1", "AI is the simulation of human intelligence.").with_metadata(
                    ChunkMetadata {
                        source_kind: Some(SourceKind::Document),
                        document_id: Some("d1".into()),
                        page_number: Some(1),
                        ..ChunkMetadata::default()
                    },
                ),
                0.8,
            )];
            ctx.rewritten_query = Some("what is ai".into());
            ctx.generated_answer = Some("AI stands for artificial intelligence.".into());
            StageOutcome::Ok
        }
    }

    fn session() -> ConversationSession {
        ConversationSession {
            id: "s1".into(),
            owner_user_id: "u1".into(),
            collection_id: "c1".into(),
            status: SessionStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn prior_message(tokens: u64) -> ConversationMessage {
        ConversationMessage {
            id: "prior".into(),
            session_id: "s1".into(),
            role: MessageRole::User,
            kind: MessageKind::Question,
            content: "x".into(),
            token_count: tokens,
            execution_time_ms: 0,
            metadata: MessageMetadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn orchestrator(prior_messages: Vec<ConversationMessage>) -> ConversationOrchestrator {
        use ragcore_pipeline::PipelineBuilder;

        let pipeline = PipelineBuilder::new()
            .with_retrieval(Arc::new(AnsweringStage))
            .with_generation(Arc::new(AnsweringStage))
            .build()
            .unwrap();
        let search_service = Arc::new(SearchService::new(
            pipeline,
            Arc::new(StubDocumentStore),
            Duration::from_secs(5),
        ));

        let repository = Arc::new(InMemoryRepository {
            session: session(),
            messages: Mutex::new(prior_messages),
        });

        ConversationOrchestrator::new(
            repository,
            Arc::new(TranscriptContextService::default()),
            Arc::new(ThresholdTokenTrackingService::default()),
            search_service,
            Arc::new(StubLlm),
            8192,
        )
    }

    #[tokio::test]
    async fn processes_a_turn_and_returns_the_assistant_message() {
        let orchestrator = orchestrator(vec![]);
        let turn = orchestrator
            .process_user_message("s1", "u1", "What is AI?", false)
            .await
            .unwrap();

        assert_eq!(turn.message.role, MessageRole::Assistant);
        assert_eq!(turn.message.kind, MessageKind::Answer);
        assert!(turn.message.content.contains("artificial intelligence"));
        assert_eq!(turn.message.metadata.sources.len(), 1);
        assert!(turn.message.metadata.token_analysis.is_some());
    }

    #[tokio::test]
    async fn conversation_total_sums_every_persisted_message_token_count() {
        let priors = vec![prior_message(10), prior_message(20), prior_message(15)];
        let orchestrator = orchestrator(priors);

        let turn = orchestrator
            .process_user_message("s1", "u1", "What is AI?", false)
            .await
            .unwrap();

        let analysis = turn.message.metadata.token_analysis.unwrap();
        let all_messages = orchestrator.repository.messages_by_session("s1").await.unwrap();
        let expected: u64 = all_messages.iter().map(|m| m.token_count).sum();
        assert_eq!(analysis.conversation_total, expected);
    }

    #[tokio::test]
    async fn ownership_mismatch_is_not_found() {
        let orchestrator = orchestrator(vec![]);
        let result = orchestrator
            .process_user_message("s1", "someone-else", "What is AI?", false)
            .await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let orchestrator = orchestrator(vec![]);
        let result = orchestrator
            .process_user_message("does-not-exist", "u1", "What is AI?", false)
            .await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }
}
