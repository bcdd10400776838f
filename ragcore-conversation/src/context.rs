//! Conversational context building and question enhancement (spec §4.7
//! steps 3-4), grounded on
//! `original_source/tests/unit/services/test_message_processing_orchestrator.py`
//! (`ConversationContext`, `ContextMetadata`, `build_context_from_messages`,
//! `enhance_question_with_context`).

use async_trait::async_trait;
use ragcore_types::ConversationMessage;

/// A serialized summary of recent session messages plus extracted
/// entities, passed to question enhancement and on into the search stage
/// via [`ragcore_types::SearchConfigMetadata`] (spec glossary,
/// "Context window (conversational)").
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    pub context_window: String,
    pub relevant_documents: Vec<String>,
    pub extracted_entities: Vec<String>,
    pub conversation_topics: Vec<String>,
    pub message_count: usize,
    pub context_length: usize,
}

/// Builds a [`ConversationContext`] from session history and enhances a
/// question with it. Entity/topic extraction is an external NLP capability
/// (spec §1 Non-goals scope document ingestion and NLP pipelines out of
/// this core); implementations of this trait are the seam for it.
#[async_trait]
pub trait ContextService: Send + Sync {
    async fn build_context(&self, messages: &[ConversationMessage]) -> ConversationContext;

    /// Enhances `question` using `context`. A pure string transformation:
    /// implementations may return `question` unchanged (spec §4.7 step 4).
    async fn enhance_question(&self, question: &str, context: &ConversationContext) -> String;
}

/// Joins the most recent `window_size` messages into a flat transcript and
/// returns the question unchanged; entity/topic extraction is left empty.
/// Sufficient as a default and as the seam a richer NLP-backed
/// implementation replaces.
pub struct TranscriptContextService {
    window_size: usize,
}

impl TranscriptContextService {
    #[must_use]
    pub const fn new(window_size: usize) -> Self {
        Self { window_size }
    }
}

impl Default for TranscriptContextService {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl ContextService for TranscriptContextService {
    async fn build_context(&self, messages: &[ConversationMessage]) -> ConversationContext {
        let recent = messages
            .iter()
            .rev()
            .take(self.window_size)
            .collect::<Vec<_>>()
            .into_iter()
            .rev();

        let mut lines = Vec::new();
        for message in recent {
            let role = match message.role {
                ragcore_types::MessageRole::User => "User",
                ragcore_types::MessageRole::Assistant => "Assistant",
                ragcore_types::MessageRole::System => "System",
            };
            lines.push(format!("{role}: {}", message.content));
        }
        let context_window = lines.join("\n");

        ConversationContext {
            context_length: context_window.chars().count(),
            context_window,
            relevant_documents: Vec::new(),
            extracted_entities: Vec::new(),
            conversation_topics: Vec::new(),
            message_count: messages.len(),
        }
    }

    async fn enhance_question(&self, question: &str, _context: &ConversationContext) -> String {
        question.to_string()
    }
}
