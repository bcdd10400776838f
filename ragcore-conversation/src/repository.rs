//! Session/message persistence seam (spec §3, §4.7), grounded on
//! `original_source/tests/unit/services/test_message_processing_orchestrator.py`
//! (`conversation_repository` fixture: `get_session_by_id`,
//! `get_messages_by_session`, `create_message`).
//!
//! Persistence backends are out of scope (spec §1 Non-goals); this trait is
//! the seam a relational-store implementation plugs into. Messages within a
//! session are ordered by creation time (spec §3 invariant); implementations
//! must return them in that order.

use async_trait::async_trait;
use ragcore_types::{ConversationMessage, ConversationSession, MessageKind, MessageMetadata, MessageRole, Result};

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ragcore_types::CoreError::NotFound`] if the session does
    /// not exist.
    async fn get_session(&self, session_id: &str) -> Result<ConversationSession>;

    /// Returns the session's messages in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`ragcore_types::CoreError::NotFound`] if the session does
    /// not exist.
    async fn messages_by_session(&self, session_id: &str) -> Result<Vec<ConversationMessage>>;

    /// Persists a new message and returns it with its assigned id and
    /// timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`ragcore_types::CoreError::Storage`] on backend failure.
    #[allow(clippy::too_many_arguments)]
    async fn create_message(
        &self,
        session_id: &str,
        role: MessageRole,
        kind: MessageKind,
        content: &str,
        token_count: u64,
        execution_time_ms: u64,
        metadata: MessageMetadata,
    ) -> Result<ConversationMessage>;
}
