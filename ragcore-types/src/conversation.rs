//! Conversation session and message entities (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::search::TokenAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    pub owner_user_id: String,
    pub collection_id: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Question,
    Answer,
    Note,
}

/// Structured metadata carried by an assistant message (spec §3, §4.7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub sources: Vec<serde_json::Value>,
    pub cot_trace: Option<serde_json::Value>,
    pub token_analysis: Option<TokenAnalysis>,
}

/// A single message within a [`ConversationSession`].
///
/// Messages are ordered by `created_at` within a session; an assistant
/// message's "triggering" user message is identified positionally (the
/// immediately preceding message in creation order), not by an explicit
/// foreign key, per spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub session_id: String,
    pub role: MessageRole,
    pub kind: MessageKind,
    pub content: String,
    pub token_count: u64,
    pub execution_time_ms: u64,
    pub metadata: MessageMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
