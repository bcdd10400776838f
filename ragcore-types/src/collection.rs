//! Collection and pipeline-configuration entities (spec §3).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Lifecycle status of a [`Collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Created,
    Processing,
    Completed,
    Error,
}

/// A namespaced set of chunks served by the vector store under a generated
/// handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub display_name: String,
    pub is_private: bool,
    /// Generated as `collection_<opaque token>`; immutable for the life of
    /// the collection (spec §6, "Persisted state").
    pub vector_db_name: String,
    pub status: CollectionStatus,
    pub owner_user_id: String,
    pub authorized_user_ids: HashSet<String>,
}

impl Collection {
    /// Returns `true` if `user_id` may read this collection: the owner
    /// always may; for a private collection, only an explicitly authorized
    /// user may.
    #[must_use]
    pub fn is_accessible_to(&self, user_id: &str) -> bool {
        if !self.is_private {
            return true;
        }
        user_id == self.owner_user_id || self.authorized_user_ids.contains(user_id)
    }
}

/// Document chunking strategy a pipeline uses at ingestion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    Fixed,
    Semantic,
    Overlap,
    Paragraph,
}

/// Retrieval backend kind a pipeline queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrieverKind {
    Vector,
    Keyword,
    Hybrid,
}

/// Strategy for assembling retrieved chunks into an LLM context string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStrategy {
    Simple,
    Priority,
    Weighted,
}

/// Free-form, genuinely-extension-only configuration, kept as an overflow
/// map per the REDESIGN FLAGS note on dynamic config maps. Well-known keys
/// (retriever options, conversation context, `top_k`, `cot_enabled`, ...)
/// live as named fields elsewhere; this map is for provider/tool-specific
/// extras only.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Configuration for one pipeline: provider, chunking, retrieval, and
/// context-formatting choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub id: String,
    pub display_name: String,
    pub collection_id: Option<String>,
    pub llm_provider_id: String,
    pub chunking_strategy: ChunkingStrategy,
    pub embedding_model: String,
    pub retriever_kind: RetrieverKind,
    pub context_strategy: ContextStrategy,
    pub enable_logging: bool,
    pub max_context_tokens: u32,
    pub timeout_seconds: u32,
    pub config: ConfigMap,
    pub is_default: bool,
}

impl PipelineConfig {
    pub const MIN_CONTEXT_TOKENS: u32 = 128;
    pub const MAX_CONTEXT_TOKENS: u32 = 8192;
    pub const MIN_TIMEOUT_SECONDS: u32 = 1;
    pub const MAX_TIMEOUT_SECONDS: u32 = 300;

    /// Validates the invariants from spec §3:
    /// - `max_context_tokens` in `[128, 8192]`
    /// - `timeout_seconds` in `[1, 300]`
    /// - a default pipeline must carry a `collection_id` (Open Question,
    ///   resolved in DESIGN.md: collection-less pipelines can never be
    ///   default)
    /// - a hybrid retriever requires retriever-specific options in `config`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if any invariant is violated.
    pub fn validate(&self) -> Result<()> {
        if !(Self::MIN_CONTEXT_TOKENS..=Self::MAX_CONTEXT_TOKENS).contains(&self.max_context_tokens)
        {
            return Err(CoreError::validation(format!(
                "max_context_tokens must be within [{}, {}], got {}",
                Self::MIN_CONTEXT_TOKENS,
                Self::MAX_CONTEXT_TOKENS,
                self.max_context_tokens
            )));
        }
        if !(Self::MIN_TIMEOUT_SECONDS..=Self::MAX_TIMEOUT_SECONDS).contains(&self.timeout_seconds)
        {
            return Err(CoreError::validation(format!(
                "timeout_seconds must be within [{}, {}], got {}",
                Self::MIN_TIMEOUT_SECONDS,
                Self::MAX_TIMEOUT_SECONDS,
                self.timeout_seconds
            )));
        }
        if self.is_default && self.collection_id.is_none() {
            return Err(CoreError::validation(
                "a default pipeline must have a collection_id",
            ));
        }
        if self.retriever_kind == RetrieverKind::Hybrid && !self.has_hybrid_options() {
            return Err(CoreError::validation(
                "hybrid retriever requires retriever-specific options in config",
            ));
        }
        Ok(())
    }

    fn has_hybrid_options(&self) -> bool {
        self.config.contains_key("hybrid_weights") || self.config.contains_key("hybrid")
    }
}
