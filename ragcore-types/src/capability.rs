//! Capability interfaces (C1, spec §4.1).
//!
//! These are narrow contracts the core consumes; any implementation
//! satisfying the contract is interchangeable. Concrete providers
//! (embeddings, generation, tokenization, vector stores, document stores)
//! are out of scope for this crate — only the trait boundary is owned here,
//! mirroring `llmspell-providers::abstraction::ProviderInstance`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chunk::{DocumentChunk, ScoredChunk};
use crate::error::Result;
use crate::search::EvaluationReport;
use crate::template::PromptTemplate;

/// Generation parameters threaded into an [`Llm::generate`] call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub max_new_tokens: Option<u32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub repetition_penalty: Option<f32>,
}

/// One or many prompts, mirroring the source system's batched
/// `generate_text(prompt: str | list[str])` contract.
#[derive(Debug, Clone)]
pub enum PromptInput {
    Single(String),
    Batch(Vec<String>),
}

/// One or many generated strings, in the same shape as the input.
#[derive(Debug, Clone)]
pub enum GenerationOutput {
    Single(String),
    Batch(Vec<String>),
}

impl GenerationOutput {
    /// Flattens the output to a `Vec<String>` regardless of shape.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(s) => vec![s],
            Self::Batch(items) => items,
        }
    }
}

/// The LLM capability: generation, embedding, and tokenization.
///
/// `generate` is deterministic with respect to `params` (same prompt, same
/// params, same provider state ⇒ same output is expected by callers that
/// cache on that key, though the trait itself makes no caching guarantee).
#[async_trait]
pub trait Llm: Send + Sync {
    /// Generates one completion per input prompt, in order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CoreError::LlmProvider`] on upstream failure.
    async fn generate(
        &self,
        user_id: &str,
        prompt: PromptInput,
        template: Option<&PromptTemplate>,
        variables: Option<&std::collections::HashMap<String, String>>,
        params: Option<&GenerationParams>,
    ) -> Result<GenerationOutput>;

    /// Embeds a batch of texts; the returned dimension is fixed per
    /// provider/model.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CoreError::LlmProvider`] on upstream failure.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Counts tokens in `text`, used for token accounting (spec §4.7).
    ///
    /// Implementations that cannot tokenize natively must fall back to a
    /// word-based estimator returning at least `ceil(words * 1.3)`, per
    /// spec §4.1; [`word_based_token_estimate`] implements that fallback.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CoreError::LlmProvider`] on upstream failure.
    async fn tokenize(&self, text: &str) -> Result<usize>;

    /// Provider name, used in error reporting.
    fn provider_name(&self) -> &str;
}

/// Word-based token estimator used as the tokenizer-of-last-resort, per
/// spec §4.1: returns at least `ceil(words * 1.3)`.
#[must_use]
pub fn word_based_token_estimate(text: &str) -> usize {
    let words = text.split_whitespace().count();
    ((words as f64) * 1.3).ceil() as usize
}

/// Vector metric a collection is indexed with; native score ranges differ,
/// so `VectorStore::retrieve` implementations must normalize to
/// "higher is better" before returning (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorMetric {
    L2,
    Ip,
    Cosine,
    Hamming,
    Jaccard,
}

/// Either a text query (embedded by the store) or a precomputed vector.
#[derive(Debug, Clone)]
pub enum VectorQuery {
    Text(String),
    Vector(Vec<f32>),
}

/// A chunk plus its embedding, ready for upsert.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

/// Metadata-filter predicate, expressed as a small key/value equality set;
/// richer filter languages are a capability-implementation detail.
pub type MetadataFilter = std::collections::HashMap<String, serde_json::Value>;

/// Configuration for creating a vector-store collection.
#[derive(Debug, Clone)]
pub struct VectorCollectionConfig {
    pub dimension: usize,
    pub metric: VectorMetric,
}

/// The vector-store capability: collection lifecycle, upsert, retrieve.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`crate::error::CoreError::Storage`] on backend failure.
    async fn create_collection(&self, name: &str, config: VectorCollectionConfig) -> Result<()>;

    /// # Errors
    ///
    /// Returns [`crate::error::CoreError::Storage`] on backend failure.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// # Errors
    ///
    /// Returns [`crate::error::CoreError::Storage`] on backend failure.
    async fn upsert(&self, name: &str, chunks: Vec<EmbeddedChunk>) -> Result<()>;

    /// Retrieves the `top_k` chunks most relevant to `query`, sorted by
    /// descending (already-normalized) score.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CoreError::Storage`] on backend failure.
    async fn retrieve(
        &self,
        query: VectorQuery,
        name: &str,
        top_k: usize,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<ScoredChunk>>;
}

/// Display metadata about a file backing a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub document_id: String,
    pub display_name: String,
    pub page_count: u32,
    pub chunk_count: u32,
}

/// The document-store capability: lookup of display metadata for a
/// collection's files.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`crate::error::CoreError::Storage`] on backend failure.
    async fn files_by_collection(&self, collection_id: &str) -> Result<Vec<FileRecord>>;
}

/// A single structured metrics event. The pipeline never blocks on
/// metrics: [`MetricsSink::emit`] must not be awaited on the request's
/// critical path by callers (enforced by convention, not the type system,
/// since the trait itself is necessarily async to allow buffered senders).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricEvent {
    pub name: String,
    pub value: f64,
    pub tags: std::collections::HashMap<String, String>,
}

/// The metrics capability.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn emit(&self, event: MetricEvent);
}

/// The evaluator capability (C8, spec §4.8): scores a generated answer
/// against its supporting chunks, in either cosine or LLM-as-judge mode.
/// Never fails the caller — per-judge or embedding failures are captured
/// into [`EvaluationReport::error`] rather than propagated.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, query: &str, answer: &str, chunks: &[ScoredChunk]) -> EvaluationReport;
}
