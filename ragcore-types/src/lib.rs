//! Capability interfaces, data model, and error taxonomy shared by every
//! ragcore crate.
//!
//! This crate has no knowledge of pipelines, reranking, or health checks —
//! it defines the nouns (`DocumentChunk`, `SearchInput`, `PipelineConfig`,
//! ...) and the narrow capability traits (`Llm`, `VectorStore`,
//! `DocumentStore`, `MetricsSink`) that the rest of the workspace is built
//! against.

pub mod capability;
pub mod chunk;
pub mod collection;
pub mod conversation;
pub mod error;
pub mod retry;
pub mod search;
pub mod template;

pub use capability::{
    DocumentStore, EmbeddedChunk, Evaluator, FileRecord, GenerationOutput, GenerationParams, Llm,
    MetadataFilter, MetricEvent, MetricsSink, PromptInput, VectorCollectionConfig, VectorMetric,
    VectorQuery, VectorStore,
};
pub use chunk::{ChunkMetadata, DocumentChunk, ScoredChunk, SourceKind};
pub use collection::{
    ChunkingStrategy, Collection, CollectionStatus, ConfigMap, ContextStrategy, PipelineConfig,
    RetrieverKind,
};
pub use conversation::{
    ConversationMessage, ConversationSession, MessageKind, MessageMetadata, MessageRole,
    SessionStatus,
};
pub use error::{CoreError, Result};
pub use retry::{RetryPolicy, RetryStrategy};
pub use search::{
    CoTOutput, DocumentMetadata, EvaluationReport, ReasoningStep, SearchConfigMetadata,
    SearchContext, SearchInput, SearchOutput, StageMetadata, TokenAnalysis, TokenWarning,
    TokenWarningKind, DEFAULT_MAX_QUESTION_LENGTH, NO_DOCUMENTS_FOUND_ANSWER,
};
pub use template::{PromptTemplate, TemplateKind};
