//! The pipeline stages, executor, and search-service entry point (C5, C6,
//! spec §4.5, §4.6).
//!
//! Built on `ragcore-types`'s capability traits and `ragcore-rerank` /
//! `ragcore-enrich`'s pluggable strategies; owns none of them itself.

pub mod executor;
pub mod service;
pub mod stage;
pub mod stages;

pub use executor::{Pipeline, PipelineBuildError, PipelineBuilder};
pub use service::{clean_answer, SearchService};
pub use stage::{Stage, StageName, StageOutcome};
pub use stages::{
    strip_boolean_operators, GenerationStage, IdentityRewriter, NoopReasoner,
    PipelineResolutionStage, PipelineResolver, QueryEnhancementStage, QueryRewriter,
    ReasoningEngine, ReasoningStage, RerankingStage, ResolvedPipeline, RetrievalStage,
};
