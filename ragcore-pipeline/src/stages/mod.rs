//! Concrete stage implementations (spec §4.5), one module per stage.

mod generation;
mod query_enhancement;
mod reasoning;
mod reranking;
mod resolution;
mod retrieval;

pub use generation::GenerationStage;
pub use query_enhancement::{strip_boolean_operators, IdentityRewriter, QueryEnhancementStage, QueryRewriter};
pub use reasoning::{NoopReasoner, ReasoningEngine, ReasoningStage};
pub use reranking::RerankingStage;
pub use resolution::{PipelineResolutionStage, PipelineResolver, ResolvedPipeline};
pub use retrieval::RetrievalStage;
