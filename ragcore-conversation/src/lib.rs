//! Multi-turn conversation orchestration over the search pipeline (C7,
//! spec §4.7).
//!
//! Wraps [`ragcore_pipeline::SearchService`] rather than reimplementing any
//! of its stage logic: this crate's only job is the turn-level bookkeeping
//! around one search call — context building, question enhancement, token
//! accounting, and message persistence.

pub mod context;
pub mod orchestrator;
pub mod repository;
pub mod token_tracking;

pub use context::{ContextService, ConversationContext, TranscriptContextService};
pub use orchestrator::{ConversationOrchestrator, ProcessedTurn};
pub use repository::ConversationRepository;
pub use token_tracking::{ThresholdTokenTrackingService, TokenTrackingService};
