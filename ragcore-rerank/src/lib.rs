//! Pluggable reranking strategies for retrieved chunks (C3, spec §4.3).

mod cross_encoder;
mod llm_judge;
mod passthrough;
mod score_parse;
mod strategy;

pub use cross_encoder::{CrossEncoder, CrossEncoderReranker};
pub use llm_judge::LlmJudgeReranker;
pub use passthrough::PassthroughReranker;
pub use score_parse::{extract_normalized_score, FALLBACK_SCORE};
pub use strategy::Reranker;
