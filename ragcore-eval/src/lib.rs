//! Answer-quality scoring over (question, answer, context) (C8, spec §4.8).
//!
//! Two interchangeable [`ragcore_types::Evaluator`] implementations: cosine
//! similarity over embeddings ([`CosineEvaluator`]) and LLM-as-judge
//! ([`LlmJudgeEvaluator`]). Neither ever fails its caller — embedding or
//! judge failures are captured into [`ragcore_types::EvaluationReport::error`].

mod cosine;
mod llm_judge;

pub use cosine::CosineEvaluator;
pub use llm_judge::LlmJudgeEvaluator;
