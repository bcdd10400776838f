//! Search request/response and pipeline-internal context types (spec §3).

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunk::ScoredChunk;
use crate::error::{CoreError, Result};

/// Well-known, named fields for config metadata the source system carried
/// as a free-form dict, per the REDESIGN FLAGS note. `extra` remains for
/// genuinely free-form keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfigMetadata {
    pub conversation_aware: bool,
    pub conversation_context: Option<String>,
    pub entities: Vec<String>,
    pub cot_enabled: bool,
    pub top_k_override: Option<u32>,
    pub score_scale: Option<u32>,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Maximum accepted question length, absent a narrower pipeline/tenant
/// override (spec §6, "Operational" environment contract).
pub const DEFAULT_MAX_QUESTION_LENGTH: usize = 4000;

/// The public search entry point's input (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchInput {
    pub question: String,
    pub collection_id: String,
    pub pipeline_id: Option<String>,
    pub user_id: String,
    pub config_metadata: Option<SearchConfigMetadata>,
}

impl SearchInput {
    /// Validates the question: non-empty after trimming, and within
    /// `max_length`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the question is empty/whitespace
    /// or exceeds `max_length`.
    pub fn validate(&self, max_length: usize) -> Result<()> {
        let trimmed = self.question.trim();
        if trimmed.is_empty() {
            return Err(CoreError::validation("question must not be empty"));
        }
        if trimmed.chars().count() > max_length {
            return Err(CoreError::validation(format!(
                "question exceeds max length of {max_length} characters"
            )));
        }
        Ok(())
    }
}

/// Per-document display metadata assembled from retrieved chunks (spec
/// §4.6 step 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document_id: String,
    pub document_name: String,
    pub best_score: f32,
    pub page_numbers: Vec<u32>,
}

/// A chain-of-thought reasoning step (spec §4.5, stage 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub step_index: u32,
    pub description: String,
    pub intermediate_answer: String,
    pub confidence: f32,
    pub tokens_used: u32,
}

/// Aggregated chain-of-thought output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoTOutput {
    pub steps: Vec<ReasoningStep>,
    pub aggregated_confidence: f32,
    pub total_execution_time: Duration,
}

/// Evaluation report produced by C8 (cosine or LLM-judge mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub relevance: Option<f32>,
    pub coherence: Option<f32>,
    pub faithfulness: Option<f32>,
    pub overall: Option<f32>,
    pub judge_scores: HashMap<String, String>,
    pub error: Option<String>,
}

/// Per-turn token accounting record (spec §3, §4.7).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenAnalysis {
    pub query_tokens: u64,
    pub response_tokens: u64,
    pub system_tokens: u64,
    pub total_this_turn: u64,
    pub conversation_total: u64,
}

/// Severity/kind of a token-budget warning (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenWarningKind {
    ApproachingLimit,
    AtLimit,
    OverLimit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenWarning {
    pub kind: TokenWarningKind,
    pub severity: String,
    pub percentage: f32,
    pub current_tokens: u64,
    pub limit_tokens: u64,
    pub message: String,
    pub suggested_action: String,
}

/// Per-stage metadata captured by the executor (spec §4.5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageMetadata {
    pub duration: Option<Duration>,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The mutable, per-request object threaded through pipeline stages (spec
/// §3). Created at pipeline start, mutated by each stage, consumed by the
/// caller. Ownership is exclusive to the executing pipeline; stages borrow
/// it for the duration of their own invocation only.
#[derive(Debug, Clone)]
pub struct SearchContext {
    pub input: SearchInput,
    pub resolved_user_id: String,
    pub resolved_collection_id: String,
    pub resolved_pipeline_id: Option<String>,
    pub vector_collection_name: Option<String>,
    pub rewritten_query: Option<String>,
    pub query_results: Vec<ScoredChunk>,
    pub document_metadata: Vec<DocumentMetadata>,
    pub generated_answer: Option<String>,
    pub evaluation: Option<EvaluationReport>,
    pub cot_output: Option<CoTOutput>,
    pub token_warning: Option<TokenWarning>,
    pub execution_time: Option<Duration>,
    pub stage_metadata: HashMap<String, StageMetadata>,
    pub errors: Vec<String>,
    /// Set by the executor when a stage returns a fatal outcome (or the
    /// pipeline deadline elapses), so the caller can map the abort to the
    /// right [`CoreError`] kind instead of always reporting `Configuration`
    /// (spec §7).
    pub fatal_error: Option<CoreError>,
}

impl SearchContext {
    #[must_use]
    pub fn new(input: SearchInput) -> Self {
        let resolved_user_id = input.user_id.clone();
        let resolved_collection_id = input.collection_id.clone();
        let resolved_pipeline_id = input.pipeline_id.clone();
        Self {
            input,
            resolved_user_id,
            resolved_collection_id,
            resolved_pipeline_id,
            vector_collection_name: None,
            rewritten_query: None,
            query_results: Vec::new(),
            document_metadata: Vec::new(),
            generated_answer: None,
            evaluation: None,
            cot_output: None,
            token_warning: None,
            execution_time: None,
            stage_metadata: HashMap::new(),
            errors: Vec::new(),
            fatal_error: None,
        }
    }

    /// Records a non-fatal error surfaced by a stage, keeping execution
    /// going (spec §4.5, §7 propagation policy).
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }
}

/// The final response from a search request (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutput {
    pub answer: String,
    pub documents: Vec<DocumentMetadata>,
    pub query_results: Vec<ScoredChunk>,
    pub rewritten_query: String,
    pub evaluation: Option<EvaluationReport>,
    pub execution_time: Duration,
    pub cot_output: Option<CoTOutput>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub token_warning: Option<TokenWarning>,
}

/// Fixed apology answer used when retrieval returns no chunks (spec §4.5
/// step 6, §8 boundary behavior).
pub const NO_DOCUMENTS_FOUND_ANSWER: &str =
    "I couldn't find any relevant documents to answer your question.";
