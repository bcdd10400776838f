//! Query-enhancement stage (spec §4.5 stage 2), grounded on
//! `original_source/backend/rag_solution/query_rewriting/query_rewriter.py`
//! and `PipelineService._prepare_query`.

use std::sync::LazyLock;

use async_trait::async_trait;
use ragcore_types::SearchContext;
use regex::Regex;

use crate::stage::{Stage, StageName, StageOutcome};

static BOOLEAN_OPERATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(AND|OR)\s+").expect("valid regex"));
static PAREN_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[()]").expect("valid regex"));

/// Strips boolean-search operators and parentheses a naive user query might
/// contain, mirroring `PipelineService._prepare_query`.
#[must_use]
pub fn strip_boolean_operators(query: &str) -> String {
    let without_operators = BOOLEAN_OPERATOR_PATTERN.replace_all(query, " ");
    PAREN_PATTERN.replace_all(&without_operators, "").trim().to_string()
}

/// Rewrites a cleaned query, optionally using conversational context, before
/// retrieval. A concrete rewriter (e.g. an LLM-backed paraphraser) is a
/// capability implementation detail; this trait is the seam.
pub trait QueryRewriter: Send + Sync {
    fn rewrite(&self, query: &str, context: Option<&str>) -> String;
}

/// Returns the cleaned query unchanged. The source system's own
/// `SimpleQueryRewriter` default behaves the same way when no
/// rewriting rule matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityRewriter;

impl QueryRewriter for IdentityRewriter {
    fn rewrite(&self, query: &str, _context: Option<&str>) -> String {
        query.to_string()
    }
}

/// Cleans the incoming question and runs it through a [`QueryRewriter`],
/// storing the result as [`SearchContext::rewritten_query`].
pub struct QueryEnhancementStage<R: QueryRewriter> {
    rewriter: R,
}

impl<R: QueryRewriter> QueryEnhancementStage<R> {
    pub const fn new(rewriter: R) -> Self {
        Self { rewriter }
    }
}

#[async_trait]
impl<R: QueryRewriter> Stage for QueryEnhancementStage<R> {
    fn name(&self) -> StageName {
        StageName::QueryEnhancement
    }

    async fn run(&self, ctx: &mut SearchContext) -> StageOutcome {
        let cleaned = strip_boolean_operators(&ctx.input.question);
        let context = ctx
            .input
            .config_metadata
            .as_ref()
            .and_then(|metadata| metadata.conversation_context.as_deref());
        ctx.rewritten_query = Some(self.rewriter.rewrite(&cleaned, context));
        StageOutcome::Ok
    }
}

#[cfg(test)]
mod tests {
    use ragcore_types::SearchInput;

    use super::*;

    fn ctx(question: &str) -> SearchContext {
        SearchContext::new(SearchInput {
            question: question.to_string(),
            collection_id: "c1".into(),
            pipeline_id: None,
            user_id: "u1".into(),
            config_metadata: None,
        })
    }

    #[test]
    fn strips_boolean_operators_and_parens() {
        assert_eq!(
            strip_boolean_operators("(cats AND dogs) OR birds"),
            "cats dogs birds"
        );
    }

    #[tokio::test]
    async fn identity_rewriter_keeps_cleaned_query() {
        let stage = QueryEnhancementStage::new(IdentityRewriter);
        let mut context = ctx("cats AND dogs");
        let outcome = stage.run(&mut context).await;
        assert!(matches!(outcome, StageOutcome::Ok));
        assert_eq!(context.rewritten_query.as_deref(), Some("cats dogs"));
    }
}
