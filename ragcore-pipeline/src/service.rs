//! The public search entry point (C6, spec §4.6), grounded on
//! `original_source/backend/rag_solution/services/pipeline_service.py::execute_pipeline`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use ragcore_enrich::{Enricher, EnrichmentConfig};
use ragcore_types::{
    CoreError, DocumentMetadata, DocumentStore, Evaluator, Result, SearchInput, SearchOutput,
    DEFAULT_MAX_QUESTION_LENGTH,
};

use crate::executor::Pipeline;

/// Public search entry point. Owns the assembled [`Pipeline`] plus the
/// services C6 consults after the pipeline returns: document display
/// metadata, optional evaluation, optional enrichment.
pub struct SearchService {
    pipeline: Pipeline,
    documents: Arc<dyn DocumentStore>,
    evaluator: Option<Arc<dyn Evaluator>>,
    enricher: Option<Arc<Enricher>>,
    enrichment_config: EnrichmentConfig,
    max_question_length: usize,
    deadline: Duration,
}

impl SearchService {
    #[must_use]
    pub fn new(pipeline: Pipeline, documents: Arc<dyn DocumentStore>, deadline: Duration) -> Self {
        Self {
            pipeline,
            documents,
            evaluator: None,
            enricher: None,
            enrichment_config: EnrichmentConfig::default(),
            max_question_length: DEFAULT_MAX_QUESTION_LENGTH,
            deadline,
        }
    }

    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    #[must_use]
    pub fn with_enrichment(mut self, enricher: Arc<Enricher>, config: EnrichmentConfig) -> Self {
        self.enricher = Some(enricher);
        self.enrichment_config = config;
        self
    }

    /// Runs the full search pipeline and assembles the final response.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for a malformed question. If the
    /// pipeline aborted before producing an answer, returns the typed fatal
    /// error recorded by the stage that stopped it — [`CoreError::NotFound`]
    /// for a missing or inaccessible entity, [`CoreError::Configuration`]
    /// for an internal wiring problem (including a retrieved chunk
    /// referencing a document absent from the collection's file set),
    /// [`CoreError::LlmProvider`]/[`CoreError::Storage`] for an upstream
    /// failure, or [`CoreError::Cancellation`] if the deadline elapsed.
    pub async fn search(&self, input: SearchInput) -> Result<SearchOutput> {
        input.validate(self.max_question_length)?;

        let ctx = ragcore_types::SearchContext::new(input);
        let ctx = self.pipeline.execute(ctx, self.deadline).await;

        let Some(answer) = ctx.generated_answer else {
            return Err(ctx.fatal_error.unwrap_or_else(|| {
                CoreError::configuration(format!(
                    "pipeline did not produce an answer: {}",
                    ctx.errors.join("; ")
                ))
            }));
        };

        let documents = self
            .assemble_documents(&ctx.resolved_collection_id, &ctx.query_results)
            .await?;

        let evaluation = if let Some(evaluator) = &self.evaluator {
            let query = ctx.rewritten_query.clone().unwrap_or_default();
            Some(evaluator.evaluate(&query, &answer, &ctx.query_results).await)
        } else {
            None
        };

        let mut output = SearchOutput {
            answer: clean_answer(&answer),
            documents,
            query_results: ctx.query_results,
            rewritten_query: ctx.rewritten_query.unwrap_or_default(),
            evaluation,
            execution_time: ctx.execution_time.unwrap_or_default(),
            cot_output: ctx.cot_output,
            metadata: serde_json::Map::new(),
            token_warning: ctx.token_warning,
        };

        if let Some(enricher) = &self.enricher {
            output = enricher.enrich(output, &self.enrichment_config).await;
        }

        Ok(output)
    }

    /// Groups retrieved chunks by their owning document id and looks up each
    /// document's display metadata, per spec §4.6 step 5.
    async fn assemble_documents(
        &self,
        collection_id: &str,
        chunks: &[ragcore_types::ScoredChunk],
    ) -> Result<Vec<DocumentMetadata>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let files = self.documents.files_by_collection(collection_id).await?;
        let files_by_id: HashMap<&str, &ragcore_types::FileRecord> =
            files.iter().map(|f| (f.document_id.as_str(), f)).collect();

        let mut best_score: HashMap<String, f32> = HashMap::new();
        let mut pages: HashMap<String, HashSet<u32>> = HashMap::new();

        for scored in chunks {
            let Some(document_id) = scored
                .chunk()
                .metadata
                .as_ref()
                .and_then(|metadata| metadata.document_id.clone())
            else {
                continue;
            };
            let entry = best_score.entry(document_id.clone()).or_insert(f32::MIN);
            if scored.score() > *entry {
                *entry = scored.score();
            }
            if let Some(page) = scored.chunk().metadata.as_ref().and_then(|m| m.page_number) {
                pages.entry(document_id).or_default().insert(page);
            }
        }

        let mut documents = Vec::with_capacity(best_score.len());
        for (document_id, score) in best_score {
            let Some(file) = files_by_id.get(document_id.as_str()) else {
                return Err(CoreError::configuration(format!(
                    "document {document_id} referenced by a retrieved chunk is not in collection {collection_id}"
                )));
            };
            let mut page_numbers: Vec<u32> = pages.get(&document_id).cloned().unwrap_or_default().into_iter().collect();
            page_numbers.sort_unstable();
            documents.push(DocumentMetadata {
                document_id,
                document_name: file.display_name.clone(),
                best_score: score,
                page_numbers,
            });
        }
        documents.sort_by(|a, b| b.best_score.partial_cmp(&a.best_score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(documents)
    }
}

/// Strips stray boolean connectors and collapses consecutive
/// case-insensitive duplicate tokens from a generated answer, per spec
/// §4.6 step 6. Punctuation attached to a token is preserved.
#[must_use]
pub fn clean_answer(answer: &str) -> String {
    let without_connectors = crate::stages::strip_boolean_operators(answer);
    let mut cleaned: Vec<&str> = Vec::new();
    for token in without_connectors.split_whitespace() {
        let is_duplicate = cleaned
            .last()
            .is_some_and(|prev| prev.eq_ignore_ascii_case(token));
        if !is_duplicate {
            cleaned.push(token);
        }
    }
    cleaned.join(" ")
}
