//! The enrichment entry point (C4, spec §4.4), grounded on
//! `original_source/backend/rag_solution/services/search_result_enricher.py::SearchResultEnricher`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ragcore_types::SearchOutput;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::EnrichmentConfig;
use crate::gateway::{EnrichmentGateway, ToolArguments, ToolOutcome};

const MAX_DOCUMENTS_PER_TOOL_CALL: usize = 5;
const MAX_CHUNKS_PER_TOOL_CALL: usize = 5;
const MAX_CHUNK_TEXT_CHARS: usize = 500;

struct ToolRunResult {
    tool_name: String,
    outcome: ToolOutcome,
    elapsed: Duration,
}

/// Enriches a completed [`SearchOutput`] with optional, non-blocking tool
/// results. Core search results (`answer`, `documents`, `query_results`) are
/// never modified — only `metadata` gains an `"mcp_enrichment"` entry (spec
/// §4.4: "metadata only, graceful degradation").
pub struct Enricher {
    gateway: Arc<dyn EnrichmentGateway>,
}

impl Enricher {
    #[must_use]
    pub const fn new(gateway: Arc<dyn EnrichmentGateway>) -> Self {
        Self { gateway }
    }

    /// Runs the configured enrichment tools over `output` and merges their
    /// results into `output.metadata`. On any failure this degrades to
    /// returning `output` with an error recorded in metadata — it never
    /// fails the caller, matching the Content Enricher pattern's contract
    /// that enrichment can never break search (spec §4.4, §7).
    pub async fn enrich(&self, output: SearchOutput, config: &EnrichmentConfig) -> SearchOutput {
        if !config.enabled {
            debug!("enrichment disabled, returning original output");
            return output;
        }

        let start = Instant::now();

        if !self.gateway.is_available().await {
            warn!("enrichment gateway unavailable, skipping enrichment");
            return add_basic_metadata(output, false, Some("enrichment gateway unavailable".into()), Duration::ZERO);
        }

        let tools_to_use = if config.tools.is_empty() {
            self.gateway.available_tools().await
        } else {
            config.tools.clone()
        };

        if tools_to_use.is_empty() {
            debug!("no enrichment tools available, returning original output");
            return output;
        }

        let arguments = build_arguments(&output);

        let results = if config.parallel {
            self.run_parallel(&tools_to_use, &arguments, config).await
        } else {
            self.run_sequential(&tools_to_use, &arguments, config).await
        };

        let elapsed = start.elapsed();
        let successful = results.iter().filter(|r| r.outcome.success).count();
        let failed = results.len() - successful;

        info!(
            tools_used = tools_to_use.len(),
            successful,
            failed,
            execution_time_ms = elapsed.as_millis() as u64,
            "enrichment completed"
        );

        merge_enrichments(output, results, elapsed)
    }

    async fn run_parallel(
        &self,
        tools: &[String],
        arguments: &ToolArguments,
        config: &EnrichmentConfig,
    ) -> Vec<ToolRunResult> {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        let futures = tools.iter().map(|tool_name| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore not closed");
                self.invoke_one(tool_name, arguments, config.timeout).await
            }
        });
        futures::future::join_all(futures).await
    }

    async fn run_sequential(
        &self,
        tools: &[String],
        arguments: &ToolArguments,
        config: &EnrichmentConfig,
    ) -> Vec<ToolRunResult> {
        let mut results = Vec::with_capacity(tools.len());
        for tool_name in tools {
            results.push(self.invoke_one(tool_name, arguments, config.timeout).await);
        }
        results
    }

    async fn invoke_one(&self, tool_name: &str, arguments: &ToolArguments, timeout: Duration) -> ToolRunResult {
        let start = Instant::now();
        let outcome = match tokio::time::timeout(timeout, self.gateway.invoke_tool(tool_name, arguments)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!(tool = tool_name, "enrichment tool timed out");
                ToolOutcome::failed("tool invocation timed out")
            }
        };
        ToolRunResult {
            tool_name: tool_name.to_string(),
            outcome,
            elapsed: start.elapsed(),
        }
    }
}

fn build_arguments(output: &SearchOutput) -> ToolArguments {
    let documents = output
        .documents
        .iter()
        .take(MAX_DOCUMENTS_PER_TOOL_CALL)
        .map(|doc| {
            json!({
                "document_id": doc.document_id,
                "document_name": doc.document_name,
                "best_score": doc.best_score,
            })
        })
        .collect();

    let chunks = output
        .query_results
        .iter()
        .take(MAX_CHUNKS_PER_TOOL_CALL)
        .map(|scored| {
            let text: String = scored.chunk().text.chars().take(MAX_CHUNK_TEXT_CHARS).collect();
            json!({ "text": text, "score": scored.score() })
        })
        .collect();

    ToolArguments {
        query: output.rewritten_query.clone(),
        answer: output.answer.clone(),
        documents,
        chunks,
    }
}

fn merge_enrichments(mut output: SearchOutput, results: Vec<ToolRunResult>, elapsed: Duration) -> SearchOutput {
    let tools: Vec<Value> = results
        .iter()
        .map(|r| {
            json!({
                "name": r.tool_name,
                "success": r.outcome.success,
                "data": r.outcome.data,
                "error": r.outcome.error,
                "execution_time_ms": r.elapsed.as_millis() as u64,
            })
        })
        .collect();

    let entry = json!({
        "enabled": true,
        "success": results.iter().any(|r| r.outcome.success),
        "execution_time_ms": elapsed.as_millis() as u64,
        "tools": tools,
    });

    output.metadata.insert("mcp_enrichment".to_string(), entry);
    output
}

fn add_basic_metadata(
    mut output: SearchOutput,
    success: bool,
    error: Option<String>,
    elapsed: Duration,
) -> SearchOutput {
    let entry = json!({
        "enabled": true,
        "success": success,
        "execution_time_ms": elapsed.as_millis() as u64,
        "error": error,
        "tools": Vec::<Value>::new(),
    });
    output.metadata.insert("mcp_enrichment".to_string(), entry);
    output
}
