//! Cosine-similarity evaluation mode (spec §4.8), grounded on
//! `original_source/backend/rag_solution/evaluation/evaluator.py::evaluate_cosine`.

use std::sync::Arc;

use async_trait::async_trait;
use ragcore_types::{Evaluator, EvaluationReport, Llm, ScoredChunk};

/// Embeds query/answer/chunk text and scores relevance, coherence, and
/// faithfulness as mean/pairwise cosine similarities.
///
/// Per spec §9's open question on mixed `None`-embedding semantics: a
/// chunk missing a precomputed embedding is embedded on demand rather than
/// treated as a zero-vector; if, after that, no chunk embedding is
/// available at all, the affected component is `0.0` rather than skipped
/// entirely (there is always at least the query/answer pair to score).
pub struct CosineEvaluator {
    llm: Arc<dyn Llm>,
}

impl CosineEvaluator {
    #[must_use]
    pub const fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Evaluator for CosineEvaluator {
    async fn evaluate(&self, query: &str, answer: &str, chunks: &[ScoredChunk]) -> EvaluationReport {
        if chunks.is_empty() {
            return empty_report("No documents found".to_string());
        }

        let mut texts_to_embed = vec![query.to_string(), answer.to_string()];
        let mut missing_indices = Vec::new();
        for (index, scored) in chunks.iter().enumerate() {
            if scored.chunk().embedding.is_none() {
                missing_indices.push(index);
                texts_to_embed.push(scored.chunk().text.clone());
            }
        }

        let embeddings = match self.llm.embed(&texts_to_embed).await {
            Ok(embeddings) => embeddings,
            Err(err) => return empty_report(format!("embedding failed: {err}")),
        };
        if embeddings.len() < 2 {
            return empty_report("embedding provider returned too few vectors".to_string());
        }

        let query_embedding = &embeddings[0];
        let answer_embedding = &embeddings[1];

        let mut chunk_embeddings: Vec<Option<&Vec<f32>>> = chunks
            .iter()
            .map(|scored| scored.chunk().embedding.as_ref())
            .collect();
        for (offset, index) in missing_indices.iter().enumerate() {
            chunk_embeddings[*index] = embeddings.get(2 + offset);
        }
        let valid_chunk_embeddings: Vec<&Vec<f32>> = chunk_embeddings.into_iter().flatten().collect();

        let relevance = mean_cosine(query_embedding, &valid_chunk_embeddings);
        let coherence = cosine_similarity(query_embedding, answer_embedding).clamp(0.0, 1.0);
        let faithfulness = mean_cosine(answer_embedding, &valid_chunk_embeddings);
        let overall = (relevance + coherence + faithfulness) / 3.0;

        EvaluationReport {
            relevance: Some(relevance),
            coherence: Some(coherence),
            faithfulness: Some(faithfulness),
            overall: Some(overall),
            judge_scores: std::collections::HashMap::new(),
            error: None,
        }
    }
}

fn empty_report(error: String) -> EvaluationReport {
    EvaluationReport {
        relevance: None,
        coherence: None,
        faithfulness: None,
        overall: None,
        judge_scores: std::collections::HashMap::new(),
        error: Some(error),
    }
}

/// Mean cosine similarity of `target` against every vector in `others`,
/// clamped to `[0, 1]`; `0.0` when `others` is empty (spec §4.8, §8
/// boundary behavior "empty inputs ⇒ 0").
fn mean_cosine(target: &[f32], others: &[&Vec<f32>]) -> f32 {
    if others.is_empty() {
        return 0.0;
    }
    let sum: f32 = others.iter().map(|other| cosine_similarity(target, other)).sum();
    (sum / others.len() as f32).clamp(0.0, 1.0)
}

/// `0.0` when either vector has zero magnitude, rather than `NaN`.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use ragcore_types::{CoreError, DocumentChunk, GenerationOutput, GenerationParams, PromptInput, PromptTemplate, Result};
    use std::collections::HashMap;

    use super::*;

    struct StubLlm {
        vectors: HashMap<String, Vec<f32>>,
    }

    #[async_trait]
    impl Llm for StubLlm {
        async fn generate(
            &self,
            _user_id: &str,
            _prompt: PromptInput,
            _template: Option<&PromptTemplate>,
            _variables: Option<&HashMap<String, String>>,
            _params: Option<&GenerationParams>,
        ) -> Result<GenerationOutput> {
            unimplemented!("not used in cosine evaluator tests")
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            texts
                .iter()
                .map(|text| {
                    self.vectors
                        .get(text)
                        .cloned()
                        .ok_or_else(|| CoreError::llm_provider("stub", "embed", format!("no vector for {text}")))
                })
                .collect()
        }

        async fn tokenize(&self, text: &str) -> Result<usize> {
            Ok(text.split_whitespace().count())
        }

        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    fn chunk(text: &str) -> ScoredChunk {
        ScoredChunk::new(DocumentChunk::new(text, text), 0.5)
    }

    #[tokio::test]
    async fn identical_vectors_score_perfect_similarity() {
        let mut vectors = HashMap::new();
        vectors.insert("query".to_string(), vec![1.0, 0.0]);
        vectors.insert("answer".to_string(), vec![1.0, 0.0]);
        vectors.insert("doc".to_string(), vec![1.0, 0.0]);
        let evaluator = CosineEvaluator::new(Arc::new(StubLlm { vectors }));

        let report = evaluator.evaluate("query", "answer", &[chunk("doc")]).await;

        assert!((report.relevance.unwrap() - 1.0).abs() < 1e-5);
        assert!((report.coherence.unwrap() - 1.0).abs() < 1e-5);
        assert!((report.faithfulness.unwrap() - 1.0).abs() < 1e-5);
        assert!((report.overall.unwrap() - 1.0).abs() < 1e-5);
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn empty_chunks_short_circuit_without_embedding_calls() {
        let evaluator = CosineEvaluator::new(Arc::new(StubLlm { vectors: HashMap::new() }));

        let report = evaluator.evaluate("query", "answer", &[]).await;

        assert_eq!(report.error.as_deref(), Some("No documents found"));
        assert!(report.relevance.is_none());
        assert!(report.coherence.is_none());
        assert!(report.faithfulness.is_none());
        assert!(report.overall.is_none());
    }

    #[tokio::test]
    async fn embedding_failure_is_captured_not_panicked() {
        let mut vectors = HashMap::new();
        vectors.insert("query".to_string(), vec![1.0, 0.0]);
        vectors.insert("answer".to_string(), vec![0.0, 1.0]);
        let evaluator = CosineEvaluator::new(Arc::new(StubLlm { vectors }));
        let report = evaluator.evaluate("query", "answer", &[chunk("doc")]).await;
        assert!(report.error.is_some());
        assert!(report.relevance.is_none());
    }

    #[test]
    fn zero_vector_similarity_is_zero_not_nan() {
        let similarity = cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]);
        assert_eq!(similarity, 0.0);
    }
}
