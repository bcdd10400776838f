//! LLM-as-judge evaluation mode (spec §4.8), grounded on
//! `original_source/backend/rag_solution/evaluation/evaluator.py::evaluate`
//! (`FaithfulnessEvaluator` / `AnswerRelevanceEvaluator` /
//! `ContextRelevanceEvaluator`, referenced from
//! `llm_as_judge_evals` but not present in the retrieved source set).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ragcore_rerank::extract_normalized_score;
use ragcore_types::{
    CoreError, EvaluationReport, Evaluator, Llm, PromptInput, PromptTemplate, ScoredChunk,
};
use tracing::warn;

/// Judge names used as `judge_scores` keys and in error logging.
const FAITHFULNESS: &str = "faithfulness";
const ANSWER_RELEVANCE: &str = "answer_relevance";
const CONTEXT_RELEVANCE: &str = "context_relevance";

/// Runs three independent LLM judges concurrently — faithfulness
/// (answer vs. context), answer relevance (answer vs. question), and
/// context relevance (context vs. question) — each a single `generate`
/// call scored against its own rubric template. A judge's failure (upstream
/// error or unparseable response) never fails the other two; it is
/// captured as an `"Error: ..."` string in `judge_scores`, mirroring the
/// source's `asyncio.gather(..., return_exceptions=True)`.
pub struct LlmJudgeEvaluator {
    llm: Arc<dyn Llm>,
    user_id: String,
    faithfulness_template: PromptTemplate,
    answer_relevance_template: PromptTemplate,
    context_relevance_template: PromptTemplate,
}

impl LlmJudgeEvaluator {
    /// # Errors
    ///
    /// Returns an error if any template does not declare the variables its
    /// judge needs: faithfulness needs `{context, answer}`, answer
    /// relevance needs `{question, answer}`, context relevance needs
    /// `{context, question}`.
    pub fn new(
        llm: Arc<dyn Llm>,
        user_id: impl Into<String>,
        faithfulness_template: PromptTemplate,
        answer_relevance_template: PromptTemplate,
        context_relevance_template: PromptTemplate,
    ) -> Result<Self, String> {
        require_variables(&faithfulness_template, &["context", "answer"])?;
        require_variables(&answer_relevance_template, &["question", "answer"])?;
        require_variables(&context_relevance_template, &["context", "question"])?;
        Ok(Self {
            llm,
            user_id: user_id.into(),
            faithfulness_template,
            answer_relevance_template,
            context_relevance_template,
        })
    }

    async fn run_judge(
        &self,
        template: &PromptTemplate,
        variables: &HashMap<String, String>,
    ) -> Result<f32, String> {
        let prompt = template.format(variables).map_err(|err| err.to_string())?;
        let output = self
            .llm
            .generate(&self.user_id, PromptInput::Single(prompt), None, None, None)
            .await
            .map_err(|err| err.to_string())?;
        let response = output.into_vec().into_iter().next().unwrap_or_default();
        extract_normalized_score(&response, 1.0)
            .ok_or_else(|| format!("could not parse a score from judge response: {response}"))
    }
}

fn require_variables(template: &PromptTemplate, required: &[&str]) -> Result<(), String> {
    for variable in required {
        if !template.input_variables.iter().any(|v| v == variable) {
            return Err(format!(
                "evaluation template must declare the '{variable}' variable"
            ));
        }
    }
    Ok(())
}

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[async_trait]
impl Evaluator for LlmJudgeEvaluator {
    async fn evaluate(&self, query: &str, answer: &str, chunks: &[ScoredChunk]) -> EvaluationReport {
        if chunks.is_empty() {
            return EvaluationReport {
                relevance: None,
                coherence: None,
                faithfulness: None,
                overall: None,
                judge_scores: HashMap::new(),
                error: Some("No documents found".to_string()),
            };
        }

        let context = chunks
            .iter()
            .map(|scored| scored.chunk().text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let (faithfulness, answer_relevance, context_relevance) = tokio::join!(
            self.run_judge(&self.faithfulness_template, &vars(&[("context", &context), ("answer", answer)])),
            self.run_judge(&self.answer_relevance_template, &vars(&[("question", query), ("answer", answer)])),
            self.run_judge(&self.context_relevance_template, &vars(&[("context", &context), ("question", query)])),
        );

        let mut judge_scores = HashMap::new();
        let mut parsed = Vec::new();

        for (name, result) in [
            (FAITHFULNESS, &faithfulness),
            (ANSWER_RELEVANCE, &answer_relevance),
            (CONTEXT_RELEVANCE, &context_relevance),
        ] {
            match result {
                Ok(score) => {
                    judge_scores.insert(name.to_string(), score.to_string());
                    parsed.push((name, *score));
                }
                Err(message) => {
                    warn!(judge = name, error = %message, "LLM judge evaluation failed");
                    judge_scores.insert(name.to_string(), format!("Error: {message}"));
                }
            }
        }

        let lookup = |name: &str| parsed.iter().find(|(n, _)| *n == name).map(|(_, v)| *v);
        let overall = if parsed.is_empty() {
            None
        } else {
            Some(parsed.iter().map(|(_, v)| v).sum::<f32>() / parsed.len() as f32)
        };
        let error = if parsed.is_empty() {
            Some("all judges failed".to_string())
        } else {
            None
        };

        EvaluationReport {
            relevance: lookup(CONTEXT_RELEVANCE),
            coherence: lookup(ANSWER_RELEVANCE),
            faithfulness: lookup(FAITHFULNESS),
            overall,
            judge_scores,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as Map;

    use ragcore_types::{DocumentChunk, GenerationOutput, GenerationParams, Result, TemplateKind};

    use super::*;

    struct StubLlm {
        scripted: Map<String, &'static str>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl Llm for StubLlm {
        async fn generate(
            &self,
            _user_id: &str,
            prompt: PromptInput,
            _template: Option<&PromptTemplate>,
            _variables: Option<&Map<String, String>>,
            _params: Option<&GenerationParams>,
        ) -> Result<GenerationOutput> {
            let PromptInput::Single(text) = prompt else {
                return Err(CoreError::llm_provider("stub", "generate", "expected single prompt"));
            };
            for (marker, _) in &self.scripted {
                if text.contains(marker.as_str()) {
                    if self.fail_on == Some(marker.as_str()) {
                        return Err(CoreError::llm_provider("stub", "generate", "simulated failure"));
                    }
                    return Ok(GenerationOutput::Single(self.scripted[marker].to_string()));
                }
            }
            Ok(GenerationOutput::Single("0.5".to_string()))
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            unimplemented!("not used in judge tests")
        }

        async fn tokenize(&self, text: &str) -> Result<usize> {
            Ok(text.split_whitespace().count())
        }

        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    fn template(format: &str, variables: &[&str]) -> PromptTemplate {
        PromptTemplate::new(
            "t1",
            "system",
            TemplateKind::ResponseEvaluation,
            format,
            variables.iter().map(|v| (*v).to_string()).collect(),
        )
        .unwrap()
    }

    fn evaluator(llm: StubLlm) -> LlmJudgeEvaluator {
        LlmJudgeEvaluator::new(
            Arc::new(llm),
            "u1",
            template("faithfulness marker: {context} {answer}", &["context", "answer"]),
            template("relevance marker: {question} {answer}", &["question", "answer"]),
            template("context marker: {context} {question}", &["context", "question"]),
        )
        .unwrap()
    }

    fn chunk(text: &str) -> ScoredChunk {
        ScoredChunk::new(DocumentChunk::new(text, text), 0.5)
    }

    #[tokio::test]
    async fn all_judges_succeed_and_report_scores() {
        let mut scripted = Map::new();
        scripted.insert("faithfulness marker".to_string(), "0.9");
        scripted.insert("relevance marker".to_string(), "0.8");
        scripted.insert("context marker".to_string(), "0.7");
        let evaluator = evaluator(StubLlm { scripted, fail_on: None });

        let report = evaluator.evaluate("q", "a", &[chunk("doc")]).await;

        assert!((report.faithfulness.unwrap() - 0.9).abs() < 1e-5);
        assert!((report.coherence.unwrap() - 0.8).abs() < 1e-5);
        assert!((report.relevance.unwrap() - 0.7).abs() < 1e-5);
        assert!(report.error.is_none());
        assert_eq!(report.judge_scores.len(), 3);
    }

    #[tokio::test]
    async fn one_failing_judge_does_not_fail_the_others() {
        let mut scripted = Map::new();
        scripted.insert("faithfulness marker".to_string(), "0.9");
        scripted.insert("relevance marker".to_string(), "0.8");
        scripted.insert("context marker".to_string(), "0.7");
        let evaluator = evaluator(StubLlm {
            scripted,
            fail_on: Some("context marker"),
        });

        let report = evaluator.evaluate("q", "a", &[chunk("doc")]).await;

        assert!(report.faithfulness.is_some());
        assert!(report.coherence.is_some());
        assert!(report.relevance.is_none());
        assert!(report.judge_scores[CONTEXT_RELEVANCE].starts_with("Error"));
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn empty_chunks_short_circuit_without_running_any_judge() {
        let evaluator = evaluator(StubLlm {
            scripted: Map::new(),
            fail_on: Some("faithfulness marker"),
        });

        let report = evaluator.evaluate("q", "a", &[]).await;

        assert_eq!(report.error.as_deref(), Some("No documents found"));
        assert!(report.faithfulness.is_none());
        assert!(report.coherence.is_none());
        assert!(report.relevance.is_none());
        assert!(report.overall.is_none());
        assert!(report.judge_scores.is_empty());
    }

    #[test]
    fn construction_rejects_template_missing_required_variable() {
        let result = LlmJudgeEvaluator::new(
            Arc::new(StubLlm { scripted: Map::new(), fail_on: None }),
            "u1",
            template("{answer} only", &["answer"]),
            template("relevance marker: {question} {answer}", &["question", "answer"]),
            template("context marker: {context} {question}", &["context", "question"]),
        );
        assert!(result.is_err());
    }
}
