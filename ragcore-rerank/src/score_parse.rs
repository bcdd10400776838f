//! Score extraction from an LLM's free-text reranking response (spec
//! §4.3), grounded on
//! `original_source/backend/rag_solution/retrieval/reranker.py::_extract_score`.

use regex::Regex;
use std::sync::LazyLock;

static SCALE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*/\s*\d+").expect("valid regex"));
static LABELED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:score|rating|relevance)\s*[:=]?\s*(\d+(?:\.\d+)?)").expect("valid regex")
});
static LEADING_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)").expect("valid regex"));

/// Extracts a numeric score from `response` and normalizes it to `[0, 1]`
/// by dividing by `scale`, in the order: `N/scale`, a labeled
/// `score|rating|relevance: N`, then a bare leading number. Returns `None`
/// if no pattern matches, so the caller can apply the default-to-0.5
/// fallback and log the failure (spec §4.3).
#[must_use]
pub fn extract_normalized_score(response: &str, scale: f32) -> Option<f32> {
    let normalized = response.trim().to_lowercase();
    let raw = [&*SCALE_PATTERN, &*LABELED_PATTERN, &*LEADING_NUMBER_PATTERN]
        .iter()
        .find_map(|pattern| {
            pattern
                .captures(&normalized)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f32>().ok())
        })?;

    if scale <= 0.0 {
        return Some(raw.clamp(0.0, 1.0));
    }
    Some((raw / scale).clamp(0.0, 1.0))
}

/// Score used when extraction fails outright — a neutral midpoint, per
/// spec §4.3 ("On parse failure: log, default to 0.5").
pub const FALLBACK_SCORE: f32 = 0.5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scale_fraction() {
        assert_eq!(extract_normalized_score("8.5/10", 10.0), Some(0.85));
    }

    #[test]
    fn parses_labeled_score() {
        assert_eq!(extract_normalized_score("Score: 7", 10.0), Some(0.7));
        assert_eq!(extract_normalized_score("rating = 9", 10.0), Some(0.9));
    }

    #[test]
    fn parses_leading_number() {
        assert_eq!(extract_normalized_score("9.5 out of scale", 10.0), Some(0.95));
    }

    #[test]
    fn unparseable_response_returns_none() {
        assert_eq!(extract_normalized_score("not a number at all", 10.0), None);
    }

    #[test]
    fn clamps_scores_above_scale() {
        assert_eq!(extract_normalized_score("15/10", 10.0), Some(1.0));
    }
}
