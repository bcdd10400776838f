//! Per-session token-budget warnings (spec §3, §4.7), grounded on
//! `original_source/tests/unit/services/test_message_processing_orchestrator.py`
//! (`TokenWarning`, `TokenWarningType`, `check_usage_warning`).

use ragcore_types::{TokenWarning, TokenWarningKind};

/// Computes a [`TokenWarning`] from a session's running token total against
/// a configured limit. Pure and synchronous — no capability call is
/// involved, unlike the other C7 collaborators.
pub trait TokenTrackingService: Send + Sync {
    /// Returns `None` when usage is comfortably under the warning
    /// threshold, or when `limit_tokens` is `0` (no budget configured).
    fn check_usage_warning(&self, current_tokens: u64, limit_tokens: u64) -> Option<TokenWarning>;
}

/// Three-tier threshold policy: approaching (default 75%), at-limit
/// (default 90%), over (100%+).
pub struct ThresholdTokenTrackingService {
    approaching_ratio: f32,
    at_limit_ratio: f32,
}

impl ThresholdTokenTrackingService {
    #[must_use]
    pub const fn new(approaching_ratio: f32, at_limit_ratio: f32) -> Self {
        Self {
            approaching_ratio,
            at_limit_ratio,
        }
    }
}

impl Default for ThresholdTokenTrackingService {
    fn default() -> Self {
        Self::new(0.75, 0.9)
    }
}

impl TokenTrackingService for ThresholdTokenTrackingService {
    fn check_usage_warning(&self, current_tokens: u64, limit_tokens: u64) -> Option<TokenWarning> {
        if limit_tokens == 0 {
            return None;
        }
        let percentage = (current_tokens as f64 / limit_tokens as f64 * 100.0) as f32;

        let (kind, severity, suggested_action) = if current_tokens >= limit_tokens {
            (
                TokenWarningKind::OverLimit,
                "critical",
                "start a new session or summarize the conversation to free up budget",
            )
        } else if (current_tokens as f32) >= (limit_tokens as f32) * self.at_limit_ratio {
            (
                TokenWarningKind::AtLimit,
                "high",
                "consider starting a new session soon",
            )
        } else if (current_tokens as f32) >= (limit_tokens as f32) * self.approaching_ratio {
            (
                TokenWarningKind::ApproachingLimit,
                "medium",
                "the conversation is using a significant share of its token budget",
            )
        } else {
            return None;
        };

        Some(TokenWarning {
            kind,
            severity: severity.to_string(),
            percentage,
            current_tokens,
            limit_tokens,
            message: format!(
                "conversation has used {current_tokens} of {limit_tokens} tokens ({percentage:.1}%)"
            ),
            suggested_action: suggested_action.to_string(),
        })
    }
}
