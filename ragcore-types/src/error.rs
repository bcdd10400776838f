//! Closed error taxonomy shared by every ragcore crate (spec §7).
//!
//! Each stage or service catches only the capability errors it can
//! compensate for; everything else propagates to the service boundary as one
//! of the variants below, where it is mapped to a transport status code by
//! the (out-of-scope) HTTP layer.

use thiserror::Error;

/// The closed set of error kinds the core ever surfaces to a caller.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Malformed or out-of-range input.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Referenced entity absent, or access denied for a private resource.
    ///
    /// Access denial is expressed as `NotFound` rather than a distinct
    /// "forbidden" kind, so a caller cannot distinguish "doesn't exist" from
    /// "exists but you can't see it".
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Internal invariant violation: missing default pipeline, a template
    /// missing a required variable, a referenced document id absent from its
    /// collection, an uninitialized pipeline, and similar.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// An upstream LLM provider failed (auth, rate limit, timeout,
    /// malformed response).
    #[error("llm provider error ({provider}/{operation}): {message}")]
    LlmProvider {
        provider: String,
        operation: String,
        message: String,
    },

    /// A document- or vector-store operation failed unrecoverably.
    #[error("storage error: {message}")]
    Storage { message: String },

    /// The request deadline elapsed, or the caller cancelled explicitly.
    #[error("operation cancelled: {message}")]
    Cancellation { message: String },
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn llm_provider(
        provider: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::LlmProvider {
            provider: provider.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn cancellation(message: impl Into<String>) -> Self {
        Self::Cancellation {
            message: message.into(),
        }
    }

    /// Whether this error kind is safe to show verbatim to a user, as
    /// opposed to one that should be logged and replaced with a generic
    /// message at the transport boundary.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. })
    }
}

/// Convenience `Result` alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CoreError>;
