//! Enrichment configuration (C4, spec §4.4).

use std::time::Duration;

/// Controls whether, how, and which tools run over a completed
/// [`ragcore_types::SearchOutput`].
///
/// Mirrors `MCPEnrichmentConfig` in the source system, generalized from an
/// MCP-specific config to a pluggable-tool one (spec §4.4, Non-goals: no
/// concrete tool transport).
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    /// Tool names to run. Empty means "ask the gateway which tools are
    /// available and use all of them" (spec §4.4).
    pub tools: Vec<String>,
    pub timeout: Duration,
    /// Run tools concurrently (bounded by `max_concurrent`) instead of one
    /// at a time.
    pub parallel: bool,
    /// If a tool panics or the gateway itself errors unexpectedly, record
    /// the failure in metadata and return the original output rather than
    /// propagating the error to the caller.
    pub fail_silently: bool,
    pub max_concurrent: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tools: Vec::new(),
            timeout: Duration::from_secs(10),
            parallel: true,
            fail_silently: true,
            max_concurrent: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_disabled_and_fails_silently() {
        let config = EnrichmentConfig::default();
        assert!(!config.enabled);
        assert!(config.fail_silently);
        assert_eq!(config.max_concurrent, 5);
    }
}
