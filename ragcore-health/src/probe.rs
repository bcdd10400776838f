//! The pluggable probing capability (HTTP/TCP/database transport is an
//! external collaborator, per spec §1's scope boundary — only the
//! scheduling, retry, and race-detection logic above it is this crate's
//! responsibility).

use async_trait::async_trait;

use crate::spec::ServiceSpec;

/// The outcome of a single probe attempt.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub healthy: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

impl ProbeOutcome {
    #[must_use]
    pub const fn ok(status_code: Option<u16>) -> Self {
        Self {
            healthy: true,
            status_code,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(status_code: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            status_code,
            error: Some(error.into()),
        }
    }
}

/// A service prober: surface-level check, plus an optional deep check used
/// for `deep_health_check` services (spec §4.2).
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// The surface-level check (e.g. an HTTP GET, a TCP connect).
    async fn probe(&self, spec: &ServiceSpec) -> ProbeOutcome;

    /// A second, capability-specific round trip (e.g. `SELECT 1`) run only
    /// when [`ServiceSpec::deep_health_check`] is set and the surface probe
    /// already succeeded. The default implementation always succeeds, i.e.
    /// "no deeper check available" rather than "deeper check failed".
    async fn deep_probe(&self, _spec: &ServiceSpec) -> ProbeOutcome {
        ProbeOutcome::ok(None)
    }
}

/// A probe driven entirely by a closure, useful for tests and for small
/// deployments that don't need a full trait implementation.
pub struct FnProbe<F, G> {
    surface: F,
    deep: G,
}

impl<F, G> FnProbe<F, G> {
    pub const fn new(surface: F, deep: G) -> Self {
        Self { surface, deep }
    }
}

#[async_trait]
impl<F, G> ServiceProbe for FnProbe<F, G>
where
    F: Fn(&ServiceSpec) -> ProbeOutcome + Send + Sync,
    G: Fn(&ServiceSpec) -> ProbeOutcome + Send + Sync,
{
    async fn probe(&self, spec: &ServiceSpec) -> ProbeOutcome {
        (self.surface)(spec)
    }

    async fn deep_probe(&self, spec: &ServiceSpec) -> ProbeOutcome {
        (self.deep)(spec)
    }
}
