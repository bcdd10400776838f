//! Service specification and health-result types (spec §3, §4.2, §6).

use std::time::Duration;

use ragcore_types::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::profile::PerformanceProfile;

/// The mechanism used to probe a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Http,
    Tcp,
    Database,
}

/// A single service to probe, parsed from the YAML-shaped configuration in
/// spec §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub kind: CheckKind,
    pub endpoint: String,
    pub timeout: Duration,
    pub retry_policy: RetryPolicy,
    /// When set, a surface success is followed by a second,
    /// capability-specific probe before the service is declared healthy
    /// (spec §4.2, "deep-check").
    pub deep_health_check: bool,
    pub profile: Option<PerformanceProfile>,
}

impl ServiceSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: CheckKind, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
            deep_health_check: false,
            profile: None,
        }
    }

    /// The per-service timeout after applying the performance profile
    /// multiplier and cap (spec §4.2, "Adaptive timeouts").
    #[must_use]
    pub fn effective_timeout(&self) -> Duration {
        self.profile
            .unwrap_or(PerformanceProfile::Standard)
            .adapt(self.timeout)
    }
}

/// The outcome of probing one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResult {
    pub name: String,
    pub healthy: bool,
    pub response_time: Option<Duration>,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub retry_attempts: u32,
    pub race_condition_flag: bool,
}

impl HealthResult {
    #[must_use]
    pub fn timed_out(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: false,
            response_time: None,
            status_code: None,
            error: Some("overall timeout".to_string()),
            retry_attempts: 0,
            race_condition_flag: false,
        }
    }
}

/// Result of running [`crate::checker::HealthChecker::check_all`]: a map of
/// service name to its result, plus whether the overall deadline was
/// exceeded before every service completed (spec §4.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthReport {
    pub results: std::collections::HashMap<String, HealthResult>,
    pub timeout_exceeded: bool,
}

impl HealthReport {
    #[must_use]
    pub fn all_healthy(&self) -> bool {
        !self.results.is_empty() && self.results.values().all(|r| r.healthy)
    }
}
