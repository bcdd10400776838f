//! Service health framework (C2): active probing with concurrent
//! scheduling, per-service retry/backoff, adaptive timeouts, and
//! race-condition (deep-check) detection.

pub mod checker;
pub mod probe;
pub mod profile;
pub mod spec;

pub use checker::{database_spec_with_deep_check, HealthChecker};
pub use probe::{FnProbe, ProbeOutcome, ServiceProbe};
pub use profile::PerformanceProfile;
pub use spec::{CheckKind, HealthReport, HealthResult, ServiceSpec};
