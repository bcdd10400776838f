//! The health checker: concurrent scheduling, per-service retry, and
//! race-condition (deep-check) detection (spec §4.2).
//!
//! The source system's `check_all_services_parallel` contains a heuristic
//! branch that fabricates timeout results when `max_total_timeout` "looks
//! too low" relative to the services' individual timeouts. Its business
//! intent is undocumented (spec §9, Open Questions); this port does not
//! carry it forward and instead implements a straightforward
//! deadline-and-cancel pattern: every service either completes within its
//! own effective timeout or is reported as timed out when the overall
//! deadline fires.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::probe::{ProbeOutcome, ServiceProbe};
use crate::spec::{CheckKind, HealthReport, HealthResult, ServiceSpec};

/// Upper bound on concurrently in-flight checks, per spec §4.2/§5.
const MAX_WORKERS: usize = 10;

/// Runs health checks for a set of services against a global deadline.
pub struct HealthChecker<P: ServiceProbe> {
    prober: Arc<P>,
}

impl<P: ServiceProbe + 'static> HealthChecker<P> {
    #[must_use]
    pub fn new(prober: Arc<P>) -> Self {
        Self { prober }
    }

    /// Checks every service in `specs`, bounded by `worker count =
    /// min(len(specs), 10)` concurrent in-flight checks and an overall
    /// `deadline`.
    ///
    /// When the deadline fires before every service completes, still-
    /// pending checks are reported as `healthy=false, error="overall
    /// timeout"` and [`HealthReport::timeout_exceeded`] is set; results
    /// already completed at that moment are preserved.
    pub async fn check_all(&self, specs: &[ServiceSpec], deadline: Duration) -> HealthReport {
        if specs.is_empty() {
            return HealthReport::default();
        }

        let worker_count = specs.len().min(MAX_WORKERS);
        let semaphore = Arc::new(Semaphore::new(worker_count));
        let start = Instant::now();

        let mut join_set = JoinSet::new();
        for spec in specs.iter().cloned() {
            let prober = Arc::clone(&self.prober);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                check_one_service(prober.as_ref(), &spec).await
            });
        }

        let mut results = HashMap::with_capacity(specs.len());
        let mut timeout_exceeded = false;

        let overall = tokio::time::timeout(deadline, async {
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(result) => {
                        results.insert(result.name.clone(), result);
                    }
                    Err(join_error) => {
                        warn!(error = %join_error, "health check task panicked");
                    }
                }
            }
        })
        .await;

        if overall.is_err() {
            timeout_exceeded = true;
            join_set.abort_all();
            for spec in specs {
                results
                    .entry(spec.name.clone())
                    .or_insert_with(|| HealthResult::timed_out(&spec.name));
            }
            warn!(elapsed = ?start.elapsed(), "health check overall deadline exceeded");
        }

        info!(
            checked = results.len(),
            healthy = results.values().filter(|r| r.healthy).count(),
            timeout_exceeded,
            "health check run complete"
        );

        HealthReport {
            results,
            timeout_exceeded,
        }
    }
}

async fn check_one_service(prober: &(impl ServiceProbe + ?Sized), spec: &ServiceSpec) -> HealthResult {
    let timeout = spec.effective_timeout();
    let max_attempts = spec.retry_policy.max_attempts.max(1);

    let mut last_outcome: Option<ProbeOutcome> = None;
    let mut attempts = 0;
    let started = Instant::now();

    for attempt in 0..max_attempts {
        attempts = attempt + 1;
        let probed = tokio::time::timeout(timeout, prober.probe(spec)).await;

        let outcome = match probed {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::failed(None, "probe timed out"),
        };

        let should_retry = !outcome.healthy
            && attempt + 1 < max_attempts
            && outcome
                .status_code
                .is_none_or(ragcore_types::RetryPolicy::is_retryable_status);

        if outcome.healthy || !should_retry {
            last_outcome = Some(outcome);
            break;
        }

        debug!(service = %spec.name, attempt, "transient health-check failure, retrying");
        tokio::time::sleep(spec.retry_policy.delay_for(attempt)).await;
        last_outcome = Some(outcome);
    }

    let outcome = last_outcome.unwrap_or_else(|| ProbeOutcome::failed(None, "no attempts made"));
    let response_time = Some(started.elapsed());

    if !outcome.healthy {
        return HealthResult {
            name: spec.name.clone(),
            healthy: false,
            response_time,
            status_code: outcome.status_code,
            error: outcome.error,
            retry_attempts: attempts.saturating_sub(1),
            race_condition_flag: false,
        };
    }

    if spec.deep_health_check {
        let deep = prober.deep_probe(spec).await;
        if !deep.healthy {
            warn!(service = %spec.name, kind = ?spec.kind, "deep health check caught a race-condition false positive");
            return HealthResult {
                name: spec.name.clone(),
                healthy: false,
                response_time,
                status_code: outcome.status_code,
                error: deep.error.or(Some("deep health check failed".to_string())),
                retry_attempts: attempts.saturating_sub(1),
                race_condition_flag: true,
            };
        }
    }

    HealthResult {
        name: spec.name.clone(),
        healthy: true,
        response_time,
        status_code: outcome.status_code,
        error: None,
        retry_attempts: attempts.saturating_sub(1),
        race_condition_flag: false,
    }
}

/// Convenience constructor for a `database`-kind [`ServiceSpec`] with deep
/// checking enabled, matching the common case from spec §8 scenario 6.
#[must_use]
pub fn database_spec_with_deep_check(name: impl Into<String>, endpoint: impl Into<String>) -> ServiceSpec {
    let mut spec = ServiceSpec::new(name, CheckKind::Database, endpoint);
    spec.deep_health_check = true;
    spec
}
