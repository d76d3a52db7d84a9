//! One scrape cycle.

use std::time::Duration;
use tokio::time::Instant;

use crate::config::CensusFailurePolicy;
use crate::observability::{Gauge, Histogram, MetricsSink};
use crate::probe::{CensusResult, HealthResult, ProbeError, Probes};

/// Outcome of the WebSocket probe. Never a cycle error.
#[derive(Debug)]
pub enum LatencyResult {
    Up { rtt: Duration },
    Down { error: ProbeError },
}

/// Everything one cycle observed. A probe that was not reached is `None`.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    pub health: Option<HealthResult>,
    pub census: Option<CensusResult>,
    pub latency: Option<LatencyResult>,
    /// Health transport failure or census failure.
    pub error: Option<ProbeError>,
}

impl CycleOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-cycle knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleOptions {
    pub census_failure: CensusFailurePolicy,
    /// Overall deadline handed to every probe.
    pub deadline: Option<Instant>,
}

/// Run health, census and WebSocket probes once, publishing as it goes.
///
/// A health transport failure ends the cycle before anything is
/// published. A census failure ends it after health was published,
/// unless `census_failure` is `Continue`. A WebSocket failure is
/// published as `websocket_up = 0` and is not a cycle error.
pub async fn run_cycle<P, S>(probes: &P, sink: &S, options: CycleOptions) -> CycleOutcome
where
    P: Probes + ?Sized,
    S: MetricsSink + ?Sized,
{
    let mut outcome = CycleOutcome::default();

    let health = match probes.check_health(options.deadline).await {
        Ok(health) => health,
        Err(e) => {
            outcome.error = Some(e);
            return outcome;
        }
    };
    sink.set(Gauge::BackendHealthUp, if health.up { 1.0 } else { 0.0 });
    sink.observe(Histogram::BackendHealthLatency, health.latency.as_secs_f64());
    outcome.health = Some(health);

    match probes.collect_users(options.deadline).await {
        Ok(census) => {
            sink.set(Gauge::UsersOnline, census.online as f64);
            sink.set(Gauge::UsersInGame, census.in_game as f64);
            outcome.census = Some(census);
        }
        Err(e) => {
            outcome.error = Some(e);
            if options.census_failure == CensusFailurePolicy::Abort {
                return outcome;
            }
        }
    }

    let latency = match probes.check_websocket(options.deadline).await {
        Ok(rtt) => {
            sink.set(Gauge::WebsocketUp, 1.0);
            sink.observe(Histogram::WebsocketPingRtt, rtt.as_secs_f64());
            LatencyResult::Up { rtt }
        }
        Err(error) => {
            tracing::warn!(error = %error, "WebSocket probe failed");
            sink.set(Gauge::WebsocketUp, 0.0);
            LatencyResult::Down { error }
        }
    };
    outcome.latency = Some(latency);

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::{Snapshot, SnapshotSink};
    use crate::scrape::fakes::{status_error, transport_error, FakeProbes};

    #[tokio::test]
    async fn test_all_probes_succeed() {
        let probes = FakeProbes::healthy();
        let sink = SnapshotSink::new();

        let outcome = run_cycle(&probes, &sink, CycleOptions::default()).await;
        assert!(outcome.is_ok());
        assert_eq!(probes.calls(), ["health", "users", "websocket"]);

        let snap = sink.snapshot();
        assert_eq!(snap.gauge(Gauge::BackendHealthUp), Some(1.0));
        assert_eq!(snap.observed(Histogram::BackendHealthLatency).len(), 1);
        assert_eq!(snap.gauge(Gauge::UsersOnline), Some(3.0));
        assert_eq!(snap.gauge(Gauge::UsersInGame), Some(1.0));
        assert_eq!(snap.gauge(Gauge::WebsocketUp), Some(1.0));
        assert_eq!(snap.observed(Histogram::WebsocketPingRtt), &[0.005]);
    }

    #[tokio::test]
    async fn test_health_down_is_not_an_error() {
        let probes = FakeProbes::healthy().with_health(|| {
            Ok(HealthResult {
                up: false,
                latency: Duration::from_millis(12),
                status: 503,
            })
        });
        let sink = SnapshotSink::new();

        let outcome = run_cycle(&probes, &sink, CycleOptions::default()).await;
        assert!(outcome.is_ok());
        let snap = sink.snapshot();
        assert_eq!(snap.gauge(Gauge::BackendHealthUp), Some(0.0));
        assert_eq!(snap.observed(Histogram::BackendHealthLatency), &[0.012]);
        assert_eq!(probes.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_health_transport_failure_aborts_cycle() {
        let probes = FakeProbes::healthy().with_health(|| Err(transport_error("health")));
        let sink = SnapshotSink::new();

        let outcome = run_cycle(&probes, &sink, CycleOptions::default()).await;
        assert!(matches!(outcome.error, Some(ProbeError::Transport { probe: "health", .. })));
        assert!(outcome.health.is_none());
        assert_eq!(probes.calls(), ["health"]);
        assert_eq!(sink.snapshot(), Snapshot::default());
    }

    #[tokio::test]
    async fn test_census_failure_aborts_after_health_published() {
        let probes = FakeProbes::healthy().with_census(|| Err(status_error(500)));
        let sink = SnapshotSink::new();

        let outcome = run_cycle(&probes, &sink, CycleOptions::default()).await;
        assert!(matches!(outcome.error, Some(ProbeError::Status { status: 500, .. })));
        assert_eq!(probes.calls(), ["health", "users"]);
        assert!(outcome.latency.is_none());

        let snap = sink.snapshot();
        assert_eq!(snap.gauge(Gauge::BackendHealthUp), Some(1.0));
        assert_eq!(snap.gauge(Gauge::UsersOnline), None);
        assert_eq!(snap.gauge(Gauge::UsersInGame), None);
        assert_eq!(snap.gauge(Gauge::WebsocketUp), None);
    }

    #[tokio::test]
    async fn test_census_failure_with_continue_policy_still_pings() {
        let probes = FakeProbes::healthy().with_census(|| Err(status_error(404)));
        let sink = SnapshotSink::new();
        let options = CycleOptions {
            census_failure: CensusFailurePolicy::Continue,
            deadline: None,
        };

        let outcome = run_cycle(&probes, &sink, options).await;
        assert!(!outcome.is_ok());
        assert!(matches!(outcome.latency, Some(LatencyResult::Up { .. })));

        let snap = sink.snapshot();
        assert_eq!(snap.gauge(Gauge::BackendHealthUp), Some(1.0));
        assert_eq!(snap.gauge(Gauge::UsersOnline), None);
        assert_eq!(snap.gauge(Gauge::WebsocketUp), Some(1.0));
        assert_eq!(snap.observed(Histogram::WebsocketPingRtt).len(), 1);
    }

    #[tokio::test]
    async fn test_websocket_timeout_is_absorbed() {
        let probes = FakeProbes::healthy()
            .with_websocket(|| Err(ProbeError::WsTimeout(Duration::from_secs(2))));
        let sink = SnapshotSink::new();

        let outcome = run_cycle(&probes, &sink, CycleOptions::default()).await;
        assert!(outcome.is_ok());
        assert!(matches!(
            outcome.latency,
            Some(LatencyResult::Down { error: ProbeError::WsTimeout(_) })
        ));

        let snap = sink.snapshot();
        assert_eq!(snap.gauge(Gauge::WebsocketUp), Some(0.0));
        assert!(snap.observed(Histogram::WebsocketPingRtt).is_empty());
        assert_eq!(snap.gauge(Gauge::UsersOnline), Some(3.0));
    }

    #[tokio::test]
    async fn test_deadline_is_passed_to_every_probe() {
        let probes = FakeProbes::healthy();
        let sink = SnapshotSink::new();
        let deadline = Instant::now() + Duration::from_secs(4);
        let options = CycleOptions {
            census_failure: CensusFailurePolicy::Abort,
            deadline: Some(deadline),
        };

        run_cycle(&probes, &sink, options).await;
        assert_eq!(probes.deadlines(), vec![Some(deadline); 3]);
    }
}
