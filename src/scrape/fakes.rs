//! Scripted `Probes` for engine tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::probe::{CensusResult, HealthResult, ProbeError, ProbeResult, Probes};

type Respond<T> = Box<dyn Fn() -> ProbeResult<T> + Send + Sync>;

pub(crate) struct FakeProbes {
    health: Respond<HealthResult>,
    census: Respond<CensusResult>,
    websocket: Respond<Duration>,
    delay: Duration,
    calls: Mutex<Vec<&'static str>>,
    deadlines: Mutex<Vec<Option<Instant>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeProbes {
    /// Healthy backend: 3 online, 1 in game, 5ms ping.
    pub fn healthy() -> Self {
        Self {
            health: Box::new(|| {
                Ok(HealthResult {
                    up: true,
                    latency: Duration::from_millis(3),
                    status: 200,
                })
            }),
            census: Box::new(|| Ok(CensusResult { online: 3, in_game: 1 })),
            websocket: Box::new(|| Ok(Duration::from_millis(5))),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            deadlines: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_health(
        mut self,
        f: impl Fn() -> ProbeResult<HealthResult> + Send + Sync + 'static,
    ) -> Self {
        self.health = Box::new(f);
        self
    }

    pub fn with_census(
        mut self,
        f: impl Fn() -> ProbeResult<CensusResult> + Send + Sync + 'static,
    ) -> Self {
        self.census = Box::new(f);
        self
    }

    pub fn with_websocket(
        mut self,
        f: impl Fn() -> ProbeResult<Duration> + Send + Sync + 'static,
    ) -> Self {
        self.websocket = Box::new(f);
        self
    }

    /// Every probe call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deadlines(&self) -> Vec<Option<Instant>> {
        self.deadlines.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn call<T>(
        &self,
        name: &'static str,
        deadline: Option<Instant>,
        respond: &Respond<T>,
    ) -> ProbeResult<T> {
        self.calls.lock().unwrap().push(name);
        self.deadlines.lock().unwrap().push(deadline);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        respond()
    }
}

#[async_trait]
impl Probes for FakeProbes {
    async fn check_health(&self, deadline: Option<Instant>) -> ProbeResult<HealthResult> {
        self.call("health", deadline, &self.health).await
    }

    async fn collect_users(&self, deadline: Option<Instant>) -> ProbeResult<CensusResult> {
        self.call("users", deadline, &self.census).await
    }

    async fn check_websocket(&self, deadline: Option<Instant>) -> ProbeResult<Duration> {
        self.call("websocket", deadline, &self.websocket).await
    }
}

/// A real `reqwest` error, produced without touching the network.
pub(crate) fn transport_error(probe: &'static str) -> ProbeError {
    let source = reqwest::Client::new()
        .get("not a url")
        .build()
        .unwrap_err();
    ProbeError::Transport { probe, source }
}

pub(crate) fn status_error(status: u16) -> ProbeError {
    ProbeError::Status {
        probe: "users",
        status,
        body: "upstream unavailable".into(),
    }
}
