//! Fixed-interval scrape scheduler.
//!
//! # Responsibilities
//! - Run one scrape cycle per tick, forever
//! - Record cycle duration regardless of outcome
//! - Count and log cycles that reported an error
//!
//! # Design Decisions
//! - First tick fires immediately
//! - A cycle always finishes before the next tick is awaited; missed ticks
//!   are skipped rather than bursted
//! - Shutdown is only observed between cycles

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ScrapeConfig;
use crate::observability::{Counter, Histogram, MetricsSink};
use crate::probe::Probes;
use crate::scrape::cycle::{run_cycle, CycleOptions, CycleOutcome};

pub struct Scheduler<P, S> {
    probes: P,
    sink: S,
    config: ScrapeConfig,
}

impl<P: Probes, S: MetricsSink> Scheduler<P, S> {
    pub fn new(probes: P, sink: S, config: ScrapeConfig) -> Self {
        Self {
            probes,
            sink,
            config,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run cycles until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.config.interval.as_millis() as u64,
            census_failure = ?self.config.census_failure,
            "Scheduler starting"
        );

        let mut ticker = time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.scrape_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run a single cycle and record its duration and error status.
    pub async fn scrape_once(&self) -> CycleOutcome {
        let span = tracing::info_span!("scrape_cycle", cycle_id = %Uuid::new_v4());

        async {
            let started = Instant::now();
            let options = CycleOptions {
                census_failure: self.config.census_failure,
                deadline: self.config.cycle_timeout.map(|t| started + t),
            };

            let outcome = run_cycle(&self.probes, &self.sink, options).await;
            let elapsed = started.elapsed();
            self.sink.observe(Histogram::ScrapeDuration, elapsed.as_secs_f64());

            match &outcome.error {
                Some(e) => {
                    self.sink.increment(Counter::ScrapeErrors);
                    tracing::error!(error = %e, duration_ms = millis(elapsed), "Scrape error");
                }
                None => {
                    tracing::debug!(duration_ms = millis(elapsed), "Scrape cycle finished");
                }
            }

            outcome
        }
        .instrument(span)
        .await
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}
