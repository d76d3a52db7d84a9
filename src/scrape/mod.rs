//! Scrape engine.
//!
//! # Data Flow
//! ```text
//! scheduler.rs: interval tick
//!     → cycle.rs: health → census → websocket (sequential)
//!     → MetricsSink: each result as soon as it is known
//!     → scheduler.rs: cycle duration + error counter
//! ```
//!
//! # Design Decisions
//! - Health and census failures end the cycle and count as scrape errors
//! - WebSocket failures only flip `websocket_up` to 0
//! - Cycles never overlap; a slow cycle delays the next tick

pub mod cycle;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod fakes;

pub use cycle::{run_cycle, CycleOptions, CycleOutcome, LatencyResult};
pub use scheduler::Scheduler;
