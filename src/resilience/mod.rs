//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Probe call:
//!     → timeouts.rs (per-call timeout, shortened by the cycle deadline)
//!     → on expiry: the probe fails for this cycle only
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries and no backoff: the next scheduler tick is the only retry

pub mod timeouts;
