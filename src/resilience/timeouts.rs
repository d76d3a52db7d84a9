//! Timeout and deadline arithmetic.
//!
//! # Responsibilities
//! - Combine a per-call timeout with an optional caller deadline
//! - Cap the ping-wait phase independently of the handshake timeout
//!
//! # Design Decisions
//! - Uses Tokio's `Instant` so results feed `timeout_at` directly
//! - The caller deadline only ever shortens a bound, never extends it

use std::time::Duration;
use tokio::time::Instant;

/// The earlier of `now + budget` and `outer`.
pub fn capped_deadline(now: Instant, budget: Duration, outer: Option<Instant>) -> Instant {
    let capped = now + budget;
    match outer {
        Some(outer) if outer < capped => outer,
        _ => capped,
    }
}

/// `timeout`, shortened to whatever is left before `outer`.
///
/// A deadline already in the past yields `Duration::ZERO`.
pub fn bounded_timeout(now: Instant, timeout: Duration, outer: Option<Instant>) -> Duration {
    match outer {
        Some(outer) => timeout.min(outer.saturating_duration_since(now)),
        None => timeout,
    }
}
