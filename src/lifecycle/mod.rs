//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Install recorder → Bind metrics listener → Spawn server, upkeep, scheduler
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → scheduler finishes its cycle, server drains
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
