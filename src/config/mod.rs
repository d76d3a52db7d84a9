//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → optional TOML file (loader.rs)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks)
//!     → ExporterConfig (validated, immutable)
//!     → ProbeConfig shared via Arc with every scrape cycle
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults so an empty environment is a valid setup
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CensusFailurePolicy, ExporterConfig, ObservabilityConfig, ProbeConfig, ScrapeConfig,
    TimeoutPolicy,
};
