//! Glider Common Utilities
//!
//! Shared infrastructure for all Glider crates:
//! - Error types and result aliases
//! - Tick pacing for fixed-period loops
//! - Tracing/logging initialization and runtime level changes
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
