//! Shared utilities for the FreelanceForge client crates.

pub mod logging;

pub use logging::{init_logging, init_tracing, LogFormat};
