//! # Observability Module
//!
//! Logging setup for the list cache. The cache emits `tracing` events;
//! this module decides where they go.

pub mod config;
pub mod logging;

pub use config::{LogConfig, LogFormat};
pub use logging::init_logging;
