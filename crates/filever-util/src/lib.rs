//! Shared utilities for filever.
//!
//! - Logging setup with tracing
//! - RAII-based timing for update application

pub mod log;
pub mod timing;

pub use log::{LogConfig, LogLevel};
pub use timing::TimingGuard;
