//! System-level modules
//!
//! - Logging initialization (tracing subscriber + file appender)

pub mod logging;

pub use logging::init_logging;
