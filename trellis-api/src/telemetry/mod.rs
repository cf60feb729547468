//! Trellis Telemetry - structured logging setup

pub mod tracer;

pub use tracer::{init_tracer, LogFormat, TelemetryConfig};
