//! Process-level infrastructure shared by the binaries.

pub mod telemetry;

pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat, TelemetryConfig};
