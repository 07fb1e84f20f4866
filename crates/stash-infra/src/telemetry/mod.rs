mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry};

use std::str::FromStr;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "stash=debug";

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// Logging setup for a process.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub environment: String,
    pub format: LogFormat,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            environment: environment.into(),
            format: LogFormat::default(),
        }
    }

    /// Pick the log format from `LOG_FORMAT`; unknown values keep the default.
    pub fn with_format_from_env(mut self) -> Self {
        if let Ok(value) = std::env::var("LOG_FORMAT") {
            self.format = value.parse().unwrap_or_default();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("JSON ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
