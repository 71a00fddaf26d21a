use std::time::Duration;

use thiserror::Error;

use crate::service::ServiceName;

/// Convenient result alias for the pz common runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type shared by bootstrap, syslog records and sinks.
#[derive(Debug, Error)]
pub enum Error {
    /// Platform environment variables were malformed or contradictory.
    #[error("invalid platform configuration: {message}")]
    Config { message: String },

    /// Raised when looking up a service that is not in the directory.
    #[error("unknown service: {name}")]
    UnknownService { name: String },

    /// A required dependency failed its startup health check.
    #[error("startup health check failed for {service}: {reason}")]
    StartupHealth { service: ServiceName, reason: String },

    /// A `wait_for_service*` budget expired.
    #[error("timed out after {}ms waiting for {service} to {}", .elapsed.as_millis(), wait_goal(.alive))]
    Timeout {
        service: ServiceName,
        alive: bool,
        elapsed: Duration,
    },

    /// A sink was written to without its mandatory configuration.
    #[error("log sink is not configured: {what}")]
    SinkNotConfigured { what: &'static str },

    /// Raised when reading a negative number of records from a sink.
    #[error("invalid record count: {count}")]
    InvalidCount { count: isize },

    /// A remote sink rejected the record or could not be reached.
    #[error("remote log sink failed: {message}")]
    RemoteSink { message: String },

    /// A syslog record failed validation.
    #[error("invalid syslog message: {message}")]
    Validation { message: String },

    /// Raised when a line cannot be parsed as an RFC 5424 record.
    #[error("unable to parse syslog line: {message}")]
    Parse { message: String },

    /// Raised when a query parameter has an unusable value.
    #[error("invalid value {value:?} for parameter {name}")]
    InvalidParameter { name: &'static str, value: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for JSON encoding and decoding errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn wait_goal(alive: &bool) -> &'static str {
    if *alive {
        "come up"
    } else {
        "go down"
    }
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
        }
    }
}
