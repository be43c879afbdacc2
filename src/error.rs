use thiserror::Error;

/// Rejections produced while reading an activity string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty activity string")]
    Empty,
    #[error("activity string is not well formed: '{separator}' occurs {count} times")]
    Malformed { separator: char, count: usize },
}

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,
    #[error("invalid timestamp '{value}'")]
    Invalid {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    #[error("activity {id} ('{name}') is still running")]
    AlreadyRunning { id: i64, name: String },
    #[error("no activity is running")]
    NotRunning,
}
