//! Error types for subscription execution.

use std::time::Duration;

/// Query engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The query engine could not be reached.
    #[error("query engine unavailable: {message}")]
    Unavailable { message: String },

    /// The query engine answered with a fault.
    #[error("query engine fault ({code}): {message}")]
    Fault { code: String, message: String },

    /// The query engine answered with something that is not a query result.
    #[error("invalid query response: {message}")]
    InvalidResponse { message: String },

    /// The poll did not complete in time.
    #[error("query timed out after {after:?}")]
    Timeout { after: Duration },
}

/// Serialization of a result envelope failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to serialize query document: {message}")]
pub struct SerializationError {
    pub message: String,
}

impl SerializationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Delivery errors.
///
/// Any HTTP status counts as delivered; these cover the cases where no
/// status was obtained at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// Connection refused, DNS failure, interrupted transfer.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The destination did not answer in time.
    #[error("delivery timed out after {after:?}")]
    Timeout { after: Duration },

    /// Destination scheme cannot be delivered to.
    #[error("unsupported destination scheme: {scheme}")]
    UnsupportedScheme { scheme: String },

    /// The delivery client itself could not be set up.
    #[error("delivery client error: {message}")]
    Client { message: String },
}

/// Malformed subscription construction. Not retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("subscription id must not be empty")]
    EmptyId,

    #[error("query name must not be empty")]
    EmptyQueryName,

    /// The time filter parameter is appended by the subscription itself.
    #[error("parameter {name} is reserved for the subscription time filter")]
    ReservedParameter { name: String },

    #[error("duplicate query parameter: {name}")]
    DuplicateParameter { name: String },

    #[error("invalid destination {destination}: {reason}")]
    InvalidDestination { destination: String, reason: String },

    #[error("invalid subscription record: {message}")]
    Record { message: String },

    #[error("{name} must be greater than zero")]
    ZeroTimeout { name: &'static str },
}

impl QueryError {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::Fault { .. } => "fault",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Timeout { .. } => "timeout",
        }
    }
}

impl DeliveryError {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Timeout { .. } => "timeout",
            Self::UnsupportedScheme { .. } => "unsupported_scheme",
            Self::Client { .. } => "client",
        }
    }
}
