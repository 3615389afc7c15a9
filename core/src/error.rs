//! Error types for the Aerospike REST client.
//!
//! # Design
//! `ApiError` gets its own type because callers branch on it: the gateway
//! reports known failures (forbidden, record not found, record exists) as
//! 403/404/409 with a structured JSON body. Every other failure is either an
//! unexpected HTTP status without a JSON body (`Error::Http`) or a transport
//! failure that never produced a response (`Error::Transport`).

use std::fmt;

use serde_json::Value;

/// Status codes the gateway uses for application-level errors.
pub const API_ERROR_STATUSES: [u16; 3] = [403, 404, 409];

/// An application-level error reported by the gateway.
#[derive(Debug, Clone)]
pub struct ApiError {
    body: Value,
    status: u16,
}

impl ApiError {
    pub fn new(body: Value, status: u16) -> Self {
        Self { body, status }
    }

    /// The decoded JSON body of the error response.
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// The gateway's `message` field, if present.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// The Aerospike result code from `internalErrorCode`, if present.
    pub fn internal_error_code(&self) -> Option<i64> {
        self.body.get("internalErrorCode").and_then(Value::as_i64)
    }

    /// Whether the gateway flagged the write as possibly applied.
    pub fn in_doubt(&self) -> Option<bool> {
        self.body.get("inDoubt").and_then(Value::as_bool)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "API error {}: {message}", self.status),
            None => write!(f, "API error {}: {}", self.status, self.body),
        }
    }
}

impl std::error::Error for ApiError {}

/// Failures raised by a `Transport` before any response was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Errors returned by `RestClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The gateway answered 403, 404 or 409 with a JSON body.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A 4xx/5xx response whose body is not JSON.
    #[error("HTTP {status} for url {url}")]
    Http { status: u16, url: String, body: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// The HTTP status that produced this error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(err) => Some(err.status()),
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_api_error(&self) -> bool {
        matches!(self, Error::Api(_))
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}
