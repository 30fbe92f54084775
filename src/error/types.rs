use std::fmt;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification of transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connect or request deadline exceeded
    Timeout,
    /// Connection refused, DNS or TLS failure
    Connect,
    /// Request could not be built or sent
    Request,
    /// Response body could not be read from the wire
    Body,
    Other,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "Timeout",
            TransportErrorKind::Connect => "Connect",
            TransportErrorKind::Request => "Request",
            TransportErrorKind::Body => "Body",
            TransportErrorKind::Other => "Other",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised by the HTTP transport before a response was obtained
#[derive(Error, Debug)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_builder() || err.is_request() {
            TransportErrorKind::Request
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };

        TransportError::new(kind, err.to_string()).with_source(err)
    }
}

/// Failure of a dispatched outbound call
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to encode request payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Unexpected response status {status}: {body_excerpt}")]
    Status { status: u16, body_excerpt: String },

    #[error("Failed to decode response: {source}")]
    Decode {
        body_excerpt: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DispatchError {
    /// Short name of the failure class, used in log records
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Encode(_) => "encode",
            DispatchError::Transport(_) => "transport",
            DispatchError::Status { .. } => "status",
            DispatchError::Decode { .. } => "decode",
        }
    }

    /// HTTP status of a non-success response, if that is what failed
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
