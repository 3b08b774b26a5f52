use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    /// The host handed the adapter a message kind its vendor cannot take.
    #[error("unsupported message type: {kind}")]
    UnsupportedMessage { kind: String },
    #[error("unauthorized")]
    Unauthorized,
    #[error("rate limited")]
    RateLimited {
        /// Milliseconds suggested by Retry-After if present
        retry_after_ms: Option<u64>,
        #[source]
        source: Option<Box<TransportError>>,
    },
    #[error("timeout")]
    Timeout,
    #[error("upstream error (status {status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        #[source]
        source: Option<Box<TransportError>>,
    },
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
}

impl SdkError {
    pub fn unsupported_message(kind: impl Into<String>) -> Self {
        SdkError::UnsupportedMessage { kind: kind.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        SdkError::MalformedResponse {
            message: message.into(),
        }
    }

    /// HTTP status behind this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            SdkError::Unauthorized => Some(401),
            SdkError::Upstream { status, .. } => Some(*status),
            SdkError::RateLimited { source, .. } => {
                source.as_ref().and_then(|s| s.status()).or(Some(429))
            }
            SdkError::Transport(te) => te.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-2xx response. `body` may echo prompt text; display uses `sanitized`.
    #[error("http status {status}: {sanitized}")]
    HttpStatus {
        status: u16,
        body: String,
        retry_after_ms: Option<u64>,
        sanitized: String,
    },
    #[error("network: {0}")]
    Network(String),
    #[error("connect timeout after {0:?}")]
    ConnectTimeout(Duration),
    #[error("request timeout after {0:?}")]
    RequestTimeout(Duration),
    #[error("idle read timeout after {0:?}")]
    IdleReadTimeout(Duration),
    #[error("body read error: {0}")]
    BodyRead(String),
    #[error("other: {0}")]
    Other(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            TransportError::HttpStatus { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectTimeout(_)
                | TransportError::RequestTimeout(_)
                | TransportError::IdleReadTimeout(_)
        )
    }
}

/// Short, log-safe rendering of an error body: minified JSON, or just its size.
pub fn display_body_for_error(body: &str) -> String {
    let trimmed = body.trim();
    let looks_like_json = trimmed.starts_with('{') || trimmed.starts_with('[');
    if looks_like_json {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(v) => v.to_string(),
            Err(_) => format!("{} bytes", body.len()),
        }
    } else {
        format!("{} bytes", body.len())
    }
}
