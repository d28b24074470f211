// src/error.rs
//! Fixed error kinds crossing component boundaries.
//!
//! Every fallible operation in the pipeline returns one of these enums; a bare
//! string error or a panic never crosses a module boundary. Connector failures
//! degrade gracefully upstream, generation failures propagate verbatim so the
//! caller can build a user-facing message from the classified kind.

use std::fmt;

use thiserror::Error;

/// Failure kinds produced by source connectors.
///
/// `Display` and `Error` are implemented by hand: the `source` fields here
/// name the connector (a plain `&str`), which thiserror's derive would
/// otherwise insist on treating as the error-chain source.
#[derive(Debug)]
pub enum FetchError {
    /// The credential the connector needs is not configured. Kept distinct
    /// from network errors since it is the most common misconfiguration.
    MissingCredential(&'static str),

    /// Upstream told us to slow down.
    RateLimited { source: &'static str },

    /// The upstream responded but the payload did not have a usable shape.
    InvalidResponse { source: &'static str, reason: String },

    /// The request itself failed (DNS, TLS, connection reset).
    Request {
        source: &'static str,
        cause: reqwest::Error,
    },

    /// The request exceeded its deadline. Distinct so a caller can decide to
    /// retry; never surfaces as an unhandled hang.
    Timeout { source: &'static str },

    /// The connector ran successfully but produced nothing, and for this
    /// connector absence of data is a failure (social timeline only).
    NoData { source: &'static str },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::MissingCredential(var) => write!(f, "missing credential: set {var}"),
            FetchError::RateLimited { source } => write!(f, "{source} rate limited the request"),
            FetchError::InvalidResponse { source, reason } => {
                write!(f, "invalid response from {source}: {reason}")
            }
            FetchError::Request { source, .. } => write!(f, "request to {source} failed"),
            FetchError::Timeout { source } => write!(f, "request to {source} timed out"),
            FetchError::NoData { source } => write!(f, "no data available from {source}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Request { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

impl FetchError {
    /// Classify a transport-level reqwest error, separating timeouts.
    pub fn from_reqwest(source: &'static str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout { source }
        } else {
            FetchError::Request { source, cause: e }
        }
    }
}

/// Failure kinds produced by the generation client.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 401/403 from the backend: key missing, expired or not permitted.
    #[error("generation backend rejected the credential")]
    Unauthorized,

    /// 429 from the backend. The client never retries by itself; the caller
    /// decides whether a backoff-and-retry is worth it.
    #[error("generation backend rate limited the request")]
    RateLimited,

    /// 404 from the backend: the configured model name does not exist.
    #[error("model {0:?} not found on the generation backend")]
    ModelNotFound(String),

    /// The response arrived but carried no usable text content block.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// The text block was present but was not the JSON shape we asked for.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// Transport-level failure talking to the backend.
    #[error("generation request failed")]
    Request(#[from] reqwest::Error),

    /// Anything else, with the raw status so the caller can log it.
    #[error("generation backend error ({status}): {message}")]
    Unknown { status: u16, message: String },
}

/// Failure kinds produced by the output store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("writing batch to {path}")]
    Write {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("reading batch from {path}")]
    Read {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("batch file {path} is not valid JSON")]
    Corrupt {
        path: String,
        #[source]
        cause: serde_json::Error,
    },
}

/// Malformed or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config from {path}")]
    Read {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("parsing config at {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid config value: {0}")]
    Invalid(String),
}
