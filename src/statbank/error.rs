use thiserror::Error;

/// Errors that can occur when talking to the Statbank API
#[derive(Debug, Error)]
pub enum StatbankError {
    /// Any failure while performing a request: transport, HTTP status or body decoding
    #[error("Statbank request to '{endpoint}' failed: {cause}")]
    RemoteService {
        endpoint: String,
        #[source]
        cause: RemoteCause,
    },

    /// An internal caller asked for an HTTP method other than GET or POST
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The response could not be reshaped into a tabular frame
    #[error("Cannot build tabular frame: {0}")]
    Reshape(String),

    /// Polars rejected the frame
    #[error("Frame error: {0}")]
    Frame(#[from] polars::error::PolarsError),

    /// Configuration error (invalid base URL, HTTP client setup, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Underlying cause of a [`StatbankError::RemoteService`]
#[derive(Debug, Error)]
pub enum RemoteCause {
    /// No HTTP response was obtained (connection refused, timeout, TLS, ...)
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The service answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not valid JSON for the expected type
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Valid JSON, but not shaped like the endpoint's documented answer
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl StatbankError {
    /// Build a `RemoteService` error for an endpoint
    pub fn remote(endpoint: impl Into<String>, cause: RemoteCause) -> Self {
        StatbankError::RemoteService {
            endpoint: endpoint.into(),
            cause,
        }
    }

    /// HTTP status reported by the service, if the failure was a status error
    pub fn status(&self) -> Option<u16> {
        match self {
            StatbankError::RemoteService {
                cause: RemoteCause::Status { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }

    /// True for any failure of the remote call itself
    pub fn is_remote(&self) -> bool {
        matches!(self, StatbankError::RemoteService { .. })
    }
}

/// Type alias for Results using StatbankError
pub type Result<T> = std::result::Result<T, StatbankError>;
