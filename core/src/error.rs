//! Error types for the request pipeline.
//!
//! # Design
//! One flat enum covers every way a `Client::request` call can fail. None of
//! the variants is retried by the client. Variants that wrap a lower-level
//! failure keep it as `source` so callers can walk the error chain.

use thiserror::Error;

use crate::transport::TransportError;

/// Boxed error used at the collaborator seams (token providers, decoders).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by `Client`.
#[derive(Debug, Error)]
pub enum Error {
    /// Scheme, host, port, path and query could not form an absolute URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request was rejected before it reached the network.
    #[error("client error: {}", .message.as_deref().unwrap_or("request rejected"))]
    ClientError {
        message: Option<String>,
        #[source]
        source: BoxError,
    },

    /// The transport failed to produce a usable response.
    #[error("no response: {}", .message.as_deref().unwrap_or("transport failed"))]
    NoResponse {
        message: Option<String>,
        #[source]
        source: Option<BoxError>,
    },

    /// The server answered with a status outside `200..=299`.
    #[error("HTTP {status_code}{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    GeneralError {
        status_code: u16,
        message: Option<String>,
    },

    /// The response body could not be decoded into the requested type.
    #[error("decoding failed: {message}")]
    Decoding {
        message: String,
        #[source]
        source: BoxError,
    },

    /// A token provider failed to supply a token.
    #[error("token provider failed: {0}")]
    TokenProvider(#[source] BoxError),
}

impl Error {
    /// HTTP status carried by `GeneralError`, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::GeneralError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// A request the transport refused to build is a client error; every other
/// transport failure means there is no response.
impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        let message = Some(e.to_string());
        if matches!(e, TransportError::InvalidRequest { .. }) {
            Error::ClientError {
                message,
                source: Box::new(e),
            }
        } else {
            Error::NoResponse {
                message,
                source: Some(Box::new(e)),
            }
        }
    }
}
