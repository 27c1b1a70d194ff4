//! Error types for request construction, dispatch and decoding.
//!
//! # Design
//! Construction failures (`ConstructionError`) are returned synchronously by
//! `RequestBuilder::build` and never reach the dispatch path. Everything that
//! can go wrong during a dispatch is folded into `Error`, which is delivered
//! only through the result of `perform` (or the callback argument):
//!
//! - `Transport` wraps whatever the transport reported (connectivity, TLS,
//!   timeout) without looking inside it.
//! - `Network` is derived purely from a non-2xx status code.
//! - `Decode` is only produced by the typed-decode path.

use std::borrow::Cow;

use thiserror::Error;

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A `Request` could not be built.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// The resource path is empty or does not start with `/`.
    #[error("Invalid resource path: {0:?}")]
    InvalidResourcePath(String),

    /// The configuration and path do not combine into a valid URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Opaque failure reported by a `Transport`.
#[derive(Debug, Error)]
#[error("{inner}")]
pub struct TransportError {
    #[source]
    inner: Box<dyn std::error::Error + Send + Sync>,
}

impl TransportError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            inner: error.into(),
        }
    }

    /// The transport's own error.
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.inner
    }
}

/// A non-2xx HTTP status, classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// Any status without a dedicated variant.
    #[error("Generic error.")]
    Generic,

    /// 400
    #[error("Bad request.")]
    BadRequest,

    /// 401
    #[error("Unauthorized.")]
    Unauthorized,

    /// 403
    #[error("Access denied.")]
    Forbidden,

    /// 404
    #[error("Resource not found.")]
    NotFound,

    /// 500
    #[error("Internal server error.")]
    InternalServerError,

    /// A description supplied by the backend, reported verbatim.
    #[error("{0}")]
    WithDescription(String),
}

impl NetworkError {
    /// Classify an HTTP status code. Total: unmapped codes are `Generic`.
    pub fn identifying(status_code: u16) -> Self {
        match status_code {
            400 => NetworkError::BadRequest,
            401 => NetworkError::Unauthorized,
            403 => NetworkError::Forbidden,
            404 => NetworkError::NotFound,
            500 => NetworkError::InternalServerError,
            _ => NetworkError::Generic,
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> Cow<'_, str> {
        match self {
            NetworkError::WithDescription(text) => Cow::Borrowed(text.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// The status code this variant stands for, if it stands for exactly one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetworkError::BadRequest => Some(400),
            NetworkError::Unauthorized => Some(401),
            NetworkError::Forbidden => Some(403),
            NetworkError::NotFound => Some(404),
            NetworkError::InternalServerError => Some(500),
            NetworkError::Generic | NetworkError::WithDescription(_) => None,
        }
    }
}

/// The wire call succeeded but the body did not meet expectations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The response carried no body, or an empty one.
    #[error("Response contained no data to decode")]
    NoData,

    /// The body could not be decoded into the target type.
    #[error("Malformed response body: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Terminal failure of a single dispatch.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl Error {
    /// The classified status error, if this is one.
    pub fn as_network(&self) -> Option<&NetworkError> {
        match self {
            Error::Network(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }
}
