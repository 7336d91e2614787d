//! Error types for the Flickr API client.
//!
//! # Design
//! Callers branch on the kind of failure, never on message text. A failed
//! round-trip is a `Transport` error, a body that is not the expected XML is a
//! `Decode` error, and an explicit `stat="fail"` envelope is an `Api` error
//! carrying the remote code and message verbatim. `Request` covers the one
//! local step that can fail before anything is sent: writing the multipart
//! upload body.
//!
//! Date conversion has its own `DateError` so a malformed date never poisons
//! an otherwise successful decode.

use std::error::Error as StdError;

use thiserror::Error;

use crate::http::HttpMethod;

/// Errors returned by `FlickrClient` operations.
#[derive(Debug, Error)]
pub enum FlickrError {
    /// The transport could not complete the round-trip.
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: HttpMethod,
        url: String,
        #[source]
        source: TransportError,
    },

    /// The response body was not the XML shape we expected.
    #[error("decoding {context} failed: {message}")]
    Decode {
        context: &'static str,
        message: String,
    },

    /// The remote service answered with `stat="fail"`.
    #[error("API error, code {code}: {message}")]
    Api { code: u32, message: String },

    /// The upload body could not be assembled.
    #[error("building upload request failed: {0}")]
    Request(#[from] MultipartError),
}

impl FlickrError {
    pub(crate) fn decode(context: &'static str, err: impl ToString) -> Self {
        FlickrError::Decode {
            context,
            message: err.to_string(),
        }
    }

    /// Remote error code, if the service reported one.
    pub fn api_code(&self) -> Option<u32> {
        match self {
            FlickrError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FlickrError>;

/// Failure reported by a `Transport` implementation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(Box<dyn StdError + Send + Sync>);

impl TransportError {
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err)
    }
}

/// Failure while writing a multipart body.
#[derive(Debug, Error)]
pub enum MultipartError {
    #[error("field write failed [{name}]: {source}")]
    Field {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("form file creation failed [{filename}]: {source}")]
    File {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} contains characters not allowed in a part header: {value:?}")]
    InvalidHeaderValue { what: &'static str, value: String },
}

/// Failure converting a stored date string into a timestamp.
#[derive(Debug, Error)]
pub enum DateError {
    #[error("{field} is empty")]
    Missing { field: &'static str },

    #[error("{field} is not a unix timestamp: {value:?}")]
    Timestamp { field: &'static str, value: String },

    #[error("{field} is not a date-time: {value:?}")]
    Format {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
