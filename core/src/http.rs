//! HTTP transport boundary for the host-does-IO pattern.
//!
//! # Design
//! Requests are described as plain data (`HttpRequest`). The core never opens
//! a socket: every network round-trip goes through an injected `Transport`,
//! which a host implements with whatever HTTP stack it prefers and which tests
//! replace with canned bodies or synthetic failures.
//!
//! Responses come back as a byte stream; interpreting them is the decoder's
//! job. The remote API reports failures inside a 200 response, so status codes
//! are not part of the contract.

use std::fmt;
use std::io::Read;

use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// An HTTP request described as plain data.
///
/// All fields are owned so a request can be handed to any transport without
/// lifetime concerns.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response body handed back by a transport.
pub type Body = Box<dyn Read>;

/// Capability the client uses to reach the network.
///
/// Implementations own timeouts, TLS and cancellation. A single call is a
/// single attempt; the client never retries.
pub trait Transport {
    /// Perform a GET and return the response body.
    fn get(&self, url: &str) -> Result<Body, TransportError>;

    /// Perform an arbitrary request (used for multipart uploads).
    fn send(&self, request: &HttpRequest) -> Result<Body, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<Body, TransportError> {
        (**self).get(url)
    }

    fn send(&self, request: &HttpRequest) -> Result<Body, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, url: &str) -> Result<Body, TransportError> {
        (**self).get(url)
    }

    fn send(&self, request: &HttpRequest) -> Result<Body, TransportError> {
        (**self).send(request)
    }
}
