//! Synchronous client core for the Flickr REST API.
//!
//! # Overview
//! Signs request arguments, builds signed GET URLs and multipart upload
//! bodies, decodes the `<rsp>` XML envelope into typed results or structured
//! errors, and tracks asynchronous upload tickets. The network is reached only
//! through an injected [`Transport`], so the whole pipeline runs in tests
//! without sockets.
//!
//! # Design
//! - `FlickrClient` owns credentials, endpoints and the transport; the auth
//!   token is the only field that changes after construction.
//! - `RequestBuilder` produces requests as plain data (`HttpRequest` or a
//!   URL string); nothing in it performs I/O.
//! - Decoding first reads the envelope status, then the method payload, so an
//!   error response can never be mistaken for an empty success.
//! - Upload polling is a pure state machine (`UploadState::advance`) driven by
//!   repeated `check_tickets` calls made by the host.

pub mod args;
pub mod client;
pub mod config;
mod decode;
pub mod error;
pub mod http;
pub mod multipart;
pub mod request;
pub mod tickets;
pub mod types;
mod wire;

pub use args::{sign, ArgumentSet};
pub use client::FlickrClient;
pub use config::{Credentials, Endpoints};
pub use error::{DateError, FlickrError, MultipartError, Result, TransportError};
pub use http::{Body, HttpMethod, HttpRequest, Transport};
pub use request::RequestBuilder;
pub use tickets::{TicketTracker, UploadState};
pub use types::{
    AuthToken, Dates, ImageSize, InfoResult, Note, Owner, Perms, Photo, PhotoSet, PhotoUrl,
    SearchResult, Size, SizesResult, Tag, TicketStatus, User, Visibility,
};
