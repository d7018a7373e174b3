//! Small HTTP client core: describe a call, let the pipeline execute it.
//!
//! # Overview
//! Application code describes *what* a network call is with an `Endpoint`
//! (host, path, method, headers, body). A `Client` turns it into an
//! `HttpRequest`, attaches tokens from its `TokenProvider`s, sends it through
//! an injected `Transport`, checks the status and decodes the body.
//!
//! # Design
//! - `Client` is stateless; cross-call state (tokens) lives in providers.
//! - Transport, decoder and token providers are traits, so each piece can be
//!   swapped or faked in tests. `ReqwestTransport` and `JsonDecoder` are the
//!   defaults.
//! - Request building, status checking and decoding are free functions the
//!   client composes, usable on their own.
//!
//! ```no_run
//! use netlayer_core::{Client, EndpointSpec, HttpMethod, ReqwestTransport, TransportConfig};
//!
//! #[derive(serde::Deserialize)]
//! struct Item {
//!     id: u64,
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ReqwestTransport::new(&TransportConfig::default())?);
//! let endpoint = EndpointSpec::new(HttpMethod::Get, "api.example.com", "/items/1");
//! let item: Item = client.request(&endpoint).await?;
//! # let _ = item.id;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod client;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod provider;
pub mod response;
pub mod token;
pub mod transport;

pub use builder::{build_request, build_url};
pub use client::{apply_tokens, Client, ClientBuilder};
pub use decode::{Decoder, JsonDecoder};
pub use endpoint::{Endpoint, EndpointSpec};
pub use error::{BoxError, Error, Result};
pub use http::{CachePolicy, Headers, HttpMethod, HttpRequest, HttpResponse, QueryParameters, UrlScheme};
pub use provider::{ManagedTokenProvider, StaticTokenProvider, TokenProvider, TokenSource};
pub use response::{check_status, decode_body};
pub use token::Token;
pub use transport::{ReqwestTransport, Transport, TransportConfig, TransportError};
