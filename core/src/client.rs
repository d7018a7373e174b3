//! The request pipeline.
//!
//! # Design
//! `Client` holds a transport, a decoder and an ordered list of token
//! providers, and no mutable state of its own. One `request` call walks the
//! pipeline once, strictly in order:
//!
//! 1. build the `HttpRequest` from the endpoint
//! 2. ask every token provider for its token, one after the other
//! 3. merge token headers in provider order, later providers winning
//! 4. send through the transport
//! 5. reject statuses outside `200..=299`
//! 6. decode the body
//!
//! Every failure ends the call. Nothing is retried or cached here; tokens are
//! gathered before any header is touched, so a failing provider never leaves
//! a partially authenticated request behind.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::builder::build_request;
use crate::decode::{Decoder, JsonDecoder};
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::provider::TokenProvider;
use crate::response::{check_status, decode_body};
use crate::token::Token;
use crate::transport::Transport;

/// Executes endpoints through a transport and decodes the results.
#[derive(Clone)]
pub struct Client<T, D = JsonDecoder> {
    transport: T,
    decoder: D,
    token_providers: Vec<Arc<dyn TokenProvider>>,
}

impl<T: Transport> Client<T> {
    /// A client with no token providers and the JSON decoder.
    pub fn new(transport: T) -> Self {
        ClientBuilder::new(transport).build()
    }

    pub fn builder(transport: T) -> ClientBuilder<T> {
        ClientBuilder::new(transport)
    }
}

impl<T: Transport, D: Decoder> Client<T, D> {
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn token_providers(&self) -> &[Arc<dyn TokenProvider>] {
        &self.token_providers
    }

    /// Execute `endpoint` and decode the body into `R`.
    pub async fn request<R: DeserializeOwned>(&self, endpoint: &impl Endpoint) -> Result<R> {
        let response = self.send(endpoint).await?;
        decode_body(&self.decoder, &response)
    }

    /// Execute `endpoint` and return the successful response undecoded.
    pub async fn send(&self, endpoint: &impl Endpoint) -> Result<HttpResponse> {
        let mut request = build_request(endpoint)?;
        let tokens = self.collect_tokens().await?;
        apply_tokens(&mut request, &tokens);

        debug!(
            method = %request.method,
            url = %request.url,
            tokens = tokens.len(),
            "dispatching request"
        );
        let response = self.transport.send(&request).await?;
        debug!(status = response.status, bytes = response.body.len(), "response received");

        check_status(&response)?;
        Ok(response)
    }

    /// One `get_token` per provider, in order. The first failure aborts.
    pub async fn collect_tokens(&self) -> Result<Vec<Token>> {
        let mut tokens = Vec::with_capacity(self.token_providers.len());
        for provider in &self.token_providers {
            let token = provider.get_token().await.map_err(Error::TokenProvider)?;
            tokens.push(token);
        }
        Ok(tokens)
    }
}

impl<T, D> fmt::Debug for Client<T, D>
where
    T: fmt::Debug,
    D: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport)
            .field("decoder", &self.decoder)
            .field("token_providers", &self.token_providers.len())
            .finish()
    }
}

/// Set each token's header on `request`, in order.
///
/// Tokens without a value are skipped rather than sent empty. Header fields
/// compare case-insensitively, so a later token replaces an earlier header
/// whatever its spelling.
pub fn apply_tokens(request: &mut HttpRequest, tokens: &[Token]) {
    for token in tokens {
        let Some(value) = token.value() else {
            continue;
        };
        let field = token.header_field();
        request.headers.retain(|k, _| !k.eq_ignore_ascii_case(field));
        request.headers.insert(field.to_string(), value.to_string());
    }
}

/// Assembles a `Client`.
pub struct ClientBuilder<T, D = JsonDecoder> {
    transport: T,
    decoder: D,
    token_providers: Vec<Arc<dyn TokenProvider>>,
}

impl<T: Transport> ClientBuilder<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: JsonDecoder,
            token_providers: Vec::new(),
        }
    }
}

impl<T: Transport, D: Decoder> ClientBuilder<T, D> {
    /// Append a provider. Providers are consulted in the order added.
    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_providers.push(provider);
        self
    }

    pub fn token_providers(
        mut self,
        providers: impl IntoIterator<Item = Arc<dyn TokenProvider>>,
    ) -> Self {
        self.token_providers.extend(providers);
        self
    }

    /// Replace the body decoder.
    pub fn decoder<D2: Decoder>(self, decoder: D2) -> ClientBuilder<T, D2> {
        ClientBuilder {
            transport: self.transport,
            decoder,
            token_providers: self.token_providers,
        }
    }

    pub fn build(self) -> Client<T, D> {
        Client {
            transport: self.transport,
            decoder: self.decoder,
            token_providers: self.token_providers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_request;
    use crate::endpoint::EndpointSpec;
    use crate::http::HttpMethod;

    fn request() -> HttpRequest {
        let endpoint = EndpointSpec::new(HttpMethod::Get, "api.example.com", "/items")
            .with_header("Accept", "application/json");
        build_request(&endpoint).unwrap()
    }

    #[test]
    fn no_tokens_leaves_endpoint_headers_alone() {
        let mut req = request();
        apply_tokens(&mut req, &[]);
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.headers["Accept"], "application/json");
    }

    #[test]
    fn later_token_wins_on_same_field() {
        let mut req = request();
        apply_tokens(&mut req, &[Token::bearer("first"), Token::bearer("second")]);
        assert_eq!(req.headers["Authorization"], "Bearer second");
    }

    #[test]
    fn valueless_token_adds_nothing() {
        let mut req = request();
        apply_tokens(&mut req, &[Token::empty("X-Api-Key")]);
        assert!(!req.headers.contains_key("X-Api-Key"));
    }

    #[test]
    fn valueless_token_does_not_clear_earlier_header() {
        let mut req = request();
        apply_tokens(&mut req, &[Token::bearer("kept"), Token::empty("Authorization")]);
        assert_eq!(req.headers["Authorization"], "Bearer kept");
    }

    #[test]
    fn token_replaces_header_regardless_of_case() {
        let endpoint = EndpointSpec::new(HttpMethod::Get, "api.example.com", "/items")
            .with_header("authorization", "Basic old");
        let mut req = build_request(&endpoint).unwrap();
        apply_tokens(&mut req, &[Token::bearer("new")]);
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.headers["Authorization"], "Bearer new");
    }
}
