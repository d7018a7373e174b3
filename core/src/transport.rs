//! Transports: the part that actually talks to the network.
//!
//! # Design
//! The client only needs `send(request) -> response`. Anything that can
//! execute an `HttpRequest` (a real HTTP stack, an in-process fake, a
//! recording proxy) implements `Transport`. `ReqwestTransport` is the default
//! implementation. Status codes are returned as data, never as errors; the
//! client decides what counts as success.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::trace;

use crate::error::BoxError;
use crate::http::{CachePolicy, Headers, HttpMethod, HttpRequest, HttpResponse};

/// Why a transport produced no response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be turned into a wire request.
    #[error("invalid request: {message}")]
    InvalidRequest {
        message: String,
        #[source]
        source: BoxError,
    },

    /// Connection, TLS, timeout or body-read failure.
    #[error("connection failed: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl TransportError {
    pub fn connection(message: impl Into<String>) -> Self {
        TransportError::Connection {
            message: message.into(),
            source: None,
        }
    }
}

/// Executes built requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Settings for `ReqwestTransport`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Applied to requests whose endpoint sets no timeout of its own.
    #[serde(with = "seconds")]
    pub request_timeout: Duration,
    #[serde(with = "seconds")]
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 32,
            user_agent: concat!("netlayer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Default transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| TransportError::Connection {
                message: "failed to initialize HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn wire_request(&self, request: &HttpRequest) -> Result<reqwest::Request, TransportError> {
        let mut builder = self
            .client
            .request(wire_method(request.method), request.url.as_str());

        for (field, value) in &request.headers {
            builder = builder.header(field.as_str(), value.as_str());
        }
        if request.cache_policy == Some(CachePolicy::ReloadIgnoringLocalCacheData)
            && !request
                .headers
                .keys()
                .any(|k| k.eq_ignore_ascii_case("cache-control"))
        {
            builder = builder.header("Cache-Control", "no-cache");
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        builder.build().map_err(|e| TransportError::InvalidRequest {
            message: format!("{} {}", request.method, request.url),
            source: Box::new(e),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let wire = self.wire_request(request)?;
        let response = self
            .client
            .execute(wire)
            .await
            .map_err(|e| connection_error(request, e))?;

        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| connection_error(request, e))?;

        trace!(status, bytes = body.len(), "response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn connection_error(request: &HttpRequest, e: reqwest::Error) -> TransportError {
    TransportError::Connection {
        message: format!("{} {}", request.method, request.url),
        source: Some(Box::new(e)),
    }
}

fn wire_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Connect => reqwest::Method::CONNECT,
        HttpMethod::Options => reqwest::Method::OPTIONS,
        HttpMethod::Trace => reqwest::Method::TRACE,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}
