//! Endpoint descriptors.
//!
//! An endpoint says *what* a network call is: where it goes, which method it
//! uses and what it carries. The `Endpoint` trait supplies defaults for
//! everything except host, path and method, so application types only spell
//! out what differs. `EndpointSpec` is a ready-made value type for callers
//! that prefer data over a dedicated type per call.

use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;

use crate::http::{CachePolicy, Headers, HttpMethod, QueryParameters, UrlScheme};

/// Description of one logical network call.
pub trait Endpoint {
    fn host(&self) -> &str;

    fn path(&self) -> &str;

    fn method(&self) -> HttpMethod;

    fn scheme(&self) -> UrlScheme {
        UrlScheme::Https
    }

    /// Explicit port. `None` uses the scheme's default.
    fn port(&self) -> Option<u16> {
        None
    }

    fn headers(&self) -> Option<&Headers> {
        None
    }

    fn query_parameters(&self) -> Option<&QueryParameters> {
        None
    }

    fn body(&self) -> Option<&Bytes> {
        None
    }

    fn cache_policy(&self) -> Option<CachePolicy> {
        None
    }

    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Endpoint described entirely by its field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    pub scheme: UrlScheme,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub method: HttpMethod,
    pub headers: Option<Headers>,
    pub query_parameters: Option<QueryParameters>,
    pub body: Option<Bytes>,
    pub cache_policy: Option<CachePolicy>,
    pub timeout: Option<Duration>,
}

impl EndpointSpec {
    pub fn new(method: HttpMethod, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: UrlScheme::Https,
            host: host.into(),
            port: None,
            path: path.into(),
            method,
            headers: None,
            query_parameters: None,
            body: None,
            cache_policy: None,
            timeout: None,
        }
    }

    pub fn with_scheme(mut self, scheme: UrlScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_header(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(field.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters
            .get_or_insert_with(QueryParameters::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `payload` as the JSON body and set `Content-Type` accordingly.
    pub fn with_json_body<T: Serialize + ?Sized>(self, payload: &T) -> serde_json::Result<Self> {
        let body = serde_json::to_vec(payload)?;
        Ok(self
            .with_header("Content-Type", "application/json")
            .with_body(body))
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = Some(policy);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Endpoint for EndpointSpec {
    fn host(&self) -> &str {
        &self.host
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> HttpMethod {
        self.method
    }

    fn scheme(&self) -> UrlScheme {
        self.scheme
    }

    fn port(&self) -> Option<u16> {
        self.port
    }

    fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    fn query_parameters(&self) -> Option<&QueryParameters> {
        self.query_parameters.as_ref()
    }

    fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    fn cache_policy(&self) -> Option<CachePolicy> {
        self.cache_policy
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
