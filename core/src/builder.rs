//! Turns an `Endpoint` into a transport-ready `HttpRequest`.
//!
//! # Design
//! Both functions are pure: the same endpoint always produces the same
//! request, whatever was built before. URL assembly follows URL-components
//! rules, so a host carrying URL syntax or a relative path is rejected
//! instead of being silently reinterpreted. The host is emitted exactly as
//! spelled by the endpoint. Path and query values are percent-encoded, query
//! pairs keep the sorted order of `QueryParameters`.

use url::{form_urlencoded, Position, Url};

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::http::HttpRequest;

/// Assemble the absolute URL for `endpoint`.
pub fn build_url<E: Endpoint + ?Sized>(endpoint: &E) -> Result<String> {
    let scheme = endpoint.scheme();
    let host = endpoint.host();
    let path = endpoint.path();

    if host.is_empty() {
        return Err(Error::InvalidUrl(format!("{scheme}://{path}: host is empty")));
    }
    if host
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '?' | '#' | '@' | '%'))
    {
        return Err(Error::InvalidUrl(format!(
            "host {host:?} contains URL delimiters or escapes"
        )));
    }
    // IPv6 literals are bracketed; anything after `]`, or a colon outside
    // brackets, is an embedded port.
    let embeds_port = if host.starts_with('[') {
        !host.ends_with(']')
    } else {
        host.contains(':')
    };
    if embeds_port {
        return Err(Error::InvalidUrl(format!(
            "host {host:?} embeds a port, set it on the endpoint instead"
        )));
    }
    if !path.is_empty() && !path.starts_with('/') {
        return Err(Error::InvalidUrl(format!(
            "path {path:?} must be empty or start with '/'"
        )));
    }

    let mut url = Url::parse(&format!("{scheme}://{host}"))
        .map_err(|e| Error::InvalidUrl(format!("{scheme}://{host}: {e}")))?;

    // The parser maps IP shorthands and IDNs; only ASCII case may differ.
    let parsed_host = url.host_str().unwrap_or_default();
    if !parsed_host.eq_ignore_ascii_case(host) {
        return Err(Error::InvalidUrl(format!(
            "host {host:?} is not a literal host name (parses as {parsed_host:?})"
        )));
    }

    if let Some(port) = endpoint.port() {
        url.set_port(Some(port))
            .map_err(|()| Error::InvalidUrl(format!("{scheme}://{host}: cannot carry port {port}")))?;
    }

    url.set_path(path);

    if let Some(params) = endpoint.query_parameters().filter(|p| !p.is_empty()) {
        // Form encoding writes spaces as `+` and a literal `+` as `%2B`.
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish()
            .replace('+', "%20");
        url.set_query(Some(&query));
    }

    // `Url` lower-cases the host; put the endpoint's spelling back.
    let host_start = url[..Position::BeforeHost].len();
    let mut assembled = String::from(url);
    assembled.replace_range(host_start..host_start + host.len(), host);
    Ok(assembled)
}

/// Build the request for `endpoint`: URL, method, endpoint headers, body and
/// the cache/timeout hints.
pub fn build_request<E: Endpoint + ?Sized>(endpoint: &E) -> Result<HttpRequest> {
    let url = build_url(endpoint)?;
    Ok(HttpRequest {
        url,
        method: endpoint.method(),
        headers: endpoint.headers().cloned().unwrap_or_default(),
        body: endpoint.body().cloned(),
        cache_policy: endpoint.cache_policy(),
        timeout: endpoint.timeout(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::endpoint::EndpointSpec;
    use crate::http::{CachePolicy, HttpMethod, UrlScheme};

    fn items() -> EndpointSpec {
        EndpointSpec::new(HttpMethod::Get, "api.example.com", "/items")
    }

    #[test]
    fn build_request_produces_correct_request() {
        let req = build_request(&items()).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url.as_str(), "https://api.example.com/items");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
        assert!(req.cache_policy.is_none());
        assert!(req.timeout.is_none());
    }

    #[test]
    fn hints_and_body_are_carried_over() {
        let endpoint = EndpointSpec::new(HttpMethod::Put, "api.example.com", "/items/1")
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"name":"a"}"#)
            .with_cache_policy(CachePolicy::ReloadIgnoringLocalCacheData)
            .with_timeout(Duration::from_secs(5));
        let req = build_request(&endpoint).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.headers["Content-Type"], "application/json");
        assert_eq!(req.body.as_deref(), Some(&br#"{"name":"a"}"#[..]));
        assert_eq!(req.cache_policy, Some(CachePolicy::ReloadIgnoringLocalCacheData));
        assert_eq!(req.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn query_pairs_are_sorted_and_encoded() {
        let endpoint = items()
            .with_query("q", "a b&c")
            .with_query("page", "2");
        let url = build_url(&endpoint).unwrap();
        assert_eq!(url, "https://api.example.com/items?page=2&q=a%20b%26c");
    }

    #[test]
    fn empty_query_map_adds_no_question_mark() {
        let mut endpoint = items();
        endpoint.query_parameters = Some(Default::default());
        assert_eq!(build_url(&endpoint).unwrap().as_str(), "https://api.example.com/items");
    }

    #[test]
    fn path_casing_is_preserved_and_unsafe_chars_encoded() {
        let endpoint = EndpointSpec::new(HttpMethod::Get, "api.example.com", "/Items/My File");
        assert_eq!(
            build_url(&endpoint).unwrap().as_str(),
            "https://api.example.com/Items/My%20File"
        );
    }

    #[test]
    fn literal_plus_stays_distinct_from_space() {
        let endpoint = items().with_query("expr", "1+1 = 2");
        assert_eq!(
            build_url(&endpoint).unwrap(),
            "https://api.example.com/items?expr=1%2B1%20%3D%202"
        );
    }

    #[test]
    fn host_casing_is_preserved() {
        let endpoint = EndpointSpec::new(HttpMethod::Get, "API.Example.COM", "/Items")
            .with_port(8443);
        assert_eq!(build_url(&endpoint).unwrap(), "https://API.Example.COM:8443/Items");
    }

    #[test]
    fn hosts_the_parser_would_rewrite_are_invalid() {
        for host in ["api.example.com\\evil", "ex%61mple.com", "127.1", "[0:0::1]"] {
            let endpoint = EndpointSpec::new(HttpMethod::Get, host, "/items");
            assert!(
                matches!(build_url(&endpoint), Err(Error::InvalidUrl(_))),
                "{host} should be rejected"
            );
        }
    }

    #[test]
    fn bracketed_host_with_port_is_invalid() {
        let endpoint = EndpointSpec::new(HttpMethod::Get, "[::1]:8443", "/items");
        assert!(matches!(build_url(&endpoint), Err(Error::InvalidUrl(_))));

        let endpoint = EndpointSpec::new(HttpMethod::Get, "[::1]", "/items").with_port(8443);
        assert_eq!(build_url(&endpoint).unwrap(), "https://[::1]:8443/items");
    }

    #[test]
    fn explicit_port_and_http_scheme() {
        let endpoint = items().with_scheme(UrlScheme::Http).with_port(8080);
        assert_eq!(build_url(&endpoint).unwrap().as_str(), "http://api.example.com:8080/items");
    }

    #[test]
    fn empty_host_is_invalid() {
        let endpoint = EndpointSpec::new(HttpMethod::Get, "", "/items");
        assert!(matches!(build_request(&endpoint), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn host_with_url_syntax_is_invalid() {
        for host in ["api.example.com/evil", "user@api.example.com", "api example.com", "api.example.com:443"] {
            let endpoint = EndpointSpec::new(HttpMethod::Get, host, "/items");
            assert!(
                matches!(build_url(&endpoint), Err(Error::InvalidUrl(_))),
                "{host} should be rejected"
            );
        }
    }

    #[test]
    fn relative_path_is_invalid() {
        let endpoint = EndpointSpec::new(HttpMethod::Get, "api.example.com", "items");
        assert!(matches!(build_url(&endpoint), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn building_is_deterministic() {
        let endpoint = items().with_query("b", "2").with_query("a", "1").with_header("X", "y");
        assert_eq!(build_request(&endpoint).unwrap(), build_request(&endpoint).unwrap());
    }
}
