//! Request forwarding to the target site.
//!
//! # Responsibilities
//! - Rebuild the inbound request for the target (headers, body, URL)
//! - Bound the wait for the upstream response head
//! - Hand back status, headers, final URL and an unconsumed body stream
//!
//! # Design Decisions
//! - `Host` is derived by the client from the target URL on every hop, so a
//!   cross-host redirect never carries a stale `Host`
//! - `Origin` is pinned to the requested target's origin and, unlike
//!   `Host`, keeps that value on every redirect hop, cross-host included
//! - GET/HEAD never carry a body upstream; other bodies are read up to a
//!   configured limit before sending
//! - No retries: a failed fetch is reported once

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{
    HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_LENGTH, HOST, ORIGIN, USER_AGENT,
};
use axum::http::{Method, StatusCode};
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::routing::TargetUrl;
use crate::security::strip_hop_by_hop;
use crate::upstream::client::build_client;

/// Upstream body bytes, consumed at most once.
pub type BodyStream = BoxStream<'static, Result<Bytes, reqwest::Error>>;

/// An inbound request on its way to the target.
pub struct ProxyRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

impl ProxyRequest {
    pub fn new(method: Method, headers: HeaderMap, body: Option<Body>) -> Self {
        Self {
            method,
            headers,
            body,
        }
    }
}

/// What the target answered.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// URL the response was served from, after redirects.
    pub final_url: Url,
    pub body: BodyStream,
}

impl UpstreamResponse {
    fn from_reqwest(mut response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            headers: std::mem::take(response.headers_mut()),
            final_url: response.url().clone(),
            body: response.bytes_stream().boxed(),
        }
    }
}

/// Methods that conventionally carry a request body.
pub fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

/// Issues upstream requests through an explicitly configured client.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    response_timeout: Duration,
    max_request_body: usize,
    user_agent: Option<HeaderValue>,
}

impl Forwarder {
    /// Wrap a caller-built client.
    pub fn new(client: reqwest::Client, response_timeout: Duration, max_request_body: usize) -> Self {
        Self {
            client,
            response_timeout,
            max_request_body,
            user_agent: None,
        }
    }

    /// Build the client and forwarder from configuration.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        let client = build_client(config)?;
        let mut forwarder = Self::new(
            client,
            Duration::from_secs(config.response_timeout_secs),
            config.max_request_body_bytes,
        );
        if !config.user_agent.is_empty() {
            forwarder.user_agent = HeaderValue::from_str(&config.user_agent).ok();
        }
        Ok(forwarder)
    }

    /// Deadline for the response head, reused for buffered bodies.
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Send `request` to `target` and wait for the response head.
    pub async fn forward(
        &self,
        request: ProxyRequest,
        target: &TargetUrl,
    ) -> Result<UpstreamResponse, ProxyError> {
        let ProxyRequest {
            method,
            headers,
            body,
        } = request;

        let headers = self.outbound_headers(headers, target);
        let mut builder = self
            .client
            .request(method.clone(), target.as_url().clone())
            .headers(headers);

        if carries_body(&method) {
            if let Some(body) = body {
                let bytes = axum::body::to_bytes(body, self.max_request_body)
                    .await
                    .map_err(|_| ProxyError::RequestBody(self.max_request_body))?;
                builder = builder.body(bytes);
            }
        }

        let response = match tokio::time::timeout(self.response_timeout, builder.send()).await {
            Ok(result) => result.map_err(ProxyError::upstream)?,
            Err(_) => return Err(ProxyError::UpstreamTimeout(self.response_timeout.as_secs())),
        };

        Ok(UpstreamResponse::from_reqwest(response))
    }

    fn outbound_headers(&self, mut headers: HeaderMap, target: &TargetUrl) -> HeaderMap {
        strip_hop_by_hop(&mut headers);
        headers.remove(HOST);
        headers.remove(ACCEPT_ENCODING);
        // Recomputed from the buffered body, absent for GET/HEAD.
        headers.remove(CONTENT_LENGTH);

        match HeaderValue::from_str(&target.origin()) {
            Ok(origin) => {
                headers.insert(ORIGIN, origin);
            }
            Err(_) => {
                headers.remove(ORIGIN);
            }
        }

        if let Some(user_agent) = &self.user_agent {
            headers.insert(USER_AGENT, user_agent.clone());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::resolve_target;

    fn forwarder() -> Forwarder {
        Forwarder::from_config(&UpstreamConfig::default()).unwrap()
    }

    fn inbound() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("proxy.local:8080"));
        headers.insert(ORIGIN, HeaderValue::from_static("http://proxy.local:8080"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("5"));
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("x-custom", HeaderValue::from_static("kept"));
        headers
    }

    #[test]
    fn origin_pinned_and_host_dropped() {
        let target = resolve_target("https://example.com:8443/a").unwrap();
        let headers = forwarder().outbound_headers(inbound(), &target);

        assert_eq!(headers[ORIGIN], "https://example.com:8443");
        assert!(!headers.contains_key(HOST));
        assert!(!headers.contains_key(ACCEPT_ENCODING));
        assert!(!headers.contains_key(CONTENT_LENGTH));
        assert!(!headers.contains_key("connection"));
        assert_eq!(headers["x-custom"], "kept");
    }

    #[test]
    fn configured_user_agent_overrides_client() {
        let config = UpstreamConfig {
            user_agent: "site-proxy/1".into(),
            ..UpstreamConfig::default()
        };
        let forwarder = Forwarder::from_config(&config).unwrap();
        let target = resolve_target("https://example.com/").unwrap();
        let mut inbound = inbound();
        inbound.insert(USER_AGENT, HeaderValue::from_static("browser"));

        let headers = forwarder.outbound_headers(inbound, &target);
        assert_eq!(headers[USER_AGENT], "site-proxy/1");
    }

    #[test]
    fn body_methods() {
        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::HEAD));
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::PUT));
        assert!(carries_body(&Method::DELETE));
    }
}
