//! Upstream HTTP client construction.
//!
//! The client is built once from [`UpstreamConfig`] and handed to the
//! [`Forwarder`](super::Forwarder); nothing else creates one.

use std::time::Duration;

use reqwest::redirect::Policy;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;

/// Build the shared upstream client: redirect bound, connect timeout, pooling.
///
/// Compressed responses are decoded by the client, so the forwarder never
/// negotiates `Accept-Encoding` itself.
pub fn build_client(config: &UpstreamConfig) -> Result<reqwest::Client, ProxyError> {
    let mut builder = reqwest::Client::builder()
        .redirect(Policy::limited(config.max_redirects))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .referer(false);

    if !config.system_proxy {
        builder = builder.no_proxy();
    }

    builder.build().map_err(ProxyError::ClientBuild)
}
