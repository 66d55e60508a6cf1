//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the site proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, in-flight limit).
    pub listener: ListenerConfig,

    /// Routing prefix for proxied targets.
    pub proxy: PrefixConfig,

    /// Upstream client settings (timeouts, redirects, pooling).
    pub upstream: UpstreamConfig,

    /// HTML/CSS rewriting settings.
    pub rewrite: RewriteConfig,

    /// CORS middleware settings.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum requests handled concurrently (backpressure).
    pub max_in_flight_requests: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_in_flight_requests: 1024,
        }
    }
}

/// Routing prefix configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrefixConfig {
    /// Path prefix preceding every encoded target URL. Must start and end with `/`.
    pub prefix: String,
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self {
            prefix: "/proxy/".to_string(),
        }
    }
}

/// Upstream client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Time allowed for the upstream to return a response head, in seconds.
    pub response_timeout_secs: u64,

    /// Redirects followed before the fetch is treated as failed.
    pub max_redirects: usize,

    /// Idle pooled connections are closed after this many seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle pooled connections kept per upstream host.
    pub pool_max_idle_per_host: usize,

    /// Largest request body forwarded upstream, in bytes.
    pub max_request_body_bytes: usize,

    /// User-Agent sent upstream. Empty forwards the client's own.
    pub user_agent: String,

    /// Honor HTTP(S)_PROXY environment variables for upstream connections.
    pub system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            response_timeout_secs: 30,
            max_redirects: 2,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 32,
            max_request_body_bytes: 10 * 1024 * 1024, // 10MB
            user_agent: String::new(),
            system_proxy: false,
        }
    }
}

/// Content rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Largest HTML body buffered for rewriting. Larger bodies are streamed untouched.
    pub max_html_bytes: usize,

    /// Resolve references against the post-redirect URL instead of the requested one.
    pub base_from_final_url: bool,

    /// Rewrite `url()` tokens inside `style="..."` attributes too.
    pub rewrite_style_attributes: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            max_html_bytes: 10 * 1024 * 1024, // 10MB
            base_from_final_url: true,
            rewrite_style_attributes: true,
        }
    }
}

/// CORS middleware configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Wrap the router in a permissive CORS layer.
    pub enabled: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
