//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, in-flight limit, CORS)
//! - Build the upstream client once and share it across requests
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ProxyConfig, RewriteConfig};
use crate::error::ProxyError;
use crate::http::pages;
use crate::http::proxy::proxy_handler;
use crate::http::request::{request_id, UuidRequestId};
use crate::routing::ProxyPrefix;
use crate::security::{in_flight_middleware, InFlightLimit};
use crate::upstream::Forwarder;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
    pub prefix: Arc<ProxyPrefix>,
    pub rewrite: Arc<RewriteConfig>,
    /// Landing page rendered once for the configured prefix.
    pub landing: Arc<str>,
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let prefix = ProxyPrefix::new(config.proxy.prefix.clone());
        let landing = pages::render_landing(prefix.as_str());
        Ok(Self {
            forwarder: Forwarder::from_config(&config.upstream)?,
            prefix: Arc::new(prefix),
            rewrite: Arc::new(config.rewrite.clone()),
            landing: landing.into(),
        })
    }
}

/// HTTP server for the site proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let state = AppState::from_config(&config)?;
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let prefix = state.prefix.clone();
        let limit = Arc::new(InFlightLimit::new(config.listener.max_in_flight_requests));

        let mut router = Router::new()
            .route("/", get(pages::landing))
            .route("/healthz", get(pages::healthz))
            .route(&prefix.route_pattern(), any(proxy_handler))
            .route(prefix.as_str(), any(proxy_handler));
        if let Some(bare) = prefix.as_str().strip_suffix('/') {
            router = router.route(bare, any(proxy_handler));
        }

        let router = router
            .with_state(state)
            .layer(middleware::from_fn_with_state(limit, in_flight_middleware))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            request_id = %request_id(request.headers()),
                            method = %request.method(),
                            uri = %request.uri(),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            );

        if config.cors.enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.config.proxy.prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}
