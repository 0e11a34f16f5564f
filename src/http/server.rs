//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the configured deployment profile
//! - Compose the interceptor chain in a fixed order
//! - Attach per-route rate limiting and bearer auth
//! - Serve over plain TCP or rustls, with graceful shutdown
//!
//! # Interceptor order (outermost first)
//! ```text
//! set request id → trace → propagate request id
//!     → [hardened] security headers → [hardened+production] HTTPS redirect → [hardened] CORS
//!     → JSON error bodies → timeout → body limit
//!     → route: metrics
//!         → [hardened] rate limit on "/", bearer auth on "/api/v1/portfolio"
//!         → handler
//! ```
//!
//! Metrics sit inside routing so the matched route template is known; requests
//! stopped by an outer layer (redirect, preflight, timeout) are not counted.
//! Unknown paths and methods land on JSON fallbacks, so every error response
//! has a `{"detail": ...}` body.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{DeploymentProfile, GatewayConfig};
use crate::http::{docs, error, request, routes};
use crate::observability::metrics;
use crate::portfolio::{PortfolioProvider, PortfolioService};
use crate::security::{
    auth::require_bearer,
    cors::cors_layer,
    headers::security_headers_middleware,
    rate_limit::rate_limit_middleware,
    redirect::{https_redirect_middleware, HttpsRedirect},
    Authenticator, FixedWindowLimiter, RateLimitState,
};

/// How long TLS connections get to finish after shutdown is triggered.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: PortfolioService,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    limiter: Option<Arc<FixedWindowLimiter>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and upstream.
    pub fn new(config: GatewayConfig, provider: Arc<dyn PortfolioProvider>) -> Self {
        let state = AppState {
            service: PortfolioService::new(provider, config.security.error_exposure),
        };

        let limiter = config
            .profile
            .is_hardened()
            .then(|| Arc::new(FixedWindowLimiter::from_config(&config.rate_limit)));

        let router = Self::build_router(&config, state, limiter.clone());
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &GatewayConfig,
        state: AppState,
        limiter: Option<Arc<FixedWindowLimiter>>,
    ) -> Router {
        let hardened = config.profile.is_hardened();

        let root_route = match limiter {
            Some(limiter) => get(routes::root).route_layer(middleware::from_fn_with_state(
                RateLimitState {
                    limiter,
                    route: "/",
                },
                rate_limit_middleware,
            )),
            None => get(routes::root),
        };

        let portfolio_route = if hardened {
            get(routes::portfolio).route_layer(middleware::from_fn_with_state(
                Authenticator::new(config.auth.api_key.clone()),
                require_bearer,
            ))
        } else {
            get(routes::portfolio)
        };

        let mut router = Router::new()
            .route("/", root_route)
            .route("/api/v1/health", get(routes::health))
            .route("/api/v1/portfolio", portfolio_route);

        if config.profile == DeploymentProfile::Local {
            router = router
                .route("/docs", get(docs::swagger_ui))
                .route("/openapi.json", get(docs::openapi_json));
        }

        let mut router = router
            .method_not_allowed_fallback(error::method_not_allowed)
            .fallback(error::not_found)
            .route_layer(middleware::from_fn(metrics::track_metrics))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.security.request_timeout_secs,
            )))
            .layer(middleware::map_response(error::json_error_bodies));

        if hardened {
            router = router.layer(cors_layer(&config.cors));
            if config.environment.is_production() {
                router = router.layer(middleware::from_fn_with_state(
                    HttpsRedirect {
                        tls_listener: config.server.tls().is_some(),
                    },
                    https_redirect_middleware,
                ));
            }
            router = router.layer(middleware::from_fn(security_headers_middleware));
        }

        router
            .layer(request::propagate_request_id_layer())
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = %request::request_id(req.headers()),
                    )
                }),
            )
            .layer(request::set_request_id_layer())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server, accepting plain connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            profile = self.config.profile.as_str(),
            "HTTP server starting"
        );

        if let Some(limiter) = &self.limiter {
            spawn_purge_task(limiter.clone(), shutdown.resubscribe());
        }

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS termination on the given address.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(
            address = %addr,
            profile = self.config.profile.as_str(),
            "HTTPS server starting"
        );

        if let Some(limiter) = &self.limiter {
            spawn_purge_task(limiter.clone(), shutdown.resubscribe());
        }

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(
                self.router
                    .into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Periodically drop expired rate limit windows so idle clients do not pile up.
fn spawn_purge_task(limiter: Arc<FixedWindowLimiter>, mut shutdown: broadcast::Receiver<()>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(limiter.window());
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => limiter.purge_expired(),
                _ = shutdown.recv() => break,
            }
        }
    });
}
