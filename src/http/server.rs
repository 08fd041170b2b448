//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the API handlers and fallbacks
//! - Wire up middleware (tracing, request ID, timeout with JSON envelope)
//! - Own the rate limiter and the hot-swappable route policies
//! - Run background housekeeping (window sweeper, policy reload)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{GatewayConfig, RoutesConfig};
use crate::config::validation::validate_config;
use crate::http::request_id::request_id_middleware;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::routes::{self, Backends};
use crate::security::RateLimiter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub routes: Arc<ArcSwap<RoutesConfig>>,
    pub backends: Backends,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig, backends: Backends) -> Self {
        let state = AppState {
            limiter: Arc::new(RateLimiter::new()),
            routes: Arc::new(ArcSwap::from_pointee(config.routes.clone())),
            backends,
        };

        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/chat", post(routes::chat::handle))
            .route("/api/contact", post(routes::contact::handle))
            .route("/api/recommend", post(routes::recommend::handle))
            .route("/health", get(routes::health::health))
            .fallback(routes::health::not_found)
            .method_not_allowed_fallback(routes::health::method_not_allowed)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::map_response(routes::health::request_timeout))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// A clone of the router, for driving the server in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// `config_updates` carries reloaded configurations; only the route
    /// policies are applied live.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::spawn(sweep_windows(
            self.state.limiter.clone(),
            Duration::from_secs(self.config.rate_limiter.sweep_interval_secs),
            shutdown.clone(),
        ));
        tokio::spawn(apply_policy_updates(
            self.state.routes.clone(),
            config_updates,
            shutdown.clone(),
        ));

        let mut signal = shutdown;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { signal.recv().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Periodically drop expired rate-limit windows.
async fn sweep_windows(limiter: Arc<RateLimiter>, every: Duration, mut shutdown: ShutdownSignal) {
    let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = limiter.sweep_expired();
                metrics::record_rate_limit_keys(limiter.len());
                if removed > 0 {
                    tracing::debug!(
                        removed,
                        remaining = limiter.len(),
                        "Swept expired rate-limit windows"
                    );
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

/// Swap in route policies from reloaded configurations.
async fn apply_policy_updates(
    routes: Arc<ArcSwap<RoutesConfig>>,
    mut updates: mpsc::UnboundedReceiver<GatewayConfig>,
    mut shutdown: ShutdownSignal,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => {
                    if let Err(errors) = validate_config(&config) {
                        tracing::error!(errors = errors.len(), "Ignoring invalid route policies");
                        continue;
                    }
                    routes.store(Arc::new(config.routes));
                    tracing::info!("Route policies reloaded");
                }
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}
