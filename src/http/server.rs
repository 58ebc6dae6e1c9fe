//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up the gate chain (rate limit → authentication → permissions)
//! - Wire up ambient middleware (request ID, tracing, timeout)
//! - Apply reloaded configuration to the live gates
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::auth::{middleware::authenticate, TokenVerifier};
use crate::captcha::{
    handlers::{issue_captcha, verify_captcha},
    CaptchaStore,
};
use crate::clock::{Clock, SystemClock};
use crate::config::GateConfig;
use crate::http::request::{request_id, MakeRequestUuid};
use crate::permission::{PermissionLoader, StaticPermissionLoader};
use crate::security::{rate_limit_middleware, RateLimitSettings, RateLimiter};

/// Application state injected into handlers and gates.
///
/// Each store is constructed once per server and shared by reference.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub verifier: Arc<TokenVerifier>,
    pub captcha: Arc<CaptchaStore>,
    pub permissions: Arc<dyn PermissionLoader>,
}

impl AppState {
    pub fn new(
        config: &GateConfig,
        clock: Arc<dyn Clock>,
        permissions: Arc<dyn PermissionLoader>,
    ) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(
                RateLimitSettings::from(&config.rate_limit),
                clock.clone(),
            )),
            verifier: Arc::new(TokenVerifier::new(config.auth.clone(), clock.clone())),
            captcha: Arc::new(CaptchaStore::new(config.captcha.clone(), clock)),
            permissions,
        }
    }
}

/// HTTP server for the admission gate.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
    state: AppState,
    static_permissions: Option<Arc<StaticPermissionLoader>>,
}

impl HttpServer {
    /// Server with the system clock and the config-backed permission table.
    pub fn new(config: GateConfig) -> Self {
        let loader = Arc::new(StaticPermissionLoader::new(
            config.permissions.subjects.clone(),
        ));
        let mut server = Self::with_parts(config, Arc::new(SystemClock), loader.clone());
        server.static_permissions = Some(loader);
        server
    }

    /// Server with an injected clock and permission source.
    pub fn with_parts(
        config: GateConfig,
        clock: Arc<dyn Clock>,
        permissions: Arc<dyn PermissionLoader>,
    ) -> Self {
        if config.auth.secret().is_none() {
            tracing::warn!("No token signing secret configured; authenticated routes will fail closed");
        }

        let state = AppState::new(&config, clock, permissions);
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
            static_permissions: None,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        let public = Router::new()
            .route("/api/captcha", get(issue_captcha))
            .route("/api/captcha/verify", post(verify_captcha));

        let protected = admin::admin_router().route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ));

        Router::new()
            .merge(public)
            .merge(protected)
            .layer(middleware::from_fn_with_state(
                state.limiter.clone(),
                rate_limit_middleware,
            ))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared gate state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Push a reloaded configuration into the live gates.
    ///
    /// Listener and captcha settings only take effect on restart.
    pub fn apply(&self, config: &GateConfig) {
        apply_config(&self.state, self.static_permissions.as_deref(), config);
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        let static_permissions = self.static_permissions.clone();
        let reload = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                apply_config(&state, static_permissions.as_deref(), &config);
            }
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                match shutdown.recv().await {
                    Ok(()) => tracing::info!("Shutdown signal received"),
                    Err(e) => tracing::warn!(error = %e, "Shutdown channel closed, stopping"),
                }
            })
            .await?;

        reload.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn apply_config(
    state: &AppState,
    static_permissions: Option<&StaticPermissionLoader>,
    config: &GateConfig,
) {
    state.verifier.reconfigure(config.auth.clone());
    state
        .limiter
        .configure(RateLimitSettings::from(&config.rate_limit));
    if let Some(loader) = static_permissions {
        loader.replace(config.permissions.subjects.clone());
    }
    if config.auth.secret().is_none() {
        tracing::warn!("Reloaded configuration has no token signing secret");
    }
    tracing::info!("Configuration reloaded");
}
