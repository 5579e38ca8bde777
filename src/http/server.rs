//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all forwarding handler
//! - Wire up middleware (tracing, request ID, tenant routing)
//! - Serve on a plain TCP listener or over TLS
//! - Swap in new routing state when the configuration changes

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::validation::validate_config;
use crate::config::{RouterConfig, TlsConfig};
use crate::http::middleware::{tenant_routing_middleware, RouteContext, SharedRoutes};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::upstream::Forwarder;

/// How long in-flight TLS connections get to finish after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid upstream address '{address}': {source}")]
    InvalidUpstream {
        address: String,
        source: axum::http::uri::InvalidUri,
    },
    #[error("invalid listen address '{0}'")]
    InvalidListenAddress(String),
    #[error("TLS setup failed: {0}")]
    Tls(std::io::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: SharedRoutes,
    pub forwarder: Forwarder,
}

/// HTTP server for the tenant router.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
    routes: SharedRoutes,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RouterConfig) -> Result<Self, ServerError> {
        let forwarder =
            Forwarder::new(&config).map_err(|source| ServerError::InvalidUpstream {
                address: config.upstream.address.clone(),
                source,
            })?;
        let routes: SharedRoutes =
            Arc::new(ArcSwap::from_pointee(RouteContext::from_config(&config)));

        let state = AppState {
            routes: routes.clone(),
            forwarder,
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            routes,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .layer(middleware::from_fn_with_state(
                state.routes.clone(),
                tenant_routing_middleware,
            ))
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations received on `config_updates` replace the routing state;
    /// the server stops when `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "HTTP server starting"
        );

        let reload = spawn_reloader(self.routes.clone(), self.config.clone(), config_updates);
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;
        reload.abort();
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS on the configured bind address.
    pub async fn run_tls(
        self,
        tls: &TlsConfig,
        config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr: SocketAddr = self
            .config
            .listener
            .bind_address
            .parse()
            .map_err(|_| ServerError::InvalidListenAddress(self.config.listener.bind_address.clone()))?;
        let rustls = crate::http::tls::load_tls_config(
            Path::new(&tls.cert_path),
            Path::new(&tls.key_path),
        )
        .await
        .map_err(ServerError::Tls)?;

        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "HTTPS server starting"
        );

        let reload = spawn_reloader(self.routes.clone(), self.config.clone(), config_updates);
        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let served = axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await;
        reload.abort();
        served?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config the server was started with.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

/// Apply configuration updates until the channel closes.
fn spawn_reloader(
    routes: SharedRoutes,
    initial: RouterConfig,
    mut updates: mpsc::UnboundedReceiver<RouterConfig>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut current = initial;
        while let Some(config) = updates.recv().await {
            if let Err(errors) = validate_config(&config) {
                for error in &errors {
                    tracing::error!(%error, "Rejected configuration update");
                }
                continue;
            }
            if config.upstream.address != current.upstream.address
                || config.listener.bind_address != current.listener.bind_address
            {
                tracing::warn!("Listener and upstream changes take effect after a restart");
            }

            routes.store(Arc::new(RouteContext::from_config(&config)));
            tracing::info!(
                redirects = config.redirects.len(),
                rewrite_prefix = %config.tenancy.rewrite_prefix,
                "Routing configuration reloaded"
            );
            current = config;
        }
    })
}

/// Forward whatever the routing middleware let through.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.forwarder.forward(request).await
}
