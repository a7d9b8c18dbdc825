//! Router assembly and the HTTP server with graceful shutdown

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{
    config::Config,
    error::Result,
    handlers, health,
    middleware::{
        request_id_header, request_id_layer, request_id_propagation_layer,
        sensitive_headers_layer,
    },
    repository::CommandRepository,
    state::AppState,
};

/// Build the complete application: command routes under the base path,
/// health probes at the root, and the middleware stack
pub fn build_router<R: CommandRepository>(state: AppState<R>) -> Router {
    let commands = handlers::routes::<R>();
    let api = match state.base_path() {
        "" => commands,
        base => Router::new().nest(base, commands),
    };

    let config = state.config().clone();
    let app = api.merge(health::routes::<R>()).with_state(state);
    apply_middleware(app, &config)
}

/// Wrap `app` in the configured middleware stack
///
/// Layers added later run first, so the request id is set before anything
/// else sees the request and panics are caught closest to the handlers.
pub fn apply_middleware(app: Router, config: &Config) -> Router {
    let middleware = &config.middleware;
    let mut app = app;

    if middleware.catch_panic {
        app = app.layer(CatchPanicLayer::new());
    }

    if let Some(cors) = build_cors_layer(&middleware.cors_mode) {
        app = app.layer(cors);
    }

    if middleware.compression {
        app = app.layer(CompressionLayer::new());
    }

    let request_id = request_id_header(&middleware.request_id_header);

    app.layer(RequestBodyLimitLayer::new(middleware.body_limit_mb * 1024 * 1024))
        .layer(TimeoutLayer::with_status_code(
            http::StatusCode::REQUEST_TIMEOUT,
            config.service.timeout(),
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(sensitive_headers_layer())
        .layer(request_id_propagation_layer(request_id.clone()))
        .layer(request_id_layer(request_id))
}

/// `None` when CORS handling is disabled
fn build_cors_layer(mode: &str) -> Option<CorsLayer> {
    match mode {
        "permissive" => Some(CorsLayer::permissive()),
        "restrictive" => Some(CorsLayer::new()),
        "disabled" => None,
        other => {
            tracing::warn!("Unknown CORS mode: {}, defaulting to permissive", other);
            Some(CorsLayer::permissive())
        }
    }
}

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Bind the configured port and serve `app` until SIGINT or SIGTERM
    pub async fn serve(self, app: Router) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.service.port));

        tracing::info!("Starting {} on {}", self.config.service.name, addr);
        self.log_middleware_config();

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    fn log_middleware_config(&self) {
        let middleware = &self.config.middleware;
        tracing::info!(
            base_path = %self.config.service.normalized_base_path(),
            body_limit_mb = middleware.body_limit_mb,
            compression = middleware.compression,
            catch_panic = middleware.catch_panic,
            cors_mode = %middleware.cors_mode,
            request_id_header = %middleware.request_id_header,
            timeout_secs = self.config.service.timeout_secs,
            "Middleware configured"
        );
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    tracing::info!("Shutdown signal received, draining requests...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_creation() {
        let config = Config::default();
        let server = Server::new(config.clone());
        assert_eq!(server.config().service.port, config.service.port);
    }

    #[test]
    fn test_cors_modes() {
        assert!(build_cors_layer("permissive").is_some());
        assert!(build_cors_layer("restrictive").is_some());
        assert!(build_cors_layer("disabled").is_none());
        assert!(build_cors_layer("bogus").is_some());
    }
}
