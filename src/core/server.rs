//! Server Implementation
//!
//! Router assembly, middleware stack and the serve loop.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::{Config, ServerState};
use crate::db::repository::RevokedTokenRepository;
use crate::utils::{AppError, now_millis};

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(crate::api::auth::router())
        .merge(crate::api::health::router())
        .merge(crate::api::users::router())
        .merge(crate::api::products::router())
        .merge(crate::api::vouchers::router())
        .merge(crate::api::transactions::router())
}

/// Interval between sweeps of the revoked-token blacklist
const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (tests, embedding)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        crate::api::health::mark_started();
        Self::start_background_tasks(&state);

        let app = build_app()
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive()),
            );

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

        tracing::info!("Rewards server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        Ok(())
    }

    /// Periodic sweep of blacklisted tokens whose expiry has passed
    fn start_background_tasks(state: &ServerState) {
        let revoked_tokens = RevokedTokenRepository::new(state.db.db.clone());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TOKEN_PURGE_INTERVAL);
            loop {
                ticker.tick().await;
                if let Err(e) = revoked_tokens.purge_expired(now_millis()).await {
                    tracing::warn!(error = %e, "Revoked token purge failed");
                }
            }
        });
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down...");
}
