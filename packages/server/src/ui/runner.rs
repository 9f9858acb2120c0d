//! Server assembly and runner.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{any, get},
};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::domain::{MessageStore, StoreError};
use crate::infrastructure::{
    ConnectionRegistry, InMemoryMessageStore, OllamaModerationBackend, RoomDirectory,
    SessionAuthenticator, SqliteMessageStore,
};
use crate::ui::handler::{create_room, health_check, list_rooms, message_history, websocket_handler};
use crate::ui::signal::shutdown_signal;
use crate::ui::state::AppState;
use crate::usecase::{BroadcastEngine, FailurePolicy, ModerationGate};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("message store error: {0}")]
    Store(#[from] StoreError),
}

/// Wire up all components from the configuration.
pub async fn build_state(config: &ServerConfig) -> Result<Arc<AppState>, ServerError> {
    let store: Arc<dyn MessageStore> = match &config.database_url {
        Some(url) => {
            tracing::info!("using SQLite message store at {}", url);
            Arc::new(SqliteMessageStore::connect(url).await?)
        }
        None => {
            tracing::warn!("no database URL configured, messages are kept in memory only");
            Arc::new(InMemoryMessageStore::new())
        }
    };

    let policy = if config.moderation_fail_closed {
        FailurePolicy::Closed
    } else {
        FailurePolicy::Open
    };
    let backend = OllamaModerationBackend::new(
        config.moderation_url.clone(),
        config.moderation_model.clone(),
    );
    let gate = Arc::new(ModerationGate::new(
        Arc::new(backend),
        Duration::from_millis(config.moderation_timeout_ms),
        policy,
    ));

    let directory = Arc::new(RoomDirectory::new());
    let registry = Arc::new(ConnectionRegistry::new(directory.clone()));
    let engine = Arc::new(BroadcastEngine::new(
        registry.clone(),
        directory.clone(),
        store.clone(),
        gate,
        config.room_queue_capacity,
    ));

    Ok(Arc::new(AppState {
        authenticator: SessionAuthenticator::new(config.token_secret.clone()),
        registry,
        directory,
        store,
        engine,
        outbound_capacity: config.outbound_capacity,
        replay_limit: config.replay_limit,
    }))
}

/// Build the axum router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(list_rooms).post(create_room))
        .route("/api/messages/{room_id}", get(message_history))
        .route("/ws", any(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until a shutdown signal arrives.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let state = build_state(&config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
