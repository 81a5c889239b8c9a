use std::sync::Arc;

use axum::extract::ws::WebSocket;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

use courtcast_api::ConferenceApi;
use courtcast_core::domain::GroupName;
use courtcast_core::events::CallbackEvent;

use crate::bridge::{self, InternalEvent};
use crate::broadcaster::Broadcaster;
use crate::cache::{ConferenceCache, ConferenceResolver};
use crate::client::{self, ClientRegistry};
use crate::dispatch::EventDispatcher;
use crate::error::DispatchError;
use crate::handlers::builtin_registry;

/// Server configuration.
pub struct ServerConfig {
    pub port: u16,
    pub max_send_queue: usize,
    /// Group every back-office connection joins. Deployments name their
    /// officers audience differently, so this is config, not a constant.
    pub officers_group: String,
    pub cleanup_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 9290,
            max_send_queue: 256,
            officers_group: "hearing-officers".into(),
            cleanup_interval_secs: 60,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<EventDispatcher>,
    pub client_registry: Arc<ClientRegistry>,
    pub event_tx: broadcast::Sender<InternalEvent>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/callback", post(callback_handler))
        .route("/internal-event", post(internal_event_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Create and start the server. Returns a handle to shut it down.
pub async fn start(
    config: ServerConfig,
    api: Arc<dyn ConferenceApi>,
) -> Result<ServerHandle, std::io::Error> {
    let client_registry = Arc::new(ClientRegistry::new(config.max_send_queue));
    let cache = Arc::new(ConferenceCache::new());
    let resolver = Arc::new(ConferenceResolver::new(cache, api));
    let broadcaster = Arc::new(Broadcaster::new(
        Arc::clone(&client_registry),
        GroupName::new(&config.officers_group),
    ));
    let dispatcher = Arc::new(EventDispatcher::new(
        builtin_registry(),
        resolver,
        broadcaster,
    ));

    // Internal events flow through the same dispatcher as callbacks
    let (event_tx, bridge_rx) = broadcast::channel::<InternalEvent>(256);
    let bridge_handle = bridge::create_bridge(Arc::clone(&dispatcher), bridge_rx);

    let cleanup_handle = client::start_cleanup_task(
        Arc::clone(&client_registry),
        std::time::Duration::from_secs(config.cleanup_interval_secs),
    );

    let app_state = AppState {
        dispatcher,
        client_registry,
        event_tx: event_tx.clone(),
    };

    let router = build_router(app_state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "Courtcast hub started");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        event_tx,
        _server: server_handle,
        _bridge: bridge_handle,
        _cleanup: cleanup_handle,
    })
}

/// Handle returned by `start()` — keeps background tasks alive.
pub struct ServerHandle {
    pub port: u16,
    /// Producer side of the internal-event channel, for in-process
    /// publishers that bypass the HTTP surface.
    pub event_tx: broadcast::Sender<InternalEvent>,
    _server: tokio::task::JoinHandle<()>,
    _bridge: tokio::task::JoinHandle<()>,
    _cleanup: tokio::task::JoinHandle<()>,
}

/// Inbound callback from the video bridge. Dispatched inline so the
/// producer sees whether the hub accepted the event.
async fn callback_handler(
    State(state): State<AppState>,
    Json(event): Json<CallbackEvent>,
) -> impl IntoResponse {
    match state.dispatcher.dispatch(&event).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            tracing::warn!(
                event_id = %event.event_id,
                event_type = %event.event_type,
                error = %err,
                "Callback dispatch failed"
            );
            let status = error_status(&err);
            (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
        }
    }
}

fn error_status(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::ConferenceNotFound(_) => StatusCode::NOT_FOUND,
        DispatchError::UnregisteredEventType(_)
        | DispatchError::MissingConferenceId(_)
        | DispatchError::MissingPayload(_)
        | DispatchError::MissingHeartbeat
        | DispatchError::UnknownTransferRoom(_)
        | DispatchError::Heartbeat(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DispatchError::Api(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Internal domain events are accepted for asynchronous dispatch: the
/// producer only needs to know the event was queued.
async fn internal_event_handler(
    State(state): State<AppState>,
    Json(event): Json<InternalEvent>,
) -> impl IntoResponse {
    match state.event_tx.send(event) {
        Ok(_) => StatusCode::ACCEPTED.into_response(),
        Err(_) => {
            // No bridge subscriber: the forwarding task is gone
            tracing::error!("Internal event channel has no receiver");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[derive(Deserialize)]
struct WsParams {
    username: String,
    #[serde(default)]
    officer: bool,
}

/// WebSocket upgrade handler. Every connection joins its own username
/// group; back-office connections additionally join the officers group.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

async fn handle_socket(socket: WebSocket, params: WsParams, state: AppState) {
    let mut groups = std::collections::HashSet::new();
    groups.insert(GroupName::new(&params.username));
    if params.officer {
        groups.insert(state.dispatcher.officers_group().clone());
    }

    let (client_id, rx) = state.client_registry.register(groups);
    tracing::info!(
        client_id = %client_id,
        username = %params.username,
        officer = params.officer,
        "WebSocket client connected"
    );

    client::handle_ws_connection(socket, client_id, rx, state.client_registry).await;
}

/// Health check HTTP endpoint.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "connected_clients": state.client_registry.count(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::{details, FakeApi};

    fn test_config() -> ServerConfig {
        ServerConfig {
            port: 0, // Random port
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn server_starts_and_serves_health() {
        let api = Arc::new(FakeApi::new());
        let handle = start(test_config(), api).await.unwrap();
        assert!(handle.port > 0);

        let url = format!("http://127.0.0.1:{}/health", handle.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["connected_clients"], 0);
    }

    #[tokio::test]
    async fn callback_accepted_with_no_content() {
        let api = Arc::new(FakeApi::new());
        api.insert(details("conf-1"));
        let handle = start(test_config(), api).await.unwrap();

        let url = format!("http://127.0.0.1:{}/callback", handle.port);
        let resp = reqwest::Client::new()
            .post(&url)
            .json(&serde_json::json!({
                "event_id": "evt-001",
                "event_type": "pause",
                "conference_id": "conf-1",
                "timestamp_utc": "2026-03-02T10:30:00Z"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
    }

    #[tokio::test]
    async fn callback_for_unknown_conference_is_404() {
        let api = Arc::new(FakeApi::new());
        let handle = start(test_config(), api).await.unwrap();

        let url = format!("http://127.0.0.1:{}/callback", handle.port);
        let resp = reqwest::Client::new()
            .post(&url)
            .json(&serde_json::json!({
                "event_id": "evt-002",
                "event_type": "pause",
                "conference_id": "conf-ghost",
                "timestamp_utc": "2026-03-02T10:30:00Z"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn callback_without_required_conference_is_422() {
        let api = Arc::new(FakeApi::new());
        let handle = start(test_config(), api).await.unwrap();

        let url = format!("http://127.0.0.1:{}/callback", handle.port);
        let resp = reqwest::Client::new()
            .post(&url)
            .json(&serde_json::json!({
                "event_id": "evt-003",
                "event_type": "close",
                "timestamp_utc": "2026-03-02T10:30:00Z"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 422);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("conference id"));
    }

    #[tokio::test]
    async fn internal_event_is_accepted_for_async_dispatch() {
        let api = Arc::new(FakeApi::new());
        api.insert(details("conf-1"));
        let handle = start(test_config(), api).await.unwrap();

        let url = format!("http://127.0.0.1:{}/internal-event", handle.port);
        let resp = reqwest::Client::new()
            .post(&url)
            .json(&serde_json::json!({
                "type": "new_conference_added",
                "conference_id": "conf-1"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 202);
    }

    #[test]
    fn build_router_creates_routes() {
        let api: Arc<dyn ConferenceApi> = Arc::new(FakeApi::new());
        let client_registry = Arc::new(ClientRegistry::new(32));
        let resolver = Arc::new(ConferenceResolver::new(Arc::new(ConferenceCache::new()), api));
        let broadcaster = Arc::new(Broadcaster::new(
            Arc::clone(&client_registry),
            GroupName::new("hearing-officers"),
        ));
        let dispatcher = Arc::new(EventDispatcher::new(
            builtin_registry(),
            resolver,
            broadcaster,
        ));
        let (event_tx, _rx) = broadcast::channel(16);

        let state = AppState {
            dispatcher,
            client_registry,
            event_tx,
        };

        let _router = build_router(state);
        // If this doesn't panic, the router was built successfully
    }
}
