//! WebSocket connection handlers.
//!
//! 認証は upgrade 前に 1 度だけ行い、得られた Identity を接続の
//! 生存期間中使い続ける。切断時は必ず registry から retire する。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, Identity, RegistryError},
    infrastructure::dto::websocket::{ClientEvent, ServerEvent},
    ui::state::AppState,
};

use super::credential_from_headers;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(token) = credential_from_headers(&headers) else {
        tracing::warn!("WebSocket upgrade without credential rejected");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let identity = match state.authenticator.authenticate(&token) {
        Ok(identity) => identity,
        Err(_) => {
            tracing::warn!("WebSocket upgrade with invalid credential rejected");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Identity) {
    let (mut sender, mut receiver) = socket.split();

    // Bounded outbound queue: broadcast 側は try_send し、詰まった接続への
    // 配信はそのメッセージ毎に落とす
    let (tx, mut rx) = mpsc::channel::<String>(state.outbound_capacity);
    let connection_id = state.registry.register(identity.clone(), tx).await;
    tracing::info!(
        "user '{}' (id {}) connected as {}",
        identity.display_name,
        identity.id,
        connection_id
    );

    // Spawn a task to drain the outbound queue into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // Spawn a task to receive events from this client
    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on {}: {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => handle_client_event(&recv_state, connection_id, event).await,
                    Err(e) => {
                        tracing::warn!("malformed event from {}: {}", connection_id, e);
                        push_to(
                            &recv_state,
                            connection_id,
                            &ServerEvent::Error {
                                reason: "malformed event".to_string(),
                            },
                        )
                        .await;
                    }
                },
                Message::Close(_) => {
                    tracing::info!("connection {} requested close", connection_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // 接続終端。以後この connection_id 宛の配信はスキップされる
    match state.registry.retire(connection_id).await {
        Ok(()) => {
            tracing::info!(
                "user '{}' disconnected, connection {} retired",
                identity.display_name,
                connection_id
            );
        }
        Err(e) => {
            tracing::warn!("retire of {} failed: {}", connection_id, e);
        }
    }
}

async fn handle_client_event(state: &AppState, connection_id: ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::JoinRoom { room_id } => {
            match state.registry.join_room(connection_id, room_id).await {
                Ok(true) => replay_history(state, connection_id, room_id).await,
                // 既に join 済み。no-op（replay も繰り返さない）
                Ok(false) => {}
                Err(RegistryError::UnknownRoom(_)) => {
                    push_to(
                        state,
                        connection_id,
                        &ServerEvent::Error {
                            reason: format!("unknown room {room_id}"),
                        },
                    )
                    .await;
                }
                Err(RegistryError::StaleConnection) => {}
            }
        }
        ClientEvent::LeaveRoom { room_id } => {
            // 参加していないルームからの leave も no-op
            if let Err(e) = state.registry.leave_room(connection_id, room_id).await {
                tracing::warn!("leave of room {} by {} failed: {}", room_id, connection_id, e);
            }
        }
        ClientEvent::Chat { room_id, content } => {
            if let Err(e) = state.engine.send(connection_id, room_id, &content).await {
                tracing::info!("send to room {} by {} failed: {}", room_id, connection_id, e);
                push_to(
                    state,
                    connection_id,
                    &ServerEvent::Error {
                        reason: e.to_string(),
                    },
                )
                .await;
            }
        }
    }
}

/// join 直後に直近のメッセージを当該接続にだけ replay する。
async fn replay_history(state: &AppState, connection_id: ConnectionId, room_id: i64) {
    let Some(room) = state.directory.room_by_id(room_id).await else {
        return;
    };

    let messages = match state.store.history(room_id, Some(state.replay_limit)).await {
        Ok(messages) => messages,
        Err(e) => {
            tracing::error!("history replay for room {} failed: {}", room_id, e);
            push_to(
                state,
                connection_id,
                &ServerEvent::Error {
                    reason: "history unavailable".to_string(),
                },
            )
            .await;
            return;
        }
    };

    push_to(
        state,
        connection_id,
        &ServerEvent::History {
            room_id,
            room_name: room.name.into_string(),
            messages,
        },
    )
    .await;
}

/// Push a server event onto one connection's outbound queue.
///
/// broadcast の fan-out と違い、ここは待つ。history replay や error は
/// 当該接続宛ての 1 回きりのイベントで、キューが一時的に満杯でも
/// 落とさない（writer タスクが別で動いているため待てば必ず空く）。
async fn push_to(state: &AppState, connection_id: ConnectionId, event: &ServerEvent) {
    let payload = serde_json::to_string(event).unwrap();
    for sender in state.registry.senders_for(&[connection_id]).await {
        if sender.send(payload.clone()).await.is_err() {
            tracing::warn!("failed to push event to {}", connection_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::MessageStore;
    use crate::infrastructure::{
        ConnectionRegistry, InMemoryMessageStore, OllamaModerationBackend, RoomDirectory,
        SessionAuthenticator,
    };
    use crate::usecase::{BroadcastEngine, FailurePolicy, ModerationGate};

    fn app_state(
        registry: Arc<ConnectionRegistry>,
        directory: Arc<RoomDirectory>,
        outbound_capacity: usize,
    ) -> AppState {
        let store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
        let gate = Arc::new(ModerationGate::new(
            Arc::new(OllamaModerationBackend::new("http://127.0.0.1:9", "llama3")),
            Duration::from_millis(100),
            FailurePolicy::Open,
        ));
        let engine = Arc::new(BroadcastEngine::new(
            registry.clone(),
            directory.clone(),
            store.clone(),
            gate,
            16,
        ));
        AppState {
            authenticator: SessionAuthenticator::new("test-secret"),
            registry,
            directory,
            store,
            engine,
            outbound_capacity,
            replay_limit: 50,
        }
    }

    #[tokio::test]
    async fn test_push_to_waits_for_queue_space_instead_of_dropping() {
        // テスト項目: 接続宛ての 1 回きりのイベント（history / error）は
        //             outbound queue が一時的に満杯でも落とされない
        // given (前提条件): 容量 1 の queue を先に埋めておく
        let directory = Arc::new(RoomDirectory::new());
        let registry = Arc::new(ConnectionRegistry::new(directory.clone()));
        let (tx, mut rx) = mpsc::channel(1);
        tx.try_send("backlog".to_string()).unwrap();
        let connection_id = registry
            .register(
                Identity {
                    id: 1,
                    display_name: "alice".to_string(),
                },
                tx,
            )
            .await;
        let state = app_state(registry, directory, 1);

        // when (操作): 満杯のまま push し、その後 writer 側が queue を空ける
        let push = tokio::spawn(async move {
            push_to(
                &state,
                connection_id,
                &ServerEvent::Error {
                    reason: "late delivery".to_string(),
                },
            )
            .await;
        });

        // then (期待する結果): 先行分に続いてイベントが届いている
        assert_eq!(rx.recv().await.unwrap(), "backlog");
        let delivered = rx.recv().await.unwrap();
        assert!(delivered.contains("late delivery"));
        push.await.unwrap();
    }
}
