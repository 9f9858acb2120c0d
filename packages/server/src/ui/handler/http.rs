//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};

use crate::{
    domain::RoomName,
    infrastructure::dto::http::{CreateRoomRequest, ErrorResponse, HistoryResponse, RoomDto},
    ui::state::AppState,
};

use super::credential_from_headers;

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomDto>> {
    let rooms = state.directory.list_rooms().await;
    Json(rooms.into_iter().map(RoomDto::from).collect())
}

/// Create a room. Requires a valid session token.
///
/// 同名ルームが既にあれば 409 を返す（作成は冪等ではない）。
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomDto>), (StatusCode, Json<ErrorResponse>)> {
    let token = credential_from_headers(&headers)
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "missing credential"))?;
    let identity = state
        .authenticator
        .authenticate(&token)
        .map_err(|_| error_response(StatusCode::UNAUTHORIZED, "invalid credential"))?;

    let name = RoomName::new(&request.name)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;

    let (room, created) = state.directory.ensure_room(&name).await;
    if !created {
        return Err(error_response(
            StatusCode::CONFLICT,
            format!("room '{}' already exists", room.name),
        ));
    }

    tracing::info!("user '{}' created room '{}'", identity.display_name, room.name);
    Ok((StatusCode::CREATED, Json(RoomDto::from(room))))
}

/// Get message history of a room
pub async fn message_history(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(room) = state.directory.room_by_id(room_id).await else {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            format!("unknown room {room_id}"),
        ));
    };

    let messages = state.store.history(room_id, None).await.map_err(|e| {
        tracing::error!("history of room {} unavailable: {}", room_id, e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "message store unavailable")
    })?;

    Ok(Json(HistoryResponse {
        messages,
        room_name: room.name.into_string(),
    }))
}
