//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::{Room, StoredMessage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDto {
    pub id: i64,
    pub name: String,
}

impl From<Room> for RoomDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            name: room.name.into_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
}

/// Response of `GET /api/messages/{room_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<StoredMessage>,
    pub room_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
