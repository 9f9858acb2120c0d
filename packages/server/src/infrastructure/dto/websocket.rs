//! WebSocket protocol DTOs.
//!
//! `type` タグ（kebab-case）で判別する。sender の識別情報は
//! payload には一切含めない。常に接続の認証済み Identity を使う。

use serde::{Deserialize, Serialize};

use crate::domain::StoredMessage;

/// Client-to-server control and chat events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinRoom { room_id: i64 },
    LeaveRoom { room_id: i64 },
    Chat { room_id: i64, content: String },
}

/// Server-to-client events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Backlog replayed on a successful join
    History {
        room_id: i64,
        room_name: String,
        messages: Vec<StoredMessage>,
    },

    /// Broadcast of one persisted message to room members
    Message { message: StoredMessage },

    /// Per-connection failure report (unknown room, rejected send, ...)
    Error { reason: String },
}
