//! Core domain models for the chat server.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::value_object::RoomName;

/// Identity of an authenticated user.
///
/// 検証済みトークンから 1 度だけ導出され、セッションの間は不変。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub display_name: String,
}

/// Opaque handle for one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named chat room.
///
/// 名前は一意。作成後に削除されることはない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: RoomName,
}

/// A message that has been persisted by the Message Store.
///
/// Store が id と created_at を採番した後は不変。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Store-assigned, monotonically increasing id
    pub id: i64,
    pub room_id: i64,
    pub sender_id: i64,
    pub sender_display_name: String,
    pub content: String,
    /// Unix timestamp in milliseconds (UTC)
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_is_unique() {
        // テスト項目: 生成される ConnectionId は互いに異なる
        // given (前提条件) / when (操作):
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(a, b);
    }

    #[test]
    fn test_stored_message_serializes_expected_fields() {
        // テスト項目: StoredMessage が期待するフィールド名で JSON 化される
        // given (前提条件):
        let message = StoredMessage {
            id: 1,
            room_id: 2,
            sender_id: 3,
            sender_display_name: "alice".to_string(),
            content: "hi".to_string(),
            created_at: 1_700_000_000_000,
        };

        // when (操作):
        let json = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(json["id"], 1);
        assert_eq!(json["room_id"], 2);
        assert_eq!(json["sender_id"], 3);
        assert_eq!(json["sender_display_name"], "alice");
        assert_eq!(json["content"], "hi");
        assert_eq!(json["created_at"], 1_700_000_000_000i64);
    }
}
