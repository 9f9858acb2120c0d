//! Message Store trait.
//!
//! メッセージの永続化を抽象化する trait。
//! UseCase 層は trait に依存し、具体的な実装（SQLite / InMemory）には
//! 依存しません（依存性の逆転）。

use async_trait::async_trait;

use super::entity::{Identity, StoredMessage};
use super::error::StoreError;
use super::value_object::MessageContent;

/// Durable, ordered, append-only record of messages per room.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Assign id and created_at, persist, and return the stored record.
    ///
    /// 永続化に失敗した場合は黙って落とさず `StoreError::Unavailable` を返す。
    async fn append(
        &self,
        room_id: i64,
        sender: &Identity,
        content: &MessageContent,
    ) -> Result<StoredMessage, StoreError>;

    /// Messages of a room, ascending by created_at then id.
    ///
    /// `limit` を指定した場合は新しい方から `limit` 件を昇順で返す
    /// （join 時のバックログ再生用）。
    async fn history(
        &self,
        room_id: i64,
        limit: Option<usize>,
    ) -> Result<Vec<StoredMessage>, StoreError>;
}
