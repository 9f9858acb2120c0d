//! InMemory Message Store 実装
//!
//! Vec をインメモリ DB として使用します。プロセス終了で消えるため
//! 「durable」は満たさないが、append / history の契約（採番、順序、
//! 失敗時の StoreUnavailable）は SQLite 実装と同一。

use async_trait::async_trait;
use tokio::sync::Mutex;
use tsudoi_shared::time::unix_timestamp_millis;

use crate::domain::{Identity, MessageContent, MessageStore, StoreError, StoredMessage};

#[derive(Default)]
struct MemoryInner {
    next_id: i64,
    messages: Vec<StoredMessage>,
}

/// Append-only in-memory message record.
pub struct InMemoryMessageStore {
    inner: Mutex<MemoryInner>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                next_id: 1,
                messages: Vec::new(),
            }),
        }
    }

    /// Total number of stored messages across all rooms.
    pub async fn message_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.messages.len()
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(
        &self,
        room_id: i64,
        sender: &Identity,
        content: &MessageContent,
    ) -> Result<StoredMessage, StoreError> {
        let mut inner = self.inner.lock().await;
        let message = StoredMessage {
            id: inner.next_id,
            room_id,
            sender_id: sender.id,
            sender_display_name: sender.display_name.clone(),
            content: content.as_str().to_string(),
            created_at: unix_timestamp_millis(),
        };
        inner.next_id += 1;
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn history(
        &self,
        room_id: i64,
        limit: Option<usize>,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let inner = self.inner.lock().await;
        let mut messages = inner
            .messages
            .iter()
            .filter(|message| message.room_id == room_id)
            .cloned()
            .collect::<Vec<_>>();
        if let Some(limit) = limit
            && messages.len() > limit
        {
            messages.drain(..messages.len() - limit);
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: i64, name: &str) -> Identity {
        Identity {
            id,
            display_name: name.to_string(),
        }
    }

    fn content(text: &str) -> MessageContent {
        MessageContent::new(text).unwrap()
    }

    #[tokio::test]
    async fn test_append_assigns_monotonic_ids() {
        // テスト項目: append は単調増加の id を採番する
        // given (前提条件):
        let store = InMemoryMessageStore::new();
        let alice = identity(1, "alice");

        // when (操作):
        let first = store.append(1, &alice, &content("one")).await.unwrap();
        let second = store.append(1, &alice, &content("two")).await.unwrap();

        // then (期待する結果):
        assert!(second.id > first.id);
        assert!(second.created_at >= first.created_at);
        assert_eq!(first.sender_display_name, "alice");
    }

    #[tokio::test]
    async fn test_history_filters_by_room_in_append_order() {
        // テスト項目: history は該当ルームのメッセージだけを追記順で返す
        // given (前提条件):
        let store = InMemoryMessageStore::new();
        let alice = identity(1, "alice");
        store.append(1, &alice, &content("a1")).await.unwrap();
        store.append(2, &alice, &content("b1")).await.unwrap();
        store.append(1, &alice, &content("a2")).await.unwrap();

        // when (操作):
        let history = store.history(1, None).await.unwrap();

        // then (期待する結果):
        let contents = history
            .iter()
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>();
        assert_eq!(contents, vec!["a1", "a2"]);
    }

    #[tokio::test]
    async fn test_history_limit_returns_most_recent_ascending() {
        // テスト項目: limit 指定時は新しい方から limit 件を昇順で返す
        // given (前提条件):
        let store = InMemoryMessageStore::new();
        let alice = identity(1, "alice");
        for text in ["one", "two", "three", "four"] {
            store.append(1, &alice, &content(text)).await.unwrap();
        }

        // when (操作):
        let history = store.history(1, Some(2)).await.unwrap();

        // then (期待する結果):
        let contents = history
            .iter()
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>();
        assert_eq!(contents, vec!["three", "four"]);
    }

    #[tokio::test]
    async fn test_history_of_unknown_room_is_empty() {
        // テスト項目: メッセージのないルームの history は空
        // given (前提条件):
        let store = InMemoryMessageStore::new();

        // when (操作):
        let history = store.history(42, None).await.unwrap();

        // then (期待する結果):
        assert!(history.is_empty());
    }
}
