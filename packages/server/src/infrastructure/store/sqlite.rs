//! SQLite Message Store 実装
//!
//! sqlx の SQLite ドライバによる永続化。スキーマは接続時に作成する。
//! 書き込みは 1 コネクションに直列化される（SQLite は実質単一ライタ、
//! かつ `sqlite::memory:` をテストで使えるようにするため）。

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tsudoi_shared::time::unix_timestamp_millis;

use crate::domain::{Identity, MessageContent, MessageStore, StoreError, StoredMessage};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id INTEGER NOT NULL,
    sender_id INTEGER NOT NULL,
    sender_display_name TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL
)";

const INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_messages_room ON messages (room_id, created_at, id)";

/// Durable message record backed by SQLite.
pub struct SqliteMessageStore {
    pool: SqlitePool,
}

impl SqliteMessageStore {
    /// Connect to `database_url` (e.g. `sqlite://tsudoi.db`), creating the
    /// file and schema when missing.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(unavailable)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(unavailable)?;
        sqlx::query(SCHEMA).execute(&pool).await.map_err(unavailable)?;
        sqlx::query(INDEX).execute(&pool).await.map_err(unavailable)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn append(
        &self,
        room_id: i64,
        sender: &Identity,
        content: &MessageContent,
    ) -> Result<StoredMessage, StoreError> {
        let created_at = unix_timestamp_millis();
        let result = sqlx::query(
            "INSERT INTO messages (room_id, sender_id, sender_display_name, content, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(room_id)
        .bind(sender.id)
        .bind(sender.display_name.as_str())
        .bind(content.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(StoredMessage {
            id: result.last_insert_rowid(),
            room_id,
            sender_id: sender.id,
            sender_display_name: sender.display_name.clone(),
            content: content.as_str().to_string(),
            created_at,
        })
    }

    async fn history(
        &self,
        room_id: i64,
        limit: Option<usize>,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let rows = match limit {
            // 新しい方から limit 件を取り、昇順に並べ直す
            Some(limit) => {
                let mut rows = sqlx::query(
                    "SELECT id, room_id, sender_id, sender_display_name, content, created_at \
                     FROM messages WHERE room_id = ? \
                     ORDER BY created_at DESC, id DESC LIMIT ?",
                )
                .bind(room_id)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(unavailable)?;
                rows.reverse();
                rows
            }
            None => sqlx::query(
                "SELECT id, room_id, sender_id, sender_display_name, content, created_at \
                 FROM messages WHERE room_id = ? \
                 ORDER BY created_at ASC, id ASC",
            )
            .bind(room_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?,
        };

        rows.iter()
            .map(|row| row_to_message(row).map_err(unavailable))
            .collect()
    }
}

fn row_to_message(row: &SqliteRow) -> Result<StoredMessage, sqlx::Error> {
    Ok(StoredMessage {
        id: row.try_get("id")?,
        room_id: row.try_get("room_id")?,
        sender_id: row.try_get("sender_id")?,
        sender_display_name: row.try_get("sender_display_name")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}
