//! Connection Registry.
//!
//! ライブ接続の正本。各接続の Identity・参加中ルーム集合・outbound
//! チャンネルを所有し、接続のライフサイクル（`Open -> Retired`、終端）
//! を管理する。
//!
//! join / leave は接続側の room 集合と Room Directory の membership
//! index を registry lock の下でまとめて更新するため、並行する
//! broadcast からは「両方反映済み」か「両方未反映」のどちらかしか
//! 観測されない。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::domain::{ConnectionId, Identity, RegistryError};
use crate::infrastructure::directory::RoomDirectory;

struct ConnectionEntry {
    identity: Identity,
    rooms: HashSet<i64>,
    /// Bounded outbound queue consumed by the connection's writer loop
    sender: mpsc::Sender<String>,
}

/// Owns all live connections and their room memberships.
pub struct ConnectionRegistry {
    directory: Arc<RoomDirectory>,
    inner: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new(directory: Arc<RoomDirectory>) -> Self {
        Self {
            directory,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Register a freshly authenticated connection. Never blocks on other
    /// connections' registration beyond the registry lock itself.
    pub async fn register(&self, identity: Identity, sender: mpsc::Sender<String>) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        let mut inner = self.inner.lock().await;
        inner.insert(
            connection_id,
            ConnectionEntry {
                identity,
                rooms: HashSet::new(),
                sender,
            },
        );
        connection_id
    }

    /// Join a room. Idempotent: joining an already-joined room is a no-op.
    ///
    /// # Returns
    ///
    /// `Ok(true)` で新規 join、`Ok(false)` で既に join 済み（no-op）
    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_id: i64,
    ) -> Result<bool, RegistryError> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .get_mut(&connection_id)
            .ok_or(RegistryError::StaleConnection)?;
        if entry.rooms.contains(&room_id) {
            return Ok(false);
        }

        // UnknownRoom のときは接続側の集合も触らない
        self.directory.add_member(room_id, connection_id).await?;
        entry.rooms.insert(room_id);
        Ok(true)
    }

    /// Leave a room. Idempotent: leaving a room never joined is a no-op.
    pub async fn leave_room(
        &self,
        connection_id: ConnectionId,
        room_id: i64,
    ) -> Result<bool, RegistryError> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .get_mut(&connection_id)
            .ok_or(RegistryError::StaleConnection)?;
        if !entry.rooms.remove(&room_id) {
            return Ok(false);
        }

        self.directory.remove_member(room_id, connection_id).await?;
        Ok(true)
    }

    /// Retire a connection: remove it from every joined room and delete
    /// the record. Terminal; further operations return `StaleConnection`.
    ///
    /// 進行中の broadcast とは安全に並行できる。retire 後の接続は
    /// fan-out 時に senders_for で見つからず、単にスキップされる。
    pub async fn retire(&self, connection_id: ConnectionId) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .remove(&connection_id)
            .ok_or(RegistryError::StaleConnection)?;
        for room_id in entry.rooms {
            if let Err(e) = self.directory.remove_member(room_id, connection_id).await {
                tracing::warn!(
                    "retire of {} could not leave room {}: {}",
                    connection_id,
                    room_id,
                    e
                );
            }
        }
        Ok(())
    }

    pub async fn identity_of(&self, connection_id: ConnectionId) -> Result<Identity, RegistryError> {
        let inner = self.inner.lock().await;
        inner
            .get(&connection_id)
            .map(|entry| entry.identity.clone())
            .ok_or(RegistryError::StaleConnection)
    }

    pub async fn is_member(
        &self,
        connection_id: ConnectionId,
        room_id: i64,
    ) -> Result<bool, RegistryError> {
        let inner = self.inner.lock().await;
        inner
            .get(&connection_id)
            .map(|entry| entry.rooms.contains(&room_id))
            .ok_or(RegistryError::StaleConnection)
    }

    /// Outbound senders for the given targets, skipping retired connections.
    pub async fn senders_for(&self, targets: &[ConnectionId]) -> Vec<mpsc::Sender<String>> {
        let inner = self.inner.lock().await;
        targets
            .iter()
            .filter_map(|connection_id| inner.get(connection_id))
            .map(|entry| entry.sender.clone())
            .collect()
    }

    pub async fn connection_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.len()
    }
}
