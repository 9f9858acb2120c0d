//! Room Directory.
//!
//! ルームの正本集合と、ルーム毎のライブ membership index
//! （roomId → 接続 ID の集合）を所有するコンポーネント。
//! membership は ephemeral で永続化されない。
//!
//! membership の集合はルーム毎の lock で守る。Broadcast Engine の
//! worker は「fan-out 用 snapshot」と「persist」をこの lock の下で
//! 行うため、join / leave と配信順序が競合しない。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, RegistryError, Room, RoomName};

/// Live membership of a single room.
#[derive(Debug, Default)]
pub struct RoomMembers {
    members: HashSet<ConnectionId>,
}

impl RoomMembers {
    /// Returns true when the connection was not yet a member.
    pub fn insert(&mut self, connection_id: ConnectionId) -> bool {
        self.members.insert(connection_id)
    }

    /// Returns true when the connection was a member.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> bool {
        self.members.remove(connection_id)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains(connection_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Consistent snapshot of the current member set.
    pub fn snapshot(&self) -> Vec<ConnectionId> {
        self.members.iter().copied().collect()
    }
}

struct RoomEntry {
    room: Room,
    members: Arc<Mutex<RoomMembers>>,
}

#[derive(Default)]
struct DirectoryInner {
    next_room_id: i64,
    by_name: HashMap<String, i64>,
    rooms: HashMap<i64, RoomEntry>,
}

/// Authoritative set of rooms plus the per-room live membership index.
pub struct RoomDirectory {
    inner: Mutex<DirectoryInner>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(DirectoryInner {
                next_room_id: 1,
                ..DirectoryInner::default()
            }),
        }
    }

    /// 既存ルームを返すか、なければ作成する（冪等）。
    ///
    /// 同名での並行作成はどちらか一方だけが作成に成功し、
    /// もう一方には既存ルームが返る。
    ///
    /// # Returns
    ///
    /// `(room, created)` — `created` はこの呼び出しで新規作成されたかどうか
    pub async fn ensure_room(&self, name: &RoomName) -> (Room, bool) {
        let mut inner = self.inner.lock().await;

        if let Some(&id) = inner.by_name.get(name.as_str())
            && let Some(entry) = inner.rooms.get(&id)
        {
            return (entry.room.clone(), false);
        }

        let id = inner.next_room_id;
        inner.next_room_id += 1;
        let room = Room {
            id,
            name: name.clone(),
        };
        inner.by_name.insert(name.as_str().to_string(), id);
        inner.rooms.insert(
            id,
            RoomEntry {
                room: room.clone(),
                members: Arc::new(Mutex::new(RoomMembers::default())),
            },
        );
        tracing::info!("room '{}' created with id {}", room.name, id);

        (room, true)
    }

    /// Snapshot of all rooms, ascending by id. Not live-updating.
    pub async fn list_rooms(&self) -> Vec<Room> {
        let inner = self.inner.lock().await;
        let mut rooms = inner
            .rooms
            .values()
            .map(|entry| entry.room.clone())
            .collect::<Vec<_>>();
        rooms.sort_by_key(|room| room.id);
        rooms
    }

    pub async fn room_by_id(&self, room_id: i64) -> Option<Room> {
        let inner = self.inner.lock().await;
        inner.rooms.get(&room_id).map(|entry| entry.room.clone())
    }

    /// Handle to the per-room membership lock.
    ///
    /// Broadcast Engine の worker が snapshot と persist を
    /// 同じ lock の下で行うために使う。
    pub async fn members_handle(&self, room_id: i64) -> Option<Arc<Mutex<RoomMembers>>> {
        let inner = self.inner.lock().await;
        inner.rooms.get(&room_id).map(|entry| entry.members.clone())
    }

    /// Consistent snapshot of the live member set of a room.
    pub async fn members_of(&self, room_id: i64) -> Result<Vec<ConnectionId>, RegistryError> {
        let handle = self
            .members_handle(room_id)
            .await
            .ok_or(RegistryError::UnknownRoom(room_id))?;
        let members = handle.lock().await;
        Ok(members.snapshot())
    }

    /// membership index への追加。Connection Registry だけが呼ぶ。
    pub(crate) async fn add_member(
        &self,
        room_id: i64,
        connection_id: ConnectionId,
    ) -> Result<bool, RegistryError> {
        let handle = self
            .members_handle(room_id)
            .await
            .ok_or(RegistryError::UnknownRoom(room_id))?;
        let mut members = handle.lock().await;
        Ok(members.insert(connection_id))
    }

    /// membership index からの削除。Connection Registry だけが呼ぶ。
    pub(crate) async fn remove_member(
        &self,
        room_id: i64,
        connection_id: ConnectionId,
    ) -> Result<bool, RegistryError> {
        let handle = self
            .members_handle(room_id)
            .await
            .ok_or(RegistryError::UnknownRoom(room_id))?;
        let mut members = handle.lock().await;
        Ok(members.remove(&connection_id))
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}
