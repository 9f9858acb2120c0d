//! Broadcast Engine.
//!
//! メッセージ送信パイプライン（validate → moderate → persist →
//! fan-out）の調停役。ルーム毎に 1 つの worker タスクを持ち、
//! 同一ルーム宛のメッセージを直列に処理することで persist 順序と
//! 配信順序を一致させる。別ルームの worker は完全に並行に進む。
//!
//! 受理済みの送信は送信者の接続の生存期間に束縛されない。
//! 送信者が途中で切断しても、メッセージは永続化され残りのメンバーに
//! 配信される。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};

use crate::domain::{
    Classification, ConnectionId, Identity, MessageContent, MessageStore, SendError, StoredMessage,
};
use crate::infrastructure::directory::RoomDirectory;
use crate::infrastructure::dto::websocket::ServerEvent;
use crate::infrastructure::registry::ConnectionRegistry;

use super::moderation::ModerationGate;

struct SendJob {
    sender: Identity,
    content: MessageContent,
    reply: oneshot::Sender<Result<StoredMessage, SendError>>,
}

/// Coordinates moderation, persistence and fan-out per room.
pub struct BroadcastEngine {
    registry: Arc<ConnectionRegistry>,
    directory: Arc<RoomDirectory>,
    store: Arc<dyn MessageStore>,
    gate: Arc<ModerationGate>,
    queue_capacity: usize,
    workers: Mutex<HashMap<i64, mpsc::Sender<SendJob>>>,
}

impl BroadcastEngine {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        directory: Arc<RoomDirectory>,
        store: Arc<dyn MessageStore>,
        gate: Arc<ModerationGate>,
        queue_capacity: usize,
    ) -> Self {
        Self {
            registry,
            directory,
            store,
            gate,
            queue_capacity,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Run the send pipeline for one inbound message.
    ///
    /// membership はクライアントの申告ではなく registry で検証する。
    /// 受理（moderate 以降）はルームの worker キューに委ねられ、
    /// この呼び出しの await が途中で破棄されても送信自体は完走する。
    pub async fn send(
        &self,
        connection_id: ConnectionId,
        room_id: i64,
        raw_content: &str,
    ) -> Result<StoredMessage, SendError> {
        let sender = self
            .registry
            .identity_of(connection_id)
            .await
            .map_err(|_| SendError::StaleConnection)?;
        let is_member = self
            .registry
            .is_member(connection_id, room_id)
            .await
            .map_err(|_| SendError::StaleConnection)?;
        if !is_member {
            return Err(SendError::NotAMember(room_id));
        }
        let content = MessageContent::new(raw_content).map_err(|_| SendError::EmptyMessage)?;

        let worker = self.worker_for(room_id).await;
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = SendJob {
            sender,
            content,
            reply: reply_tx,
        };
        if worker.send(job).await.is_err() {
            // worker は engine と同じ寿命を持つ。ここに来るのは異常時のみ
            return Err(SendError::StoreUnavailable);
        }

        match reply_rx.await {
            Ok(result) => result,
            Err(_) => Err(SendError::StoreUnavailable),
        }
    }

    /// ルームの worker キューを取得する（なければ spawn）。
    async fn worker_for(&self, room_id: i64) -> mpsc::Sender<SendJob> {
        let mut workers = self.workers.lock().await;
        if let Some(tx) = workers.get(&room_id) {
            return tx.clone();
        }

        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let worker = RoomWorker {
            room_id,
            registry: self.registry.clone(),
            directory: self.directory.clone(),
            store: self.store.clone(),
            gate: self.gate.clone(),
        };
        tokio::spawn(worker.run(rx));
        workers.insert(room_id, tx.clone());
        tracing::debug!("spawned broadcast worker for room {}", room_id);
        tx
    }
}

/// 1 room 1 worker。キューを直列に処理する。
struct RoomWorker {
    room_id: i64,
    registry: Arc<ConnectionRegistry>,
    directory: Arc<RoomDirectory>,
    store: Arc<dyn MessageStore>,
    gate: Arc<ModerationGate>,
}

impl RoomWorker {
    async fn run(self, mut rx: mpsc::Receiver<SendJob>) {
        while let Some(job) = rx.recv().await {
            let result = self.process(job.sender, job.content).await;
            // 送信者が reply を待たずに切断していても送信は完了している
            let _ = job.reply.send(result);
        }
    }

    async fn process(
        &self,
        sender: Identity,
        content: MessageContent,
    ) -> Result<StoredMessage, SendError> {
        // moderation はルームの lock の外で待つ（遅くても join / leave を塞がない）
        if self.gate.classify(content.as_str()).await == Classification::Block {
            tracing::info!(
                "message from user {} to room {} rejected by moderation",
                sender.id,
                self.room_id
            );
            return Err(SendError::Rejected);
        }

        let Some(members) = self.directory.members_handle(self.room_id).await else {
            return Err(SendError::NotAMember(self.room_id));
        };

        // persist と membership snapshot を同じルーム lock の下で行う。
        // join / leave はこの間待たされるが、配信順序は persist 順序と一致する
        let guard = members.lock().await;
        let message = match self.store.append(self.room_id, &sender, &content).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("append to room {} failed: {}", self.room_id, e);
                return Err(SendError::StoreUnavailable);
            }
        };
        let targets = guard.snapshot();
        drop(guard);

        // fan-out は best-effort。詰まった・閉じた接続はこのメッセージだけ落とす
        let event = ServerEvent::Message {
            message: message.clone(),
        };
        let payload = serde_json::to_string(&event).unwrap();
        let mut delivered = 0usize;
        for outbound in self.registry.senders_for(&targets).await {
            match outbound.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        "outbound queue full for a member of room {}, dropping delivery of message {}",
                        self.room_id,
                        message.id
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
        tracing::debug!(
            "room {}: message {} delivered to {} connection(s)",
            self.room_id,
            message.id,
            delivered
        );

        Ok(message)
    }
}
