//! Shared application state.

use std::sync::Arc;

use crate::domain::MessageStore;
use crate::infrastructure::{ConnectionRegistry, RoomDirectory, SessionAuthenticator};
use crate::usecase::BroadcastEngine;

/// Shared application state
pub struct AppState {
    /// セッショントークンの検証（副作用なし）
    pub authenticator: SessionAuthenticator,
    /// ライブ接続の正本
    pub registry: Arc<ConnectionRegistry>,
    /// ルームの正本集合と membership index
    pub directory: Arc<RoomDirectory>,
    /// Message Store（永続化層の抽象化）
    pub store: Arc<dyn MessageStore>,
    /// 送信パイプラインの調停役
    pub engine: Arc<BroadcastEngine>,
    /// Capacity of each connection's outbound queue
    pub outbound_capacity: usize,
    /// Maximum number of messages replayed on join
    pub replay_limit: usize,
}
