//! UseCase 層
//!
//! メッセージ送信パイプラインの調停役。UI 層から呼び出され、
//! Domain / Infrastructure 層を操作します。

pub mod broadcast;
pub mod moderation;

pub use broadcast::BroadcastEngine;
pub use moderation::{FailurePolicy, ModerationGate};
