//! Moderation capability trait.

use async_trait::async_trait;
use thiserror::Error;

/// Result of classifying message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Allow,
    Block,
}

/// Errors of the external moderation capability.
///
/// Gate（UseCase 層）がポリシーに従って握りつぶすため、
/// 送信者にそのまま伝播することはない。
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("moderation backend unreachable: {0}")]
    Unreachable(String),

    #[error("moderation backend returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// External content classification capability.
///
/// 実装は 1 回だけ判定を試みること。タイムアウトと失敗時ポリシーは
/// 呼び出し側（Moderation Gate）が持つ。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModerationBackend: Send + Sync {
    async fn classify(&self, content: &str) -> Result<Classification, ModerationError>;
}
