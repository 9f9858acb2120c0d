//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// RoomName validation error
    #[error("room name cannot be empty")]
    RoomNameEmpty,

    /// RoomName too long error
    #[error("room name cannot exceed {max} characters (got {actual})")]
    RoomNameTooLong { max: usize, actual: usize },

    /// MessageContent validation error (blank after trimming)
    #[error("message content cannot be empty")]
    MessageContentEmpty,
}

/// 認証エラー
///
/// 失敗理由（署名不正・期限切れ・形式不正）は呼び出し元に区別させない。
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthorized")]
    Unauthorized,
}

/// Connection Registry / Room Directory のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Operation on a retired or unknown connection
    #[error("connection is retired or unknown")]
    StaleConnection,

    /// Operation on a room that does not exist
    #[error("room {0} does not exist")]
    UnknownRoom(i64),
}

/// Message Store のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("message store unavailable: {0}")]
    Unavailable(String),
}

/// メッセージ送信パイプラインのエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// Sender connection is retired or unknown
    #[error("connection is retired or unknown")]
    StaleConnection,

    /// Sender has not joined the room it is sending to
    #[error("sender is not a member of room {0}")]
    NotAMember(i64),

    /// Content is blank after trimming
    #[error("message content is empty")]
    EmptyMessage,

    /// Moderation classified the content as Block
    #[error("message rejected by moderation")]
    Rejected,

    /// Persistence failed; nothing was delivered
    #[error("message store unavailable")]
    StoreUnavailable,
}
