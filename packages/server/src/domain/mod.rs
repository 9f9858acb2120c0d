//! Domain layer for the chat server.
//!
//! ビジネスロジックの中核。DTO やインフラの都合から独立したモデルと、
//! 外部能力（永続化・モデレーション）を抽象化する trait を定義します。

pub mod entity;
pub mod error;
pub mod moderation;
pub mod store;
pub mod value_object;

pub use entity::{ConnectionId, Identity, Room, StoredMessage};
pub use error::{AuthError, RegistryError, SendError, StoreError, ValueObjectError};
pub use moderation::{Classification, ModerationBackend, ModerationError};
pub use store::MessageStore;
pub use value_object::{MessageContent, RoomName};
