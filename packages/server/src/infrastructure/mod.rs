//! Infrastructure layer.
//!
//! ドメイン層が定義する trait の具体的な実装（永続化・モデレーション・
//! トークン検証）と、ライブ状態を所有するコンポーネント
//! （Connection Registry / Room Directory）、および DTO。

pub mod directory;
pub mod dto;
pub mod moderation;
pub mod registry;
pub mod store;
pub mod token;

pub use directory::RoomDirectory;
pub use moderation::OllamaModerationBackend;
pub use registry::ConnectionRegistry;
pub use store::{InMemoryMessageStore, SqliteMessageStore};
pub use token::SessionAuthenticator;
