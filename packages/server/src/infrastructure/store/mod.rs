//! Message Store implementations.
//!
//! ドメイン層が定義する `MessageStore` trait の具体的な実装。
//! 本番は SQLite（sqlx）、テストおよび永続化なし運用では InMemory を使う。

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryMessageStore;
pub use sqlite::SqliteMessageStore;
