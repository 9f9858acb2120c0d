//! tsudoi — room-based WebSocket chat server.
//!
//! Layered DDD 構成（domain / usecase / infrastructure / ui）の
//! ルーム制チャットサーバライブラリ。
//! 認証済みの長寿命接続、ルーム membership、永続化とモデレーションを
//! 直列化した broadcast を提供します。

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use ui::run_server;
