//! Server configuration.
//!
//! すべて CLI フラグまたは環境変数で与えられる。

use std::net::SocketAddr;

use clap::Parser;

/// Room-based chat server configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "tsudoi-server", about = "Room-based WebSocket chat server")]
pub struct ServerConfig {
    /// Listen address
    #[arg(long, env = "TSUDOI_BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind_addr: SocketAddr,

    /// HMAC secret for session token verification
    #[arg(long, env = "TSUDOI_TOKEN_SECRET", default_value = "dev-secret-change-me")]
    pub token_secret: String,

    /// SQLite database URL (e.g. `sqlite://tsudoi.db`).
    /// 省略時はメモリ上にのみ保存される
    #[arg(long, env = "TSUDOI_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Base URL of the Ollama-compatible moderation backend
    #[arg(long, env = "TSUDOI_MODERATION_URL", default_value = "http://localhost:11434")]
    pub moderation_url: String,

    /// Model name passed to the moderation backend
    #[arg(long, env = "TSUDOI_MODERATION_MODEL", default_value = "llama3")]
    pub moderation_model: String,

    /// Moderation timeout in milliseconds
    #[arg(long, env = "TSUDOI_MODERATION_TIMEOUT_MS", default_value_t = 5000)]
    pub moderation_timeout_ms: u64,

    /// Block messages when the moderation backend fails (default: allow)
    #[arg(long, env = "TSUDOI_MODERATION_FAIL_CLOSED", default_value_t = false)]
    pub moderation_fail_closed: bool,

    /// Capacity of each connection's outbound queue
    #[arg(long, default_value_t = 256)]
    pub outbound_capacity: usize,

    /// Capacity of each room's send queue
    #[arg(long, default_value_t = 64)]
    pub room_queue_capacity: usize,

    /// Maximum number of messages replayed on join
    #[arg(long, default_value_t = 50)]
    pub replay_limit: usize,
}
