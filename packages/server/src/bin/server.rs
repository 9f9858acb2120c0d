//! Room-based WebSocket chat server with moderated, persisted broadcast.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsudoi-server
//! ```

use clap::Parser;

use tsudoi_server::ServerConfig;
use tsudoi_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::parse();

    // Run the server
    if let Err(e) = tsudoi_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
