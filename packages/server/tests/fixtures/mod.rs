//! Integration test fixtures.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use tsudoi_server::ServerConfig;
use tsudoi_server::domain::Identity;
use tsudoi_server::infrastructure::SessionAuthenticator;
use tsudoi_server::ui::{build_router, build_state};

/// Server instance bound to an ephemeral port.
///
/// モデレーションバックエンドには誰も listen していないポートを指定する。
/// fail-open ポリシーのため、接続拒否はただちに Allow に折り畳まれる。
pub struct TestServer {
    addr: SocketAddr,
    token_secret: String,
}

impl TestServer {
    pub async fn start() -> Self {
        let config = ServerConfig::parse_from([
            "tsudoi-server",
            "--bind-addr",
            "127.0.0.1:0",
            "--token-secret",
            "integration-test-secret",
            "--moderation-url",
            "http://127.0.0.1:9",
            "--moderation-timeout-ms",
            "500",
        ]);

        let state = build_state(&config).await.expect("Failed to build state");
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server stopped unexpectedly");
        });

        Self {
            addr,
            token_secret: config.token_secret,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    #[allow(dead_code)] // 全テストバイナリが WebSocket を使うわけではない
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Issue a valid session token for the given user.
    pub fn token_for(&self, id: i64, name: &str) -> String {
        let authenticator = SessionAuthenticator::new(self.token_secret.clone());
        authenticator.issue(
            &Identity {
                id,
                display_name: name.to_string(),
            },
            Duration::from_secs(3600),
        )
    }
}
