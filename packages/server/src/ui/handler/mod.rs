//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{create_room, health_check, list_rooms, message_history};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;

use axum::http::HeaderMap;

/// Extract the session token from a request.
///
/// `Authorization: Bearer <token>` を優先し、なければ `token` Cookie を
/// 探す。どちらにも無ければ None。
pub(crate) fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION)
        && let Ok(value) = value.to_str()
        && let Some(token) = value.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "token").then(|| value.to_string())
    })
}
