//! UI 層（HTTP / WebSocket エンドポイント）
//!
//! 認証・ルーティング・接続ライフサイクルを担当し、
//! UseCase / Infrastructure 層を呼び出します。

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{ServerError, build_router, build_state, run_server};
