//! Shared utilities for Tsudoi.
//!
//! サーバ・ツール間で共有するロギングと時刻のユーティリティ。

pub mod logger;
pub mod time;

pub use logger::setup_logger;
pub use time::unix_timestamp_millis;
