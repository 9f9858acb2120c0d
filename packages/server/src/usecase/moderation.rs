//! Moderation Gate.
//!
//! 外部のモデレーション能力（遅い・落ちるかもしれない）を、
//! 有限のタイムアウトと明示的な失敗時ポリシーで包むゲート。
//! バックエンド障害は送信者にエラーとしては見せず、ポリシーに
//! 折り畳んでログに残す。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::domain::{Classification, ModerationBackend};

/// Policy applied when the backend fails or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Allow the message (chat availability over moderation completeness)
    Open,
    /// Block the message
    Closed,
}

impl FailurePolicy {
    fn fallback(self) -> Classification {
        match self {
            FailurePolicy::Open => Classification::Allow,
            FailurePolicy::Closed => Classification::Block,
        }
    }
}

/// Wraps a `ModerationBackend` with a bounded timeout and failure policy.
pub struct ModerationGate {
    backend: Arc<dyn ModerationBackend>,
    timeout: Duration,
    policy: FailurePolicy,
}

impl ModerationGate {
    pub fn new(backend: Arc<dyn ModerationBackend>, timeout: Duration, policy: FailurePolicy) -> Self {
        Self {
            backend,
            timeout,
            policy,
        }
    }

    /// Classify message text. Exactly one attempt against the backend;
    /// errors and timeouts fall back to the configured policy.
    pub async fn classify(&self, content: &str) -> Classification {
        match timeout(self.timeout, self.backend.classify(content)).await {
            Ok(Ok(classification)) => classification,
            Ok(Err(e)) => {
                tracing::warn!("moderation backend failed ({}), applying {:?} policy", e, self.policy);
                self.policy.fallback()
            }
            Err(_) => {
                tracing::warn!(
                    "moderation backend timed out after {:?}, applying {:?} policy",
                    self.timeout,
                    self.policy
                );
                self.policy.fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::moderation::MockModerationBackend;
    use crate::domain::ModerationError;
    use async_trait::async_trait;

    /// Backend that never answers within any reasonable timeout.
    struct HangingBackend;

    #[async_trait]
    impl ModerationBackend for HangingBackend {
        async fn classify(&self, _content: &str) -> Result<Classification, ModerationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Classification::Allow)
        }
    }

    #[tokio::test]
    async fn test_backend_classification_passes_through() {
        // テスト項目: バックエンドの判定（Allow / Block）がそのまま返る
        // given (前提条件):
        let mut backend = MockModerationBackend::new();
        backend
            .expect_classify()
            .returning(|_| Ok(Classification::Block));
        let gate = ModerationGate::new(
            Arc::new(backend),
            Duration::from_secs(1),
            FailurePolicy::Open,
        );

        // when (操作):
        let result = gate.classify("nasty text").await;

        // then (期待する結果):
        assert_eq!(result, Classification::Block);
    }

    #[tokio::test]
    async fn test_backend_error_fails_open() {
        // テスト項目: fail-open ポリシーではバックエンド障害は Allow になる
        // given (前提条件):
        let mut backend = MockModerationBackend::new();
        backend.expect_classify().returning(|_| {
            Err(ModerationError::Unreachable("connection refused".to_string()))
        });
        let gate = ModerationGate::new(
            Arc::new(backend),
            Duration::from_secs(1),
            FailurePolicy::Open,
        );

        // when (操作):
        let result = gate.classify("hello").await;

        // then (期待する結果):
        assert_eq!(result, Classification::Allow);
    }

    #[tokio::test]
    async fn test_backend_error_fails_closed_when_configured() {
        // テスト項目: fail-closed ポリシーではバックエンド障害は Block になる
        // given (前提条件):
        let mut backend = MockModerationBackend::new();
        backend.expect_classify().returning(|_| {
            Err(ModerationError::MalformedResponse("not json".to_string()))
        });
        let gate = ModerationGate::new(
            Arc::new(backend),
            Duration::from_secs(1),
            FailurePolicy::Closed,
        );

        // when (操作):
        let result = gate.classify("hello").await;

        // then (期待する結果):
        assert_eq!(result, Classification::Block);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back_to_policy() {
        // テスト項目: タイムアウトはポリシーに折り畳まれ、無限に待たない
        // given (前提条件):
        let gate = ModerationGate::new(
            Arc::new(HangingBackend),
            Duration::from_millis(100),
            FailurePolicy::Open,
        );

        // when (操作):
        let result = gate.classify("hello").await;

        // then (期待する結果):
        assert_eq!(result, Classification::Allow);
    }
}
