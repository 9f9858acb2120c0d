//! Ollama-compatible moderation backend.
//!
//! `/api/generate` にプロンプトを投げ、`OK` / `BAD` の単語ひとつで
//! 答えさせる。リトライはしない（ポリシーとタイムアウトは Gate 側）。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Classification, ModerationBackend, ModerationError};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Classifies message text via an Ollama-style generate API.
pub struct OllamaModerationBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaModerationBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

fn build_prompt(content: &str) -> String {
    let safe_content = content.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        "You are a content moderator.\n\
         Classify the following message as either \"OK\" or \"BAD\".\n\
         Answer ONLY with OK or BAD.\n\
         \n\
         Message: \"{safe_content}\""
    )
}

#[async_trait]
impl ModerationBackend for OllamaModerationBackend {
    async fn classify(&self, content: &str) -> Result<Classification, ModerationError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(content),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ModerationError::Unreachable(e.to_string()))?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModerationError::MalformedResponse(e.to_string()))?;

        let Some(answer) = body.response else {
            return Err(ModerationError::MalformedResponse(
                "missing response field".to_string(),
            ));
        };

        tracing::debug!("moderation backend answered: {}", answer.trim());
        if answer.trim().eq_ignore_ascii_case("BAD") {
            Ok(Classification::Block)
        } else {
            Ok(Classification::Allow)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_escapes_quotes_and_backslashes() {
        // テスト項目: プロンプト内のメッセージ引用が壊れないようエスケープされる
        // given (前提条件):
        let content = r#"say "hi" \ bye"#;

        // when (操作):
        let prompt = build_prompt(content);

        // then (期待する結果):
        assert!(prompt.contains(r#"say \"hi\" \\ bye"#));
        assert!(prompt.starts_with("You are a content moderator."));
    }

    #[tokio::test]
    async fn test_unreachable_backend_reports_error() {
        // テスト項目: 到達不能なバックエンドは Unreachable を返す（panic しない）
        // given (前提条件): 何も listen していないポート
        let backend = OllamaModerationBackend::new("http://127.0.0.1:9", "llama3");

        // when (操作):
        let result = backend.classify("hello").await;

        // then (期待する結果):
        assert!(matches!(result, Err(ModerationError::Unreachable(_))));
    }
}
