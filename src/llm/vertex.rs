//! Vertex AI クライアント
//!
//! アクセストークンは環境変数 VERTEX_ACCESS_TOKEN、無ければ
//! `gcloud auth print-access-token` から取得する。
//! gcloudのトークンは約60分で失効するので、50分経ったものと
//! 401が返ったときは取り直す（401の再送は1回だけ）

use super::types::GenerateContentRequest;
use super::{read_generate, request_body, GenerateReply, TextGenerator};
use crate::error::{FortuneAiError, Result};
use reqwest::{Client, Response, StatusCode};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Mutex;

/// トークンを使い続ける上限
const TOKEN_MAX_AGE: Duration = Duration::from_secs(50 * 60);

struct AccessToken {
    value: String,
    fetched_at: Instant,
}

impl AccessToken {
    async fn fetch() -> Result<Self> {
        Ok(Self {
            value: fetch_access_token().await?,
            fetched_at: Instant::now(),
        })
    }

    fn is_stale(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) >= TOKEN_MAX_AGE
    }
}

pub struct VertexClient {
    client: Client,
    project: String,
    location: String,
    model: String,
    thinking_budget: u32,
    token: Mutex<AccessToken>,
}

impl VertexClient {
    pub async fn new(
        project: String,
        location: String,
        model: &str,
        thinking_budget: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let token = AccessToken::fetch().await?;
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            project,
            location,
            model: model.trim_start_matches("models/").to_string(),
            thinking_budget,
            token: Mutex::new(token),
        })
    }

    pub fn endpoint(&self) -> String {
        endpoint(&self.project, &self.location, &self.model)
    }

    async fn current_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if token.is_stale(Instant::now()) {
            tracing::debug!("アクセストークンの期限が近いため再取得");
            *token = AccessToken::fetch().await?;
        }
        Ok(token.value.clone())
    }

    async fn refresh_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        *token = AccessToken::fetch().await?;
        Ok(token.value.clone())
    }

    async fn post(&self, token: &str, body: &GenerateContentRequest) -> Result<Response> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

fn endpoint(project: &str, location: &str, model: &str) -> String {
    format!(
        "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent"
    )
}

impl TextGenerator for VertexClient {
    async fn generate(&self, prompt: &str) -> Result<GenerateReply> {
        let body = request_body(&self.model, self.thinking_budget, prompt);
        tracing::debug!(model = %self.model, project = %self.project, "Vertex AI呼び出し");

        let token = self.current_token().await?;
        let response = self.post(&token, &body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return read_generate(response).await;
        }

        tracing::warn!("Vertex AIの認証が失効しました。トークンを再取得して再送します");
        let token = self.refresh_token().await?;
        let retry = self.post(&token, &body).await?;
        read_generate(retry).await
    }
}

async fn fetch_access_token() -> Result<String> {
    if let Ok(token) = std::env::var("VERTEX_ACCESS_TOKEN") {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }

    // gcloud呼び出し（Windowsではcmd /c経由）
    #[cfg(windows)]
    let output = Command::new("cmd")
        .args(["/c", "gcloud", "auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| FortuneAiError::Config(format!("gcloud実行エラー: {}", e)))?;

    #[cfg(not(windows))]
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| FortuneAiError::Config(format!("gcloud実行エラー: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FortuneAiError::Config(format!(
            "アクセストークンを取得できません (code {:?}): {}",
            output.status.code(),
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(FortuneAiError::Config("gcloudのアクセストークンが空です".into()));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        assert_eq!(
            endpoint("my-proj", "asia-northeast1", "gemini-2.5-pro"),
            "https://asia-northeast1-aiplatform.googleapis.com/v1/projects/my-proj/locations/asia-northeast1/publishers/google/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_token_refresh_after_max_age() {
        let token = AccessToken {
            value: "ya29.test".to_string(),
            fetched_at: Instant::now(),
        };

        assert!(!token.is_stale(token.fetched_at));
        assert!(!token.is_stale(token.fetched_at + Duration::from_secs(49 * 60)));
        assert!(token.is_stale(token.fetched_at + TOKEN_MAX_AGE));
        assert!(token.is_stale(token.fetched_at + Duration::from_secs(61 * 60)));
    }

    #[tokio::test]
    async fn test_token_from_env_is_fresh() {
        std::env::set_var("VERTEX_ACCESS_TOKEN", " ya29.env-token \n");
        let token = AccessToken::fetch().await.unwrap();
        std::env::remove_var("VERTEX_ACCESS_TOKEN");

        assert_eq!(token.value, "ya29.env-token");
        assert!(!token.is_stale(Instant::now()));
    }
}
