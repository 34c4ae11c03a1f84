//! Gemini API クライアント

use super::{request_body, send_generate, GenerateReply, TextGenerator};
use crate::error::Result;
use reqwest::Client;
use std::time::Duration;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    thinking_budget: u32,
}

impl GeminiClient {
    pub fn new(api_key: String, model: &str, thinking_budget: u32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.trim_start_matches("models/").to_string(),
            thinking_budget,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<GenerateReply> {
        let body = request_body(&self.model, self.thinking_budget, prompt);
        let request = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())]);

        tracing::debug!(model = %self.model, chars = prompt.chars().count(), "Gemini API呼び出し");
        send_generate(request, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_models_prefix() {
        let client = GeminiClient::new(
            "key".into(),
            "models/gemini-2.5-flash-preview-05-20",
            0,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-preview-05-20:generateContent"
        );
    }

    #[test]
    fn test_with_base_url() {
        let client = GeminiClient::new("key".into(), "gemini-2.5-flash", 0, Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
