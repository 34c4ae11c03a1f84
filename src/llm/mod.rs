//! LLM呼び出し
//!
//! - gemini: Gemini API（APIキー）
//! - vertex: Vertex AI（アクセストークン）
//!
//! バッチ処理は `TextGenerator` に対してジェネリックに書く（テストではモックを使う）

pub mod gemini;
pub mod types;
pub mod vertex;

pub use gemini::GeminiClient;
pub use vertex::VertexClient;

use crate::error::{FortuneAiError, Result};
use reqwest::{RequestBuilder, Response};
use std::ops::AddAssign;
use types::{GenerateContentRequest, GenerateContentResponse};

/// トークン使用量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub thinking: u64,
    pub cached: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input + self.output + self.thinking
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.input += other.input;
        self.output += other.output;
        self.thinking += other.thinking;
        self.cached += other.cached;
    }
}

/// モデルの返答
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReply {
    pub text: String,
    pub usage: TokenUsage,
}

/// プロンプト1件からテキストを生成する
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    async fn generate(&self, prompt: &str) -> Result<GenerateReply>;
}

/// 思考予算を送れるモデルか（2.5 Flash系のみ。Pro系は自動で思考する）
pub fn supports_thinking(model: &str) -> bool {
    let model = model.to_lowercase();
    model.contains("2.5") && model.contains("flash")
}

/// 実行時に選ばれたクライアント
pub enum Backend {
    Gemini(GeminiClient),
    Vertex(VertexClient),
}

impl TextGenerator for Backend {
    async fn generate(&self, prompt: &str) -> Result<GenerateReply> {
        match self {
            Backend::Gemini(client) => client.generate(prompt).await,
            Backend::Vertex(client) => client.generate(prompt).await,
        }
    }
}

fn request_body(model: &str, thinking_budget: u32, prompt: &str) -> GenerateContentRequest {
    let budget = supports_thinking(model).then_some(thinking_budget);
    GenerateContentRequest::text(prompt, budget)
}

/// generateContent を送信して本文と使用量を取り出す
async fn send_generate(request: RequestBuilder, body: &GenerateContentRequest) -> Result<GenerateReply> {
    let response = request.json(body).send().await?;
    read_generate(response).await
}

/// generateContent のレスポンスを読む（2xx以外はエラー）
async fn read_generate(response: Response) -> Result<GenerateReply> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(FortuneAiError::ApiCall(format!(
            "status {}: {}",
            status, error_text
        )));
    }

    let payload: GenerateContentResponse = response
        .json()
        .await
        .map_err(|e| FortuneAiError::ApiParse(e.to_string()))?;

    Ok(GenerateReply {
        text: payload.text(),
        usage: payload.usage(),
    })
}
