//! generateContent のリクエスト/レスポンス（Gemini API・Vertex AI共通）

use super::TokenUsage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
pub struct RequestPart {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

impl GenerateContentRequest {
    /// テキスト1件のリクエスト。思考予算は対応モデルのときだけ付ける
    pub fn text(prompt: &str, thinking_budget: Option<u32>) -> Self {
        Self {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: thinking_budget.map(|budget| GenerationConfig {
                thinking_config: ThinkingConfig {
                    thinking_budget: budget,
                },
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateContentResponse {
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Candidate {
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResponseContent {
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResponsePart {
    pub text: Option<String>,
    /// 思考過程のパート
    pub thought: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageMetadata {
    pub prompt_token_count: u64,
    pub candidates_token_count: u64,
    pub thoughts_token_count: u64,
    pub cached_content_token_count: u64,
}

impl GenerateContentResponse {
    /// 最初の候補の本文（思考パートを除いて連結）
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage_metadata
            .as_ref()
            .map(|u| TokenUsage {
                input: u.prompt_token_count,
                output: u.candidates_token_count,
                thinking: u.thoughts_token_count,
                cached: u.cached_content_token_count,
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_without_thinking() {
        let body = serde_json::to_value(GenerateContentRequest::text("占って", None)).unwrap();
        assert_eq!(
            body,
            json!({"contents": [{"role": "user", "parts": [{"text": "占って"}]}]})
        );
    }

    #[test]
    fn test_request_with_thinking_budget() {
        let body = serde_json::to_value(GenerateContentRequest::text("占って", Some(0))).unwrap();
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
    }

    #[test]
    fn test_response_text_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "考え中", "thought": true},
                    {"text": "{\"回答\": "},
                    {"text": "\"良い\"}"}
                ]}
            }],
            "usageMetadata": {
                "promptTokenCount": 120,
                "candidatesTokenCount": 80,
                "thoughtsTokenCount": 30,
                "totalTokenCount": 230
            }
        }))
        .unwrap();

        assert_eq!(response.text(), "{\"回答\": \"良い\"}");
        let usage = response.usage();
        assert_eq!(usage.input, 120);
        assert_eq!(usage.output, 80);
        assert_eq!(usage.thinking, 30);
        assert_eq!(usage.cached, 0);
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert_eq!(response.text(), "");
        assert_eq!(response.usage(), TokenUsage::default());
    }
}
