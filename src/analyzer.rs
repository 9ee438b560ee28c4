// src/analyzer.rs
// Chat-completion client + response parsing into PartialAnalysis.

use crate::errors::AnalysisError;
use crate::types::PartialAnalysis;
use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;

lazy_static! {
    // Fenced ```json block, for models that wrap their JSON despite the
    // response_format instruction.
    static ref JSON_BLOCK_RE: Regex =
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid json block regex");
}

/// Seam between the orchestrator and the chat-completion endpoint.
#[async_trait]
pub trait AnalysisModel: Send + Sync {
    /// One chat completion: system prompt = strategy prompt, user content =
    /// formatted market data. No retries; any failure is pipeline-terminal.
    async fn analyze(
        &self,
        prompt: &str,
        formatted_data: &str,
    ) -> Result<PartialAnalysis, AnalysisError>;

    fn has_credentials(&self) -> bool {
        true
    }
}

// --- OpenAI-compatible wire types ---

#[derive(Serialize, Debug)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize, Debug)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize, Debug)]
struct ResponseFormat {
    #[serde(rename = "type")]
    type_: &'static str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: Option<String>,
}

pub struct OpenAiAnalyzer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiAnalyzer {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    /// Reads OPENAI_API_KEY / OPENAI_API_BASE / OPENAI_MODEL. A missing key
    /// does not fail construction; the orchestrator checks per request.
    pub fn from_env() -> Self {
        let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        let base_url =
            env::var("OPENAI_API_BASE").unwrap_or_else(|_| "https://api.openai.com".to_string());
        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        if api_key.is_empty() {
            warn!("[ANALYZER] OPENAI_API_KEY not set - analysis requests will be rejected");
        }
        Self::new(api_key, base_url, model)
    }
}

#[async_trait]
impl AnalysisModel for OpenAiAnalyzer {
    async fn analyze(
        &self,
        prompt: &str,
        formatted_data: &str,
    ) -> Result<PartialAnalysis, AnalysisError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: formatted_data.to_string(),
                },
            ],
            temperature: 0.2,
            max_tokens: 700,
            response_format: ResponseFormat {
                type_: "json_object",
            },
        };

        debug!("[ANALYZER] Requesting completion from model {}", self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Provider(format!(
                "chat completion returned {}: {}",
                status, body
            )));
        }

        let payload: ChatCompletionResponse = response.json().await?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        parse_partial_analysis(&content)
    }

    fn has_credentials(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Map raw completion text onto PartialAnalysis. Tries the whole body as
/// JSON first, then a fenced ```json block, then the outermost brace span.
pub fn parse_partial_analysis(content: &str) -> Result<PartialAnalysis, AnalysisError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::Parse("model returned empty content".to_string()));
    }

    if let Ok(parsed) = serde_json::from_str::<PartialAnalysis>(trimmed) {
        return Ok(parsed);
    }

    if let Some(caps) = JSON_BLOCK_RE.captures(trimmed) {
        if let Ok(parsed) = serde_json::from_str::<PartialAnalysis>(&caps[1]) {
            return Ok(parsed);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(parsed) = serde_json::from_str::<PartialAnalysis>(&trimmed[start..=end]) {
                return Ok(parsed);
            }
        }
    }

    Err(AnalysisError::Parse(format!(
        "model response is not a usable analysis object: {}",
        truncate_for_log(trimmed, 200)
    )))
}

fn truncate_for_log(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let content = r#"{"trend":"bullish","pattern":"double bottom","zone":{"price_low":1.08,"price_high":1.085},"reasoning":"ok","confidence":0.8}"#;
        let parsed = parse_partial_analysis(content).unwrap();
        assert_eq!(parsed.trend, "bullish");
        assert_eq!(parsed.zone.unwrap().bounds(), Some((1.08, 1.085)));
    }

    #[test]
    fn parses_fenced_json_block() {
        let content = "Here is my analysis:\n```json\n{\"micro_trend\":\"bearish\",\"entry_signal\":\"sell\",\"confidence\":0.6}\n```\nGood luck.";
        let parsed = parse_partial_analysis(content).unwrap();
        assert_eq!(parsed.trend, "bearish");
        assert_eq!(parsed.entry_signal.as_deref(), Some("sell"));
    }

    #[test]
    fn empty_content_is_a_parse_error() {
        let err = parse_partial_analysis("   ").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }

    #[test]
    fn prose_without_json_is_a_parse_error() {
        let err = parse_partial_analysis("The market looks bullish today.").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }
}
