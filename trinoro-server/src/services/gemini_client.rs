//! Gemini generative-text client
//!
//! Sends one prompt per chat message and expects a JSON [`ChatReply`] back.
//! The model tends to wrap JSON in markdown fences; those are stripped before
//! parsing.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use trinoro_common::chat::ChatReply;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const USER_AGENT: &str = concat!("Trinoro/", env!("CARGO_PKG_VERSION"));

const PROMPT_TEMPLATE: &str = r#"
You are a compassionate meditation expert. A user is telling you how they feel.
Suggest a specific meditation or mindfulness exercise that matches their current emotional state.

User's feeling: "{message}"

Return ONLY a JSON object with this structure and no other text:
{
  "message": "A short, empathetic response acknowledging their feeling (max 2 sentences).",
  "recommendations": [
    {
      "type": "meditation",
      "title": "Name of the technique",
      "description": "Brief description of the technique.",
      "duration": "Length such as '5 min' or '10 min'",
      "action": {
        "type": "set-timer",
        "label": "Start Session",
        "duration": 5,
        "ambientSound": "rain"
      }
    }
  ]
}
"duration" inside "action" is a number of minutes. "ambientSound" is optional and is a
one-word search term for an ambient sound such as 'soft-rain', 'forest', 'fire', 'waves' or 'drone'.
"#;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid API key")]
    InvalidApiKey,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Prompt text for one user message
pub fn build_prompt(message: &str) -> String {
    PROMPT_TEMPLATE.replace("{message}", message)
}

/// Remove markdown code fences around a JSON payload
pub fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, GeminiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for a reply and recommendations for `message`
    pub async fn recommend(&self, message: &str) -> Result<ChatReply, GeminiError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let prompt = build_prompt(message);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        tracing::debug!(model = %self.model, "Requesting chat recommendation");

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 || status == 403 {
            return Err(GeminiError::InvalidApiKey);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeminiError::ApiError(status.as_u16(), error_text));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::ParseError(e.to_string()))?;

        let text: String = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GeminiError::EmptyResponse);
        }

        let reply: ChatReply = serde_json::from_str(&strip_fences(&text))
            .map_err(|e| GeminiError::ParseError(e.to_string()))?;

        tracing::info!(
            recommendations = reply.recommendations.len(),
            "Chat recommendation generated"
        );

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use trinoro_common::chat::{ActionKind, RecommendationKind};

    fn gemini_body(text: &str) -> String {
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        })
        .to_string()
    }

    #[test]
    fn test_prompt_embeds_message() {
        let prompt = build_prompt("I feel anxious about work");
        assert!(prompt.contains(r#"User's feeling: "I feel anxious about work""#));
        assert!(prompt.contains("set-timer"));
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), r#"{"a":1}"#);
        assert_eq!(strip_fences("  {\"a\":1}  "), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_recommend_parses_fenced_reply() {
        let reply_json = r#"```json
{
  "message": "That sounds heavy. Let's slow down together.",
  "recommendations": [
    {
      "type": "meditation",
      "title": "Body Scan",
      "description": "Move attention slowly from head to toe.",
      "duration": "10 min",
      "action": {"type": "set-timer", "label": "Start Session", "duration": 10, "ambientSound": "rain"}
    }
  ]
}
```"#;

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "k".into()))
            .match_body(Matcher::Regex("I feel tense".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_body(reply_json))
            .create_async()
            .await;

        let client = GeminiClient::new("k".into(), None, Some(server.url())).unwrap();
        let reply = client.recommend("I feel tense").await.unwrap();

        assert_eq!(reply.message, "That sounds heavy. Let's slow down together.");
        assert_eq!(reply.recommendations.len(), 1);
        let rec = &reply.recommendations[0];
        assert_eq!(rec.kind, RecommendationKind::Meditation);
        let action = rec.action.as_ref().unwrap();
        assert_eq!(action.kind, ActionKind::SetTimer);
        assert_eq!(action.duration, 10);
        assert_eq!(action.ambient_sound.as_deref(), Some("rain"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_recommend_rejects_non_json_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(gemini_body("Sorry, I can't help with that."))
            .create_async()
            .await;

        let client = GeminiClient::new("k".into(), None, Some(server.url())).unwrap();
        assert!(matches!(
            client.recommend("hello").await,
            Err(GeminiError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_recommend_empty_candidates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/custom-model:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let client =
            GeminiClient::new("k".into(), Some("custom-model".into()), Some(server.url())).unwrap();
        assert_eq!(client.model(), "custom-model");
        assert!(matches!(
            client.recommend("hello").await,
            Err(GeminiError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_recommend_invalid_key() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let client = GeminiClient::new("bad".into(), None, Some(server.url())).unwrap();
        assert!(matches!(
            client.recommend("hello").await,
            Err(GeminiError::InvalidApiKey)
        ));
    }
}
