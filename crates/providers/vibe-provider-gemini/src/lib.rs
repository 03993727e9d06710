//! Google Gemini integration for Vibespark
//!
//! Generates the companion's reply with `models/{model}:generateContent`.

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use vibe_core::config::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use vibe_core::http::{provider_message, shared_client};
use vibe_core::{AiReply, ReplyGenerator, Result, VibeError};

/// Build the fixed VIBE-BUDDY prompt around what the user said
pub fn persona_prompt(transcript: &str) -> String {
    format!(
        "You are VIBE-BUDDY, an empathetic AI friend.\n\
         Your purpose: Make users feel heard.\n\
         Tone: Warm, conversational, curious.\n\
         Rules: Keep replies short (2 sentences max). No lectures. Ask one follow-up question.\n\
         User said: \"{}\"",
        transcript
    )
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Gemini reply generation adapter
pub struct GeminiReplyGenerator {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiReplyGenerator {
    /// Create a generator using the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            client: shared_client(),
        }
    }

    /// Use a different model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a specific HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Model in use
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send an arbitrary prompt and return the first candidate's text
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        tracing::debug!(
            "Gemini request: model={}, prompt_len={}",
            self.model,
            prompt.len()
        );

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| VibeError::generation(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini error ({}): {}", status, error_text);
            return Err(VibeError::generation(format!(
                "Gemini API error ({}): {}",
                status,
                provider_message(&error_text)
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| VibeError::generation(format!("Gemini response invalid: {}", e)))?;

        let text = body
            .first_text()
            .ok_or_else(|| VibeError::generation("Gemini returned no candidates"))?;

        tracing::debug!("Gemini response: {} chars", text.len());
        Ok(text)
    }
}

#[async_trait]
impl ReplyGenerator for GeminiReplyGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, transcript: &str) -> Result<AiReply> {
        let text = self.complete(&persona_prompt(transcript)).await?;
        Ok(AiReply { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Seen {
        model_path: String,
        key: Option<String>,
        prompt: String,
    }

    async fn start_mock_gemini(reply: Value, status: StatusCode) -> (SocketAddr, Arc<Mutex<Seen>>) {
        let seen = Arc::new(Mutex::new(Seen::default()));

        async fn generate(
            State((seen, reply, status)): State<(Arc<Mutex<Seen>>, Value, StatusCode)>,
            Path(model_path): Path<String>,
            Query(query): Query<HashMap<String, String>>,
            Json(body): Json<Value>,
        ) -> impl IntoResponse {
            let mut s = seen.lock().unwrap();
            s.model_path = model_path;
            s.key = query.get("key").cloned();
            s.prompt = body["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            (status, Json(reply))
        }

        let app = Router::new()
            .route("/models/:model_path", post(generate))
            .with_state((seen.clone(), reply, status));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, seen)
    }

    #[test]
    fn test_persona_prompt_embeds_transcript() {
        let prompt = persona_prompt("I had a rough day");
        assert!(prompt.starts_with("You are VIBE-BUDDY, an empathetic AI friend."));
        assert!(prompt.contains("2 sentences max"));
        assert!(prompt.contains("Ask one follow-up question."));
        assert!(prompt.ends_with("User said: \"I had a rough day\""));
    }

    #[test]
    fn test_first_text() {
        let body: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "Hey!"}], "role": "model"}}]
        }))
        .unwrap();
        assert_eq!(body.first_text().as_deref(), Some("Hey!"));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.first_text(), None);
    }

    #[tokio::test]
    async fn test_generate_sends_persona_prompt() {
        let reply = json!({
            "candidates": [{"content": {"parts": [{"text": "That sounds hard. What happened?"}]}}]
        });
        let (addr, seen) = start_mock_gemini(reply, StatusCode::OK).await;

        let llm = GeminiReplyGenerator::new("gm-key").with_base_url(format!("http://{}", addr));
        let reply = llm.generate("hello").await.unwrap();

        assert_eq!(reply.text, "That sounds hard. What happened?");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.model_path, "gemini-1.5-flash-001:generateContent");
        assert_eq!(seen.key.as_deref(), Some("gm-key"));
        assert_eq!(seen.prompt, persona_prompt("hello"));
    }

    #[tokio::test]
    async fn test_generate_custom_model() {
        let reply = json!({"candidates": [{"content": {"parts": [{"text": "ok"}]}}]});
        let (addr, seen) = start_mock_gemini(reply, StatusCode::OK).await;

        let llm = GeminiReplyGenerator::new("k")
            .with_model("gemini-2.0-flash")
            .with_base_url(format!("http://{}", addr));
        llm.generate("hi").await.unwrap();

        assert_eq!(seen.lock().unwrap().model_path, "gemini-2.0-flash:generateContent");
    }

    #[tokio::test]
    async fn test_generate_no_candidates() {
        let (addr, _) = start_mock_gemini(json!({"candidates": []}), StatusCode::OK).await;

        let llm = GeminiReplyGenerator::new("k").with_base_url(format!("http://{}", addr));
        let err = llm.generate("hi").await.unwrap_err();
        assert!(matches!(err, VibeError::Generation(_)));
    }

    #[tokio::test]
    async fn test_generate_provider_error() {
        let body = json!({"error": {"code": 400, "message": "API key not valid"}});
        let (addr, _) = start_mock_gemini(body, StatusCode::BAD_REQUEST).await;

        let llm = GeminiReplyGenerator::new("bad").with_base_url(format!("http://{}", addr));
        let err = llm.generate("hi").await.unwrap_err();
        assert!(err.to_string().contains("API key not valid"));
    }
}
