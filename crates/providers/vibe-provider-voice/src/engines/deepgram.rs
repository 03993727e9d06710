//! Deepgram STT Engine
//!
//! Prerecorded transcription through `POST /listen` with the `nova-2` model.
//! Deepgram has returned transcripts under several different shapes, so
//! extraction walks an ordered list of known locations.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use vibe_core::config::DEFAULT_DEEPGRAM_BASE_URL;
use vibe_core::http::{provider_message, shared_client};
use vibe_core::{Result, SpeechToText, Transcript, VibeError};

/// Deepgram model used for transcription
const DEEPGRAM_MODEL: &str = "nova-2";

/// Recognition language
const DEEPGRAM_LANGUAGE: &str = "en";

/// Where a transcript may live in a Deepgram response, tried in order
///
/// Compatibility shim for provider response drift.
const TRANSCRIPT_POINTERS: &[&str] = &[
    "/results/channels/0/alternatives/0/transcript",
    "/channel/alternatives/0/transcript",
    "/results/transcript",
    "/transcript",
];

/// Where the confidence of the best alternative lives
const CONFIDENCE_POINTER: &str = "/results/channels/0/alternatives/0/confidence";

/// First non-empty transcript found in a Deepgram response
pub fn extract_transcript(response: &Value) -> Option<String> {
    TRANSCRIPT_POINTERS.iter().find_map(|ptr| {
        response
            .pointer(ptr)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    })
}

/// Confidence of the best alternative, if reported
pub fn extract_confidence(response: &Value) -> Option<f64> {
    response.pointer(CONFIDENCE_POINTER).and_then(Value::as_f64)
}

/// Deepgram speech-to-text adapter
pub struct DeepgramTranscriber {
    api_key: String,
    base_url: String,
    client: Client,
}

impl DeepgramTranscriber {
    /// Create a transcriber against the public API
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_DEEPGRAM_BASE_URL.to_string(),
            client: shared_client(),
        }
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

    fn listen_url(&self) -> String {
        format!("{}/listen", self.base_url)
    }
}

#[async_trait]
impl SpeechToText for DeepgramTranscriber {
    fn name(&self) -> &str {
        "deepgram"
    }

    async fn transcribe(&self, audio: &[u8], content_type: &str) -> Result<Transcript> {
        tracing::debug!(
            "Deepgram STT request: model={}, content_type={}, bytes={}",
            DEEPGRAM_MODEL,
            content_type,
            audio.len()
        );

        let response = self
            .client
            .post(self.listen_url())
            .query(&[
                ("model", DEEPGRAM_MODEL),
                ("smart_format", "true"),
                ("language", DEEPGRAM_LANGUAGE),
            ])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", content_type)
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| VibeError::transcription(format!("Deepgram API failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Deepgram STT error ({}): {}", status, error_text);
            return Err(VibeError::transcription(format!(
                "Deepgram API failed: {}",
                provider_message(&error_text)
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VibeError::transcription(format!("Deepgram API failed: {}", e)))?;

        let text = extract_transcript(&body).unwrap_or_default();
        let confidence = extract_confidence(&body);

        tracing::debug!(
            "Deepgram STT response: {} chars, confidence={:?}",
            text.len(),
            confidence
        );

        Ok(Transcript { text, confidence })
    }
}
