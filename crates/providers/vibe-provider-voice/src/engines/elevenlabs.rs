//! ElevenLabs TTS Engine
//!
//! Default voice: Rachel (conversational, natural) on the monolingual v1 model.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use vibe_core::config::{
    DEFAULT_ELEVENLABS_BASE_URL, DEFAULT_ELEVENLABS_MODEL, DEFAULT_ELEVENLABS_VOICE_ID,
};
use vibe_core::http::shared_client;
use vibe_core::{Result, SpeechSynthesizer, SynthesizedAudio, VibeError};

/// MIME type of the audio ElevenLabs returns by default
const OUTPUT_CONTENT_TYPE: &str = "audio/mpeg";

/// ElevenLabs voice settings
#[derive(Debug, Clone, Copy, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
        }
    }
}

/// ElevenLabs TTS request
#[derive(Debug, Serialize)]
struct ElevenLabsTTSRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// ElevenLabs speech synthesis adapter
pub struct ElevenLabsSynthesizer {
    api_key: String,
    voice_id: String,
    model_id: String,
    base_url: String,
    client: Client,
}

impl ElevenLabsSynthesizer {
    /// Create a synthesizer with the default voice and model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            voice_id: DEFAULT_ELEVENLABS_VOICE_ID.to_string(),
            model_id: DEFAULT_ELEVENLABS_MODEL.to_string(),
            base_url: DEFAULT_ELEVENLABS_BASE_URL.to_string(),
            client: shared_client(),
        }
    }

    /// Speak with a different voice
    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }

    /// Use a different model, e.g. `eleven_multilingual_v2`
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
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

    /// Voice used when a request names none
    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    /// Model requests are sent to
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize<'a>(&self, text: &str, voice_id: Option<&'a str>) -> Result<SynthesizedAudio> {
        let voice_id = voice_id.unwrap_or(&self.voice_id);
        let request = ElevenLabsTTSRequest {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings::default(),
        };

        tracing::debug!(
            "ElevenLabs TTS request: model={}, voice={}, text_len={}",
            request.model_id,
            voice_id,
            text.len()
        );

        let url = format!("{}/text-to-speech/{}", self.base_url, voice_id);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", OUTPUT_CONTENT_TYPE)
            .json(&request)
            .send()
            .await
            .map_err(|e| VibeError::synthesis(format!("ElevenLabs request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("ElevenLabs TTS error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 => VibeError::synthesis(format!(
                    "ElevenLabs authentication failed: {}",
                    error_text
                )),
                429 => VibeError::synthesis(format!(
                    "ElevenLabs rate limit exceeded: {}",
                    error_text
                )),
                _ => VibeError::synthesis(format!(
                    "ElevenLabs TTS error ({}): {}",
                    status, error_text
                )),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(OUTPUT_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VibeError::synthesis(format!("ElevenLabs response failed: {}", e)))?;

        tracing::debug!("ElevenLabs TTS response: {} bytes", bytes.len());

        Ok(SynthesizedAudio {
            bytes,
            content_type,
        })
    }
}
