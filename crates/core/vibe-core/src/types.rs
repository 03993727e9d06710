//! Core data model and adapter traits for the chat pipeline

use crate::pipeline::TempAudioFile;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Avatar used when the client does not name one
pub const DEFAULT_AVATAR_ID: &str = "default";

// ============================================================================
// Audio content types
// ============================================================================

/// Content type declared to the transcription service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioContentType {
    /// MPEG-4 audio (`.m4a`, and the fallback)
    #[default]
    Mp4,
    /// WAV
    Wav,
    /// MP3
    Mpeg,
}

impl AudioContentType {
    /// Map a file extension, with or without the leading dot
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "m4a" => Self::Mp4,
            "wav" => Self::Wav,
            "mp3" => Self::Mpeg,
            _ => Self::default(),
        }
    }

    /// Map the extension of a path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or_default()
    }

    /// MIME type string
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp4 => "audio/mp4",
            Self::Wav => "audio/wav",
            Self::Mpeg => "audio/mpeg",
        }
    }
}

// ============================================================================
// Data model
// ============================================================================

/// One uploaded clip plus the avatar to render it with
#[derive(Debug)]
pub struct ChatRequest {
    /// Uploaded audio on disk, removed when the request finishes
    pub audio: TempAudioFile,
    /// Avatar identifier
    pub avatar_id: String,
}

impl ChatRequest {
    /// Create a request, defaulting the avatar when absent or blank
    pub fn new(audio: TempAudioFile, avatar_id: Option<String>) -> Self {
        let avatar_id = avatar_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_AVATAR_ID.to_string());
        Self { audio, avatar_id }
    }
}

/// Speech-to-text output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Recognized text
    pub text: String,
    /// Provider confidence, when reported
    pub confidence: Option<f64>,
}

impl Transcript {
    /// Check if the transcript carries no words
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Language-model reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiReply {
    /// Reply text, verbatim from the model
    pub text: String,
}

/// Speech synthesis output
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    /// Encoded audio
    pub bytes: Bytes,
    /// MIME type of `bytes`
    pub content_type: String,
}

impl SynthesizedAudio {
    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if no audio was returned
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Avatar rendering output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarVideoResult {
    /// Generated asset URL, or the placeholder
    pub video_url: String,
}

/// Successful response of the chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// What the user said
    pub transcript: String,
    /// What the companion answers
    pub reply: String,
    /// Video of the avatar speaking the reply
    pub avatar_video_url: String,
}

// ============================================================================
// Adapter traits
// ============================================================================

/// Turns recorded audio into text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Adapter name for logs
    fn name(&self) -> &str;

    /// Transcribe raw audio bytes declared as `content_type`
    ///
    /// An empty transcript is returned as-is; the caller decides what it means.
    async fn transcribe(&self, audio: &[u8], content_type: &str) -> Result<Transcript>;
}

/// Produces the companion's reply to a transcript
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Adapter name for logs
    fn name(&self) -> &str;

    /// Generate a reply for what the user said
    async fn generate(&self, transcript: &str) -> Result<AiReply>;
}

/// Turns reply text into speech
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Adapter name for logs
    fn name(&self) -> &str;

    /// Synthesize `text` with `voice_id`, or the adapter's default voice when `None`
    async fn synthesize<'a>(&self, text: &str, voice_id: Option<&'a str>) -> Result<SynthesizedAudio>;
}

/// Turns a reply into a video of an avatar speaking it
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvatarRenderer: Send + Sync {
    /// Adapter name for logs
    fn name(&self) -> &str;

    /// Render `reply` spoken as `audio` with the given avatar
    async fn render(
        &self,
        reply: &AiReply,
        audio: &SynthesizedAudio,
        avatar_id: &str,
    ) -> Result<AvatarVideoResult>;
}
