//! Configuration management and environment variable loading

use crate::{Result, VibeError};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default Deepgram API base URL
pub const DEFAULT_DEEPGRAM_BASE_URL: &str = "https://api.deepgram.com/v1";
/// Default Gemini API base URL
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default ElevenLabs API base URL
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";
/// Default Anam API base URL
pub const DEFAULT_ANAM_BASE_URL: &str = "https://api.anam.ai";
/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-001";
/// Default ElevenLabs model
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_monolingual_v1";
/// Default ElevenLabs voice (Rachel)
pub const DEFAULT_ELEVENLABS_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Load environment variables from a .env file
///
/// A missing file is not an error; only a malformed one is.
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("✓ Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(VibeError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::warn!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(VibeError::config(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Process-wide settings resolved from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bind host
    pub host: String,
    /// Listening port
    pub port: u16,
    /// Directory for temporary audio uploads
    pub upload_dir: PathBuf,
    /// Deadline applied to every outbound provider call
    pub provider_timeout: Duration,

    /// Speech-to-text key
    pub deepgram_api_key: Option<String>,
    /// Language-model key
    pub gemini_api_key: Option<String>,
    /// Speech-synthesis key
    pub elevenlabs_api_key: Option<String>,
    /// Avatar-service key
    pub anam_api_key: Option<String>,
    /// Real-time media key
    pub livekit_api_key: Option<String>,
    /// Real-time media secret
    pub livekit_api_secret: Option<String>,
    /// Database connection string (reported only)
    pub mongodb_uri: Option<String>,

    /// Deepgram base URL
    pub deepgram_base_url: String,
    /// Gemini base URL
    pub gemini_base_url: String,
    /// ElevenLabs base URL
    pub elevenlabs_base_url: String,
    /// Anam base URL
    pub anam_base_url: String,
    /// Gemini model name
    pub gemini_model: String,
    /// ElevenLabs model id
    pub elevenlabs_model: String,
    /// ElevenLabs voice id
    pub elevenlabs_voice_id: String,
}

/// The three keys the chat pipeline cannot run without
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCredentials {
    /// Speech-to-text key
    pub deepgram_api_key: String,
    /// Language-model key
    pub gemini_api_key: String,
    /// Speech-synthesis key
    pub elevenlabs_api_key: String,
}

impl Settings {
    /// Build settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = get("PORT").and_then(|v| v.parse().ok()).unwrap_or(3000);
        let timeout_secs = get("PROVIDER_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(60);

        Self {
            host: get_or("HOST", "0.0.0.0"),
            port,
            upload_dir: PathBuf::from(get_or("UPLOAD_DIR", "uploads")),
            provider_timeout: Duration::from_secs(timeout_secs),
            deepgram_api_key: get("DEEPGRAM_API_KEY"),
            gemini_api_key: get("GEMINI_API_KEY"),
            elevenlabs_api_key: get("ELEVENLABS_API_KEY"),
            anam_api_key: get("ANAM_API_KEY"),
            livekit_api_key: get("LIVEKIT_API_KEY"),
            livekit_api_secret: get("LIVEKIT_API_SECRET"),
            mongodb_uri: get("MONGODB_URI"),
            deepgram_base_url: get_or("DEEPGRAM_BASE_URL", DEFAULT_DEEPGRAM_BASE_URL),
            gemini_base_url: get_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            elevenlabs_base_url: get_or("ELEVENLABS_BASE_URL", DEFAULT_ELEVENLABS_BASE_URL),
            anam_base_url: get_or("ANAM_BASE_URL", DEFAULT_ANAM_BASE_URL),
            gemini_model: get_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            elevenlabs_model: get_or("ELEVENLABS_MODEL", DEFAULT_ELEVENLABS_MODEL),
            elevenlabs_voice_id: get_or("ELEVENLABS_VOICE_ID", DEFAULT_ELEVENLABS_VOICE_ID),
        }
    }

    /// Keys required by the chat pipeline
    ///
    /// Fails with a configuration error naming every missing key.
    pub fn pipeline_credentials(&self) -> Result<PipelineCredentials> {
        let mut missing = Vec::new();
        if self.deepgram_api_key.is_none() {
            missing.push("DEEPGRAM_API_KEY");
        }
        if self.gemini_api_key.is_none() {
            missing.push("GEMINI_API_KEY");
        }
        if self.elevenlabs_api_key.is_none() {
            missing.push("ELEVENLABS_API_KEY");
        }

        match (
            &self.deepgram_api_key,
            &self.gemini_api_key,
            &self.elevenlabs_api_key,
        ) {
            (Some(deepgram), Some(gemini), Some(elevenlabs)) => Ok(PipelineCredentials {
                deepgram_api_key: deepgram.clone(),
                gemini_api_key: gemini.clone(),
                elevenlabs_api_key: elevenlabs.clone(),
            }),
            _ => Err(VibeError::config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            ))),
        }
    }

    /// Whether LiveKit key and secret are both present
    pub fn livekit_configured(&self) -> bool {
        self.livekit_api_key.is_some() && self.livekit_api_secret.is_some()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
