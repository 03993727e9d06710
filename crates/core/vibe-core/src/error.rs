//! Error types for Vibespark

use thiserror::Error;

/// Main error type for Vibespark operations
#[derive(Debug, Error)]
pub enum VibeError {
    /// Missing credentials or unparsable settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// No audio file in the request, or an unreadable upload
    #[error("{0}")]
    Upload(String),

    /// Request body missing required fields
    #[error("{0}")]
    Validation(String),

    /// Speech-to-text provider or transport failure, shown to callers as-is
    #[error("{0}")]
    Transcription(String),

    /// Speech-to-text succeeded but produced no words
    #[error("No speech detected in audio. Please speak clearly and try again.")]
    NoSpeechDetected,

    /// Reply generation failure
    #[error("Generation error: {0}")]
    Generation(String),

    /// Speech synthesis failure
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Avatar rendering failure
    #[error("Avatar error: {0}")]
    Avatar(String),

    /// Real-time session (Anam, LiveKit) failure
    #[error("Session error: {0}")]
    Session(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Convenient Result type using VibeError
pub type Result<T> = std::result::Result<T, VibeError>;

/// Message returned to clients when provider keys are missing
pub const CONFIG_PUBLIC_MESSAGE: &str =
    "Server configuration error. Please add API keys to the environment.";

impl VibeError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        VibeError::Config(msg.into())
    }

    /// Create an upload error
    pub fn upload(msg: impl Into<String>) -> Self {
        VibeError::Upload(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        VibeError::Validation(msg.into())
    }

    /// Create a transcription error
    pub fn transcription(msg: impl Into<String>) -> Self {
        VibeError::Transcription(msg.into())
    }

    /// Create a generation error
    pub fn generation(msg: impl Into<String>) -> Self {
        VibeError::Generation(msg.into())
    }

    /// Create a synthesis error
    pub fn synthesis(msg: impl Into<String>) -> Self {
        VibeError::Synthesis(msg.into())
    }

    /// Create an avatar error
    pub fn avatar(msg: impl Into<String>) -> Self {
        VibeError::Avatar(msg.into())
    }

    /// Create a session error
    pub fn session(msg: impl Into<String>) -> Self {
        VibeError::Session(msg.into())
    }

    /// HTTP status code for this error
    ///
    /// Client mistakes map to 400; everything else is a server-side failure.
    pub fn status_code(&self) -> u16 {
        match self {
            VibeError::Upload(_) | VibeError::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Message safe to show to API callers.
    ///
    /// Configuration errors hide which keys are missing.
    pub fn public_message(&self) -> String {
        match self {
            VibeError::Config(_) => CONFIG_PUBLIC_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}
