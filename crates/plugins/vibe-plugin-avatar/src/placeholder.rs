//! Placeholder avatar stage

use async_trait::async_trait;
use vibe_core::{AiReply, AvatarRenderer, AvatarVideoResult, Result, SynthesizedAudio};

/// Video returned until a lip-sync provider is integrated
pub const PLACEHOLDER_VIDEO_URL: &str = "https://www.w3schools.com/html/mov_bbb.mp4";

/// Avatar renderer that always answers with the same video
///
/// Extension point: a real provider implements [`AvatarRenderer`] and
/// replaces this in the pipeline.
#[derive(Debug, Clone)]
pub struct PlaceholderAvatarRenderer {
    video_url: String,
}

impl PlaceholderAvatarRenderer {
    /// Renderer returning [`PLACEHOLDER_VIDEO_URL`]
    pub fn new() -> Self {
        Self::with_url(PLACEHOLDER_VIDEO_URL)
    }

    /// Renderer returning `video_url`
    pub fn with_url(video_url: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
        }
    }
}

impl Default for PlaceholderAvatarRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AvatarRenderer for PlaceholderAvatarRenderer {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn render(
        &self,
        reply: &AiReply,
        audio: &SynthesizedAudio,
        avatar_id: &str,
    ) -> Result<AvatarVideoResult> {
        tracing::debug!(
            "Placeholder avatar: avatar={}, reply_len={}, audio_bytes={}",
            avatar_id,
            reply.text.len(),
            audio.len()
        );
        Ok(AvatarVideoResult {
            video_url: self.video_url.clone(),
        })
    }
}
