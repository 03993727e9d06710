//! Chat pipeline orchestrator
//!
//! Runs one uploaded clip through speech-to-text, reply generation, speech
//! synthesis and avatar rendering, strictly in that order. Each stage needs
//! the previous stage's output, so nothing runs concurrently. The uploaded
//! file is removed exactly once whichever way the run ends.

use crate::types::*;
use crate::{Result, VibeError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Longest extension kept from the client's file name
const MAX_EXTENSION_LEN: usize = 8;

// ============================================================================
// Temporary upload file
// ============================================================================

/// An uploaded audio file that must not outlive its request
///
/// [`TempAudioFile::remove`] deletes the file the first time it is called and
/// does nothing afterwards. Dropping the guard without removing it deletes the
/// file synchronously.
#[derive(Debug)]
pub struct TempAudioFile {
    path: PathBuf,
    removed: AtomicBool,
}

impl TempAudioFile {
    /// Write `bytes` to a fresh file in `dir`
    ///
    /// The file is named `input-<unix millis>-<uuid><ext>`, keeping the
    /// extension of `original_name` so the content type can be derived later.
    pub async fn create(
        dir: impl AsRef<Path>,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Self> {
        let file = Self::reserve(dir.as_ref(), original_name).await?;
        file.fill(bytes).await?;
        Ok(file)
    }

    /// Pick a fresh path in `dir` and take ownership of it before anything is written
    async fn reserve(dir: &Path, original_name: Option<&str>) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let file_name = format!(
            "input-{}-{}{}",
            chrono::Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4().simple(),
            Self::extension_of(original_name)
        );
        Ok(Self {
            path: dir.join(file_name),
            removed: AtomicBool::new(false),
        })
    }

    /// Write the upload; a failed write removes whatever reached the disk
    async fn fill(&self, bytes: &[u8]) -> Result<()> {
        if let Err(e) = tokio::fs::write(&self.path, bytes).await {
            if let Err(cleanup) = self.remove().await {
                warn!(
                    "Failed to remove partial upload {}: {}",
                    self.path.display(),
                    cleanup
                );
            }
            return Err(e.into());
        }

        debug!("Stored upload: {} ({} bytes)", self.path.display(), bytes.len());
        Ok(())
    }

    /// Dotted, lowercased extension of a client file name, or empty
    fn extension_of(original_name: Option<&str>) -> String {
        original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| {
                !ext.is_empty()
                    && ext.len() <= MAX_EXTENSION_LEN
                    && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default()
    }

    /// Location on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content type implied by the file extension
    pub fn content_type(&self) -> AudioContentType {
        AudioContentType::from_path(&self.path)
    }

    /// Read the whole file
    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    /// Whether [`remove`](Self::remove) has already run
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    /// Delete the file
    ///
    /// Returns `true` if this call performed the removal. A file that is
    /// already gone counts as removed.
    pub async fn remove(&self) -> Result<bool> {
        if self.removed.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Removed upload: {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        if self.removed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove upload {}: {}", self.path.display(), e);
            }
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Sequences the four adapters for one chat request
pub struct ChatPipeline {
    stt: Arc<dyn SpeechToText>,
    llm: Arc<dyn ReplyGenerator>,
    tts: Arc<dyn SpeechSynthesizer>,
    avatar: Arc<dyn AvatarRenderer>,
}

impl ChatPipeline {
    /// Create a pipeline from its adapters
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        llm: Arc<dyn ReplyGenerator>,
        tts: Arc<dyn SpeechSynthesizer>,
        avatar: Arc<dyn AvatarRenderer>,
    ) -> Self {
        Self {
            stt,
            llm,
            tts,
            avatar,
        }
    }

    /// Run the request to completion and remove its upload
    ///
    /// Produces exactly one response or one error; never a partial result.
    pub async fn run(&self, request: ChatRequest) -> Result<ChatResponse> {
        let ChatRequest { audio, avatar_id } = request;

        let result = self.execute(&audio, &avatar_id).await;

        if let Err(e) = audio.remove().await {
            warn!("Failed to remove upload {}: {}", audio.path().display(), e);
        }

        if let Err(e) = &result {
            error!("Chat pipeline failed: {}", e);
        }
        result
    }

    async fn execute(&self, audio: &TempAudioFile, avatar_id: &str) -> Result<ChatResponse> {
        let bytes = audio.read().await?;
        let content_type = audio.content_type();

        info!(
            "Transcribing {} bytes ({}) with {}",
            bytes.len(),
            content_type.mime_type(),
            self.stt.name()
        );
        let transcript = self
            .stt
            .transcribe(&bytes, content_type.mime_type())
            .await?;
        if transcript.is_empty() {
            return Err(VibeError::NoSpeechDetected);
        }
        debug!(
            "Transcript: {:?} (confidence {:?})",
            transcript.text, transcript.confidence
        );

        info!("Generating reply with {}", self.llm.name());
        let reply = self.llm.generate(&transcript.text).await?;

        info!("Synthesizing speech with {}", self.tts.name());
        let speech = self.tts.synthesize(&reply.text, None).await?;
        // The audio is not part of the response; only its size is recorded.
        debug!("Synthesized {} bytes of {}", speech.len(), speech.content_type);

        info!("Rendering avatar '{}' with {}", avatar_id, self.avatar.name());
        let video = self.avatar.render(&reply, &speech, avatar_id).await?;
        if video.video_url.trim().is_empty() {
            return Err(VibeError::avatar(format!(
                "{} returned no video URL",
                self.avatar.name()
            )));
        }

        Ok(ChatResponse {
            transcript: transcript.text,
            reply: reply.text,
            avatar_video_url: video.video_url,
        })
    }
}
