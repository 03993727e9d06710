//! HTTP routes for the Vibespark backend
//!
//! - `POST /api/ai/chat`: audio upload through the AI pipeline
//! - `POST /api/anam/session`: live avatar session token
//! - `POST /api/livekit/token`: real-time room token
//! - `GET /ws`: WebRTC signaling relay

use crate::livekit::LiveKitTokenIssuer;
use crate::signaling::{handle_socket, SignalingHub};
use axum::{
    extract::{
        multipart::MultipartRejection, ws::WebSocketUpgrade, DefaultBodyLimit, Multipart,
        State as AxumState,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use vibe_core::http::build_client;
use vibe_core::{
    ChatPipeline, ChatRequest, ChatResponse, Result, Settings, TempAudioFile, VibeError,
};
use vibe_plugin_avatar::{AnamSessionClient, PlaceholderAvatarRenderer};
use vibe_provider_gemini::GeminiReplyGenerator;
use vibe_provider_voice::{DeepgramTranscriber, ElevenLabsSynthesizer};

/// Largest accepted request body (audio uploads)
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Text served at `/`
pub const BANNER: &str = "Vibespark backend is running 🚀";

/// Shared state for route handlers
pub struct AppState {
    /// Resolved settings
    pub settings: Settings,
    /// Chat pipeline, absent when its provider keys are missing
    pub pipeline: Option<Arc<ChatPipeline>>,
    /// Anam session client
    pub anam: AnamSessionClient,
    /// LiveKit token issuer
    pub livekit: LiveKitTokenIssuer,
    /// Signaling relay
    pub hub: Arc<SignalingHub>,
}

impl AppState {
    /// Wire every adapter from settings
    ///
    /// Missing provider keys do not fail startup; the affected endpoints
    /// report them per request.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let client = build_client(settings.provider_timeout)?;

        let pipeline = match settings.pipeline_credentials() {
            Ok(creds) => {
                let stt = DeepgramTranscriber::new(creds.deepgram_api_key)
                    .with_base_url(settings.deepgram_base_url.clone())
                    .with_client(client.clone());
                let llm = GeminiReplyGenerator::new(creds.gemini_api_key)
                    .with_model(settings.gemini_model.clone())
                    .with_base_url(settings.gemini_base_url.clone())
                    .with_client(client.clone());
                let tts = ElevenLabsSynthesizer::new(creds.elevenlabs_api_key)
                    .with_voice(settings.elevenlabs_voice_id.clone())
                    .with_model(settings.elevenlabs_model.clone())
                    .with_base_url(settings.elevenlabs_base_url.clone())
                    .with_client(client.clone());
                Some(Arc::new(ChatPipeline::new(
                    Arc::new(stt),
                    Arc::new(llm),
                    Arc::new(tts),
                    Arc::new(PlaceholderAvatarRenderer::new()),
                )))
            }
            Err(e) => {
                warn!("Chat pipeline disabled: {}", e);
                None
            }
        };

        let anam = AnamSessionClient::new(settings.anam_api_key.clone())
            .with_base_url(settings.anam_base_url.clone())
            .with_client(client);
        let livekit = LiveKitTokenIssuer::new(
            settings.livekit_api_key.clone(),
            settings.livekit_api_secret.clone(),
        );

        Ok(Self::new(settings, pipeline, anam, livekit))
    }

    /// Assemble state from prebuilt parts
    pub fn new(
        settings: Settings,
        pipeline: Option<Arc<ChatPipeline>>,
        anam: AnamSessionClient,
        livekit: LiveKitTokenIssuer,
    ) -> Self {
        Self {
            settings,
            pipeline,
            anam,
            livekit,
            hub: Arc::new(SignalingHub::new()),
        }
    }

    /// The pipeline, or the configuration error explaining its absence
    pub fn chat_pipeline(&self) -> Result<Arc<ChatPipeline>> {
        match &self.pipeline {
            Some(pipeline) => Ok(pipeline.clone()),
            None => Err(self
                .settings
                .pipeline_credentials()
                .err()
                .unwrap_or_else(|| VibeError::config("Chat pipeline is not configured"))),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// `{ error }` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Provider detail, when there is any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Request for an Anam session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnamSessionRequest {
    /// Text the avatar should say
    #[serde(default)]
    pub ai_response: Option<String>,
}

/// Anam session minted for the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnamSessionResponse {
    /// Token for the Anam client SDK
    pub session_token: String,
    /// Avatar the session renders
    pub avatar_id: String,
}

/// Request for a LiveKit token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveKitTokenRequest {
    /// Room to join
    #[serde(default)]
    pub room_name: Option<String>,
    /// Participant identity
    #[serde(default)]
    pub user_name: Option<String>,
}

/// LiveKit token for the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveKitTokenResponse {
    /// Signed JWT
    pub token: String,
}

/// Which collaborators have credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Speech-to-text
    pub deepgram: bool,
    /// Reply generation
    pub gemini: bool,
    /// Speech synthesis
    pub elevenlabs: bool,
    /// Live avatar sessions
    pub anam: bool,
    /// Real-time rooms
    pub livekit: bool,
    /// Database
    pub mongodb: bool,
}

/// Health check body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" while serving
    pub status: String,
    /// Crate version
    pub version: String,
    /// Credential presence per collaborator
    pub providers: ProviderStatus,
}

// ============================================================================
// Errors
// ============================================================================

/// A [`VibeError`] rendered as `{ error }` with its status code
#[derive(Debug)]
pub struct ApiError(pub VibeError);

impl From<VibeError> for ApiError {
    fn from(err: VibeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            error: self.0.public_message(),
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

fn error_with_details(status: StatusCode, error: &str, details: Option<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

// ============================================================================
// Router
// ============================================================================

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/ai/chat", post(chat))
        .route("/api/anam/session", post(anam_session))
        .route("/api/livekit/token", post(livekit_token))
        .route("/ws", get(ws_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn root() -> &'static str {
    BANNER
}

async fn health_check(AxumState(state): AxumState<Arc<AppState>>) -> Json<HealthResponse> {
    let s = &state.settings;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: vibe_core::VERSION.to_string(),
        providers: ProviderStatus {
            deepgram: s.deepgram_api_key.is_some(),
            gemini: s.gemini_api_key.is_some(),
            elevenlabs: s.elevenlabs_api_key.is_some(),
            anam: state.anam.is_configured(),
            livekit: state.livekit.is_configured(),
            mongodb: s.mongodb_uri.is_some(),
        },
    })
}

/// Audio and avatar pulled out of a chat upload
struct ChatUpload {
    file_name: Option<String>,
    audio: Vec<u8>,
    avatar_id: Option<String>,
}

async fn read_chat_upload(mut multipart: Multipart) -> Result<ChatUpload> {
    let mut upload = ChatUpload {
        file_name: None,
        audio: Vec::new(),
        avatar_id: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| VibeError::upload(format!("Invalid upload: {}", e)))?
    {
        match field.name() {
            Some("audio") => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.audio = field
                    .bytes()
                    .await
                    .map_err(|e| VibeError::upload(format!("Invalid upload: {}", e)))?
                    .to_vec();
            }
            Some("avatarId") => {
                upload.avatar_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| VibeError::upload(format!("Invalid upload: {}", e)))?,
                );
            }
            _ => {}
        }
    }

    Ok(upload)
}

async fn chat(
    AxumState(state): AxumState<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<ChatResponse>, ApiError> {
    // Credentials are checked before the upload is even read.
    let pipeline = state.chat_pipeline().map_err(|e| {
        error!("Chat request rejected: {}", e);
        e
    })?;

    let multipart = multipart.map_err(|_| VibeError::upload("No audio file uploaded"))?;
    let upload = read_chat_upload(multipart).await?;
    if upload.audio.is_empty() {
        return Err(VibeError::upload("No audio file uploaded").into());
    }

    let audio = TempAudioFile::create(
        &state.settings.upload_dir,
        upload.file_name.as_deref(),
        &upload.audio,
    )
    .await?;
    info!(
        "Chat upload received: {} bytes at {}",
        upload.audio.len(),
        audio.path().display()
    );

    let response = pipeline
        .run(ChatRequest::new(audio, upload.avatar_id))
        .await?;
    Ok(Json(response))
}

async fn anam_session(
    AxumState(state): AxumState<Arc<AppState>>,
    body: Option<Json<AnamSessionRequest>>,
) -> Response {
    let ai_response = body
        .and_then(|Json(req)| req.ai_response)
        .filter(|text| !text.is_empty());
    let Some(ai_response) = ai_response else {
        return ApiError(VibeError::validation("aiResponse is required")).into_response();
    };

    match state.anam.create_session(&ai_response).await {
        Ok(session) => Json(AnamSessionResponse {
            session_token: session.session_token,
            avatar_id: session.avatar_id,
        })
        .into_response(),
        Err(e) => {
            error!("Anam session failed: {}", e);
            error_with_details(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create Anam session",
                Some(e.to_string()),
            )
        }
    }
}

async fn livekit_token(
    AxumState(state): AxumState<Arc<AppState>>,
    body: Option<Json<LiveKitTokenRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(room_name), Some(user_name)) = (non_blank(req.room_name), non_blank(req.user_name))
    else {
        return ApiError(VibeError::validation("roomName and userName are required"))
            .into_response();
    };

    match state.livekit.issue(&room_name, &user_name) {
        Ok(token) => Json(LiveKitTokenResponse { token }).into_response(),
        Err(e) => {
            error!("LiveKit token failed: {}", e);
            error_with_details(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate LiveKit token",
                None,
            )
        }
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<Arc<AppState>>,
) -> impl IntoResponse {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}
