//! Common test utilities and mock provider servers for E2E testing

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path as FsPath;
use std::sync::Arc;
use tokio::sync::RwLock;
use vibe_adaptor_web::AppState;
use vibe_core::Settings;

// ============================================================================
// Test Configuration
// ============================================================================

pub const TEST_DEEPGRAM_KEY: &str = "test-deepgram-key";
pub const TEST_GEMINI_KEY: &str = "test-gemini-key";
pub const TEST_ELEVENLABS_KEY: &str = "test-elevenlabs-key";
pub const TEST_ANAM_KEY: &str = "test-anam-key";
pub const TEST_LIVEKIT_KEY: &str = "test-livekit-key";
pub const TEST_LIVEKIT_SECRET: &str = "test-livekit-secret-with-enough-length";

pub const MOCK_REPLY: &str = "That's lovely to hear! What made you smile today?";
pub const MOCK_SESSION_TOKEN: &str = "anam-session-token-xyz";

/// Addresses of the mock providers
pub struct MockProviders {
    pub deepgram: SocketAddr,
    pub gemini: SocketAddr,
    pub elevenlabs: SocketAddr,
    pub anam: SocketAddr,
    pub log: Arc<MockLog>,
}

/// Everything the mock providers were asked
#[derive(Default)]
pub struct MockLog {
    pub deepgram_content_types: RwLock<Vec<String>>,
    pub gemini_prompts: RwLock<Vec<String>>,
    pub elevenlabs_texts: RwLock<Vec<String>>,
    pub anam_prompts: RwLock<Vec<String>>,
}

/// How the mock Deepgram should answer
#[derive(Clone)]
pub enum DeepgramBehavior {
    Transcript(String),
    Failure(StatusCode, String),
}

/// Start all mock providers
pub async fn start_mock_providers(deepgram: DeepgramBehavior) -> MockProviders {
    let log = Arc::new(MockLog::default());
    let deepgram_addr = start_mock_deepgram(deepgram, log.clone()).await;
    let gemini_addr = start_mock_gemini(log.clone()).await;
    let elevenlabs_addr = start_mock_elevenlabs(log.clone()).await;
    let anam_addr = start_mock_anam(log.clone()).await;

    // Give servers time to start
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    MockProviders {
        deepgram: deepgram_addr,
        gemini: gemini_addr,
        elevenlabs: elevenlabs_addr,
        anam: anam_addr,
        log,
    }
}

/// Settings with every key present and every provider pointed at the mocks
pub fn create_test_settings(upload_dir: &FsPath, mocks: &MockProviders) -> Settings {
    let pairs: HashMap<&str, String> = HashMap::from([
        ("DEEPGRAM_API_KEY", TEST_DEEPGRAM_KEY.to_string()),
        ("GEMINI_API_KEY", TEST_GEMINI_KEY.to_string()),
        ("ELEVENLABS_API_KEY", TEST_ELEVENLABS_KEY.to_string()),
        ("ANAM_API_KEY", TEST_ANAM_KEY.to_string()),
        ("LIVEKIT_API_KEY", TEST_LIVEKIT_KEY.to_string()),
        ("LIVEKIT_API_SECRET", TEST_LIVEKIT_SECRET.to_string()),
        ("UPLOAD_DIR", upload_dir.display().to_string()),
        ("PROVIDER_TIMEOUT_SECS", "5".to_string()),
        ("DEEPGRAM_BASE_URL", format!("http://{}", mocks.deepgram)),
        ("GEMINI_BASE_URL", format!("http://{}", mocks.gemini)),
        ("ELEVENLABS_BASE_URL", format!("http://{}", mocks.elevenlabs)),
        ("ANAM_BASE_URL", format!("http://{}", mocks.anam)),
    ]);
    Settings::from_lookup(move |key| pairs.get(key).cloned())
}

/// Settings with no provider keys at all
pub fn create_unconfigured_settings(upload_dir: &FsPath) -> Settings {
    let dir = upload_dir.display().to_string();
    Settings::from_lookup(move |key| (key == "UPLOAD_DIR").then(|| dir.clone()))
}

pub fn create_state(settings: Settings) -> Arc<AppState> {
    Arc::new(AppState::from_settings(settings).unwrap())
}

/// Number of entries in a directory
pub fn files_in(dir: &FsPath) -> usize {
    std::fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
}

// ============================================================================
// Multipart helpers
// ============================================================================

pub const BOUNDARY: &str = "vibespark-test-boundary";

/// One part of a multipart body
pub enum Part<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

/// Encode parts as `multipart/form-data` with [`BOUNDARY`]
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        name, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

// ============================================================================
// Mock Deepgram
// ============================================================================

async fn start_mock_deepgram(behavior: DeepgramBehavior, log: Arc<MockLog>) -> SocketAddr {
    let app = Router::new()
        .route("/listen", post(mock_listen))
        .with_state((behavior, log));
    serve(app).await
}

async fn mock_listen(
    State((behavior, log)): State<(DeepgramBehavior, Arc<MockLog>)>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    log.deepgram_content_types.write().await.push(content_type);

    match behavior {
        DeepgramBehavior::Transcript(text) => (
            StatusCode::OK,
            Json(json!({
                "metadata": {"request_id": "mock"},
                "results": {"channels": [{"alternatives": [{"transcript": text, "confidence": 0.99}]}]}
            })),
        ),
        DeepgramBehavior::Failure(status, message) => {
            (status, Json(json!({"err_code": "MOCK", "err_msg": message})))
        }
    }
}

// ============================================================================
// Mock Gemini
// ============================================================================

async fn start_mock_gemini(log: Arc<MockLog>) -> SocketAddr {
    let app = Router::new()
        .route("/models/:model", post(mock_generate))
        .with_state(log);
    serve(app).await
}

async fn mock_generate(
    State(log): State<Arc<MockLog>>,
    Path(_model): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if query.get("key").map(String::as_str) != Some(TEST_GEMINI_KEY) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"message": "API key not valid"}})),
        );
    }
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    log.gemini_prompts.write().await.push(prompt);
    (
        StatusCode::OK,
        Json(json!({"candidates": [{"content": {"parts": [{"text": MOCK_REPLY}], "role": "model"}}]})),
    )
}

// ============================================================================
// Mock ElevenLabs
// ============================================================================

async fn start_mock_elevenlabs(log: Arc<MockLog>) -> SocketAddr {
    let app = Router::new()
        .route("/text-to-speech/:voice_id", post(mock_tts))
        .with_state(log);
    serve(app).await
}

async fn mock_tts(
    State(log): State<Arc<MockLog>>,
    Path(_voice_id): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let text = body["text"].as_str().unwrap_or_default().to_string();
    log.elevenlabs_texts.write().await.push(text);
    ([(header::CONTENT_TYPE, "audio/mpeg")], b"ID3mock-audio".to_vec())
}

// ============================================================================
// Mock Anam
// ============================================================================

async fn start_mock_anam(log: Arc<MockLog>) -> SocketAddr {
    let app = Router::new()
        .route("/v1/auth/session-token", post(mock_session_token))
        .with_state(log);
    serve(app).await
}

async fn mock_session_token(
    State(log): State<Arc<MockLog>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let prompt = body["personaConfig"]["systemPrompt"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    log.anam_prompts.write().await.push(prompt);
    Json(json!({"sessionToken": MOCK_SESSION_TOKEN}))
}

// ============================================================================
// Server helpers
// ============================================================================

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Serve the real application on an ephemeral port
pub async fn start_app(state: Arc<AppState>) -> SocketAddr {
    let addr = serve(vibe_adaptor_web::build_router(state)).await;
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    addr
}
