//! Anam avatar session client
//!
//! Exchanges the server's API key for a short-lived session token that the
//! mobile client uses to stream a talking avatar directly from Anam.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use vibe_core::config::DEFAULT_ANAM_BASE_URL;
use vibe_core::http::{provider_message, shared_client};
use vibe_core::{Result, VibeError};

/// Persona the live avatar speaks as
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnamPersona {
    /// Display name
    pub name: String,
    /// Anam avatar asset
    pub avatar_id: String,
    /// Anam voice
    pub voice_id: String,
    /// Anam language model
    pub llm_id: String,
}

impl Default for AnamPersona {
    fn default() -> Self {
        Self {
            name: "VIBE-buddy".to_string(),
            avatar_id: "d9ebe82e-2f34-4ff6-9632-16cb73e7de08".to_string(),
            voice_id: "6bfbe25a-979d-40f3-a92b-5394170af54b".to_string(),
            llm_id: "0934d97d-0c3a-4f33-91b0-5e136a0ef466".to_string(),
        }
    }
}

impl AnamPersona {
    /// System prompt that makes the avatar repeat `ai_response` verbatim
    pub fn system_prompt(&self, ai_response: &str) -> String {
        format!(
            "You are VIBE-BUDDY, an empathetic AI friend. Say exactly: \"{}\"",
            ai_response
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PersonaConfig<'a> {
    #[serde(flatten)]
    persona: &'a AnamPersona,
    system_prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionTokenRequest<'a> {
    persona_config: PersonaConfig<'a>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionTokenResponse {
    session_token: String,
}

/// A minted avatar session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnamSession {
    /// Token handed to the client SDK
    pub session_token: String,
    /// Avatar the session renders
    pub avatar_id: String,
}

/// Client for `POST /v1/auth/session-token`
pub struct AnamSessionClient {
    api_key: Option<String>,
    persona: AnamPersona,
    base_url: String,
    client: Client,
}

impl AnamSessionClient {
    /// Create a client; a missing key fails at call time
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            persona: AnamPersona::default(),
            base_url: DEFAULT_ANAM_BASE_URL.to_string(),
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

    /// Whether an API key is available
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Mint a session whose avatar will say `ai_response`
    pub async fn create_session(&self, ai_response: &str) -> Result<AnamSession> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| VibeError::session("ANAM_API_KEY is not set"))?;

        let request = SessionTokenRequest {
            persona_config: PersonaConfig {
                persona: &self.persona,
                system_prompt: self.persona.system_prompt(ai_response),
            },
        };

        tracing::debug!(
            "Anam session request: persona={}, avatar={}, text_len={}",
            self.persona.name,
            self.persona.avatar_id,
            ai_response.len()
        );

        let response = self
            .client
            .post(format!("{}/v1/auth/session-token", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| VibeError::session(format!("Anam request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Anam session error ({}): {}", status, error_text);
            return Err(VibeError::session(format!(
                "Anam API error ({}): {}",
                status,
                provider_message(&error_text)
            )));
        }

        let body: SessionTokenResponse = response
            .json()
            .await
            .map_err(|e| VibeError::session(format!("Anam response invalid: {}", e)))?;

        Ok(AnamSession {
            session_token: body.session_token,
            avatar_id: self.persona.avatar_id.clone(),
        })
    }
}
