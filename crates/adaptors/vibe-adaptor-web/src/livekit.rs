//! LiveKit room tokens

use livekit_api::access_token::{AccessToken, VideoGrants};
use vibe_core::{Result, VibeError};

/// Mints room-join tokens signed with the server's LiveKit key pair
#[derive(Clone)]
pub struct LiveKitTokenIssuer {
    api_key: Option<String>,
    api_secret: Option<String>,
}

impl LiveKitTokenIssuer {
    /// Create an issuer; missing credentials fail at issue time
    pub fn new(api_key: Option<String>, api_secret: Option<String>) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }

    /// Whether both key and secret are present
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.api_secret.is_some()
    }

    /// JWT letting `user_name` join, publish and subscribe in `room_name`
    pub fn issue(&self, room_name: &str, user_name: &str) -> Result<String> {
        let (Some(api_key), Some(api_secret)) = (&self.api_key, &self.api_secret) else {
            return Err(VibeError::config(
                "LIVEKIT_API_KEY and LIVEKIT_API_SECRET must both be set",
            ));
        };

        let token = AccessToken::with_api_key(api_key, api_secret)
            .with_identity(user_name)
            .with_name(user_name)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                can_publish: true,
                can_subscribe: true,
                ..Default::default()
            })
            .to_jwt()
            .map_err(|e| VibeError::session(format!("LiveKit token error: {}", e)))?;

        tracing::debug!("Issued LiveKit token: room={}, user={}", room_name, user_name);
        Ok(token)
    }
}

impl std::fmt::Debug for LiveKitTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveKitTokenIssuer")
            .field("configured", &self.is_configured())
            .finish()
    }
}
