//! Shared HTTP client construction for provider adapters

use crate::Result;
use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration;

/// Deadline used when no explicit timeout is configured
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared HTTP client for connection pooling
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Build a client with the given request deadline
pub fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Process-wide client with the default deadline
pub fn shared_client() -> Client {
    HTTP_CLIENT
        .get_or_init(|| build_client(DEFAULT_PROVIDER_TIMEOUT).unwrap_or_default())
        .clone()
}

/// Error text from a provider body: `err_msg`, then `message`, then
/// `error.message`, falling back to the raw body
pub fn provider_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["/err_msg", "/message", "/error/message", "/error"]
                .iter()
                .find_map(|ptr| json.pointer(ptr).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}
