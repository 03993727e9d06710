//! Web adaptor for Vibespark
//!
//! The axum application: REST endpoints for the AI chat pipeline and session
//! tokens, plus the WebSocket signaling relay used to set up calls.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod livekit;
pub mod routes;
pub mod signaling;

pub use livekit::LiveKitTokenIssuer;
pub use routes::{build_router, AppState};
pub use signaling::{ClientEvent, ServerEvent, SignalingHub};
