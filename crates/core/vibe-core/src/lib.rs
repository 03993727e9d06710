//! Vibespark Core
//!
//! Shared building blocks for the voice-call backend:
//!
//! - Error taxonomy and HTTP status mapping
//! - Environment-driven configuration
//! - Logging initialization
//! - Adapter traits for speech-to-text, reply generation, speech synthesis
//!   and avatar rendering
//! - The chat pipeline orchestrator and its temporary upload file guard

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod pipeline;
pub mod types;

pub use config::{load_env, PipelineCredentials, Settings};
pub use error::{Result, VibeError};
pub use logging::init_logging;
pub use pipeline::{ChatPipeline, TempAudioFile};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
