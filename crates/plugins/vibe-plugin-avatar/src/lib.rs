//! Avatar plugin for Vibespark
//!
//! - [`PlaceholderAvatarRenderer`]: the pipeline's avatar stage. No lip-sync
//!   provider is wired in yet, so it answers with a fixed video URL.
//! - [`AnamSessionClient`]: mints Anam session tokens for live avatar calls.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod anam;
pub mod placeholder;

pub use anam::{AnamPersona, AnamSession, AnamSessionClient};
pub use placeholder::{PlaceholderAvatarRenderer, PLACEHOLDER_VIDEO_URL};
