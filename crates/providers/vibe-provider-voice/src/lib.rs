//! Voice Provider for Vibespark
//!
//! Speech adapters used by the chat pipeline:
//!
//! - **Deepgram**: speech-to-text over the prerecorded `listen` API
//! - **ElevenLabs**: text-to-speech with a fixed default voice
//!
//! Both adapters take an explicit base URL so they can be pointed at a
//! local mock server.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engines;

pub use engines::deepgram::{extract_confidence, extract_transcript, DeepgramTranscriber};
pub use engines::elevenlabs::ElevenLabsSynthesizer;
