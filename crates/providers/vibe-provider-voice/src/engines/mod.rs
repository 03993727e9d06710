//! Speech engine implementations

pub mod deepgram;
pub mod elevenlabs;
