//! Media pipeline — image normalization, speech-to-text, speech synthesis.

pub mod image;
pub mod playback;
pub mod stt;
pub mod tts;
