//! Vision-language provider abstraction.
//!
//! The pipeline talks to the remote multimodal service through the
//! [`ChatProvider`] trait so tests can substitute a fake that never
//! touches the network.

use async_trait::async_trait;

use medivoice_core::error::Result;
use medivoice_core::types::NormalizedImage;

pub mod groq;

pub use groq::GroqProvider;

/// One-shot chat completion against a hosted model.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider identifier (e.g. "groq").
    fn id(&self) -> &str;

    /// Multimodal completion: instruction text plus an embedded image.
    async fn complete_with_image(&self, query: &str, image: &NormalizedImage) -> Result<String>;

    /// Text-only completion against the smaller non-vision model.
    async fn complete_text(&self, query: &str) -> Result<String>;
}
