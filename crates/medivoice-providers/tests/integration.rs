//! Provider integration tests — real API calls.
//!
//! These tests are skipped when GROQ_API_KEY is not set.
//! Run with: `cargo test -p medivoice-providers --test integration`

use medivoice_core::config::VisionConfig;
use medivoice_providers::{ChatProvider, GroqProvider};

fn groq_key() -> Option<String> {
    std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty())
}

#[tokio::test]
async fn test_groq_text_completion() {
    let Some(key) = groq_key() else {
        eprintln!("GROQ_API_KEY not set, skipping");
        return;
    };

    let provider = GroqProvider::new(&VisionConfig {
        api_key: Some(key),
        ..Default::default()
    });

    let text = provider
        .complete_text("Reply with exactly the word 'hello'.")
        .await
        .expect("text completion failed");

    assert!(!text.trim().is_empty(), "Expected non-empty completion");
}

#[tokio::test]
async fn test_groq_vision_completion() {
    let Some(key) = groq_key() else {
        eprintln!("GROQ_API_KEY not set, skipping");
        return;
    };

    let provider = GroqProvider::new(&VisionConfig {
        api_key: Some(key),
        ..Default::default()
    });

    // 1x1 red JPEG, tiny but decodable by the remote service.
    let mut jpeg = Vec::new();
    {
        use image::codecs::jpeg::JpegEncoder;
        let img = image::RgbImage::from_pixel(1, 1, image::Rgb([255, 0, 0]));
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, 85);
        img.write_with_encoder(encoder).unwrap();
    }

    let normalized = medivoice_core::types::NormalizedImage {
        bytes: jpeg,
        media_type: "image/jpeg".into(),
    };

    let text = provider
        .complete_with_image("Describe this image in one short sentence.", &normalized)
        .await
        .expect("vision completion failed");

    assert!(!text.trim().is_empty(), "Expected non-empty completion");
}
