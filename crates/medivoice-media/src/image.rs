//! Image normalization for the vision transport.
//!
//! Uploads arrive in whatever codec the browser hands over. The remote
//! vision API is fed baseline JPEG, so anything decodable is flattened to
//! RGB and re-encoded. AVIF is rejected up front by extension — the local
//! decoder cannot read it, so attempting a decode is a wasted pass.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use tracing::{debug, warn};

use medivoice_core::error::{MediVoiceError, Result};
use medivoice_core::types::{ImageAsset, NormalizedImage};

/// Input codecs rejected before any decode attempt.
pub const DENY_LISTED_EXTENSIONS: &[&str] = &["avif"];

/// True when the asset's declared extension is a deny-listed codec.
pub fn is_deny_listed(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| DENY_LISTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Read and normalize an uploaded image asset.
pub async fn normalize(asset: &ImageAsset, jpeg_quality: u8) -> Result<NormalizedImage> {
    if is_deny_listed(&asset.path) {
        return Err(MediVoiceError::UnsupportedImage(format!(
            "deny-listed codec: {}",
            asset.extension().unwrap_or_default()
        )));
    }

    let bytes = tokio::fs::read(&asset.path).await?;
    normalize_bytes(&bytes, &asset.path, jpeg_quality)
}

/// Normalize an in-memory image byte buffer.
///
/// Decodable input is flattened to RGB8 and re-encoded as JPEG at the given
/// quality. Undecodable input falls back to a byte-for-byte pass-through —
/// some decoders reject files the remote API still accepts — with the media
/// type guessed from the declared extension. An empty buffer fails the
/// fallback too and is reported with both causes.
pub fn normalize_bytes(bytes: &[u8], declared: &Path, jpeg_quality: u8) -> Result<NormalizedImage> {
    match image::load_from_memory(bytes) {
        Ok(img) => {
            // JPEG carries no alpha or palette, so flatten unconditionally.
            let rgb = img.to_rgb8();
            let mut encoded = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut encoded, jpeg_quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| MediVoiceError::UnsupportedImage(e.to_string()))?;

            debug!(
                input_bytes = bytes.len(),
                output_bytes = encoded.len(),
                quality = jpeg_quality,
                "Image re-encoded to JPEG"
            );

            Ok(NormalizedImage {
                bytes: encoded,
                media_type: "image/jpeg".into(),
            })
        }
        Err(decode_err) => {
            if bytes.is_empty() {
                return Err(MediVoiceError::UnsupportedImage(format!(
                    "cannot decode image: {decode_err}; fallback also failed: empty byte stream"
                )));
            }

            let media_type = mime_guess::from_path(declared)
                .first_or_octet_stream()
                .to_string();

            warn!(%decode_err, media_type, "Image not locally decodable, passing bytes through");

            Ok(NormalizedImage {
                bytes: bytes.to_vec(),
                media_type,
            })
        }
    }
}
