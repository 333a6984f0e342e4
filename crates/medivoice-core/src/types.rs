//! Request-scoped values flowing through the pipeline.
//!
//! Every value here is constructed for a single submission and discarded
//! afterwards; nothing is mutated after creation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A recorded or uploaded audio byte stream, referenced by path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioClip {
    pub path: PathBuf,
}

impl AudioClip {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// An uploaded image byte stream with its declared format (file extension).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    pub path: PathBuf,
}

impl ImageAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// Encoded image bytes guaranteed acceptable to the vision transport:
/// either re-encoded JPEG with no alpha or palette channel, or the
/// original bytes passed through when the local decoder could not
/// identify a format the remote API may still accept.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl NormalizedImage {
    /// Base64 data URL for embedding in a chat message.
    pub fn to_data_url(&self) -> String {
        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.media_type, encoded)
    }
}

/// The first result triple returned to the UI on submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    /// What the patient said (or a fixed fallback string).
    pub transcript: String,
    /// The advisory text; never empty.
    pub advisory: String,
    /// The uploaded image, echoed back unless it was rejected or the
    /// whole analysis failed.
    pub image_display: Option<ImageAsset>,
}

impl Consultation {
    pub fn image_path(&self) -> Option<&Path> {
        self.image_display.as_ref().map(|i| i.path.as_path())
    }
}
