use thiserror::Error;

/// Coarse classification of a failure, used to pick the user-facing
/// message and for structured logging. The end user only ever sees the
/// fixed strings in [`crate::messages`]; the kind is what gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnsupportedImageFormat,
    MissingCredential,
    RemoteServiceFailure,
    EmptyInput,
}

#[derive(Debug, Error)]
pub enum MediVoiceError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedImage(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Remote service failure ({service}): {detail}")]
    RemoteService {
        service: &'static str,
        detail: String,
    },

    #[error("No audio or image input supplied")]
    EmptyInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MediVoiceError {
    /// Map an error onto the taxonomy. Errors with no precise bucket
    /// (IO, JSON, wrapped) count as remote failures — they only reach
    /// the caller from inside an adapter's service call.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedImage(_) => FailureKind::UnsupportedImageFormat,
            Self::MissingCredential(_) => FailureKind::MissingCredential,
            Self::EmptyInput => FailureKind::EmptyInput,
            Self::Config(_)
            | Self::RemoteService { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => FailureKind::RemoteServiceFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, MediVoiceError>;
