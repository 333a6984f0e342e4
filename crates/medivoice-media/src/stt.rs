//! Transcription adapter — Groq Whisper over multipart upload.
//!
//! The public surface never returns an error: every failure mode has a
//! fixed human-readable substitute, chosen by ordered precondition checks
//! (earliest matching check wins). The typed cause is logged before it is
//! replaced.

use std::path::Path;

use tracing::{info, warn};

use medivoice_core::config::TranscriptionConfig;
use medivoice_core::error::MediVoiceError;
use medivoice_core::messages;
use medivoice_core::types::AudioClip;

const TRANSCRIPTION_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";

pub struct TranscriptionAdapter {
    config: TranscriptionConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl TranscriptionAdapter {
    /// The credential is resolved once here; requests never consult the
    /// environment.
    pub fn new(config: TranscriptionConfig) -> Self {
        let api_key = config.resolve_api_key();
        Self {
            config,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Transcribe a recorded clip, degrading every failure to a fixed
    /// string. Checks run in order: missing clip, missing file, empty
    /// file, missing credential, then the remote call.
    pub async fn transcribe(&self, clip: Option<&AudioClip>) -> String {
        let Some(clip) = clip else {
            return messages::MSG_NO_AUDIO.to_string();
        };

        if !clip.path.exists() {
            warn!(path = %clip.path.display(), "Audio file missing");
            return messages::MSG_AUDIO_NOT_FOUND.to_string();
        }

        match tokio::fs::metadata(&clip.path).await {
            Ok(meta) if meta.len() == 0 => {
                warn!(path = %clip.path.display(), "Audio file is empty");
                return messages::MSG_EMPTY_AUDIO.to_string();
            }
            Ok(_) => {}
            Err(e) => {
                warn!(%e, "Failed to stat audio file");
                return messages::MSG_AUDIO_NOT_FOUND.to_string();
            }
        }

        let Some(api_key) = self.api_key.as_deref() else {
            warn!(
                kind = ?medivoice_core::error::FailureKind::MissingCredential,
                "Transcription credential absent"
            );
            return messages::MSG_STT_UNAVAILABLE.to_string();
        };

        match self.request_transcription(&clip.path, api_key).await {
            Ok(text) if !text.trim().is_empty() => {
                info!(chars = text.len(), "Audio transcribed");
                text
            }
            Ok(_) => {
                warn!("Transcription returned no text");
                messages::MSG_UNABLE_TO_TRANSCRIBE.to_string()
            }
            Err(e) => {
                warn!(kind = ?e.kind(), %e, "Transcription failed");
                messages::MSG_AUDIO_UNABLE.to_string()
            }
        }
    }

    /// The clip is forwarded as-is — no resampling or trimming — with the
    /// fixed model and target language.
    async fn request_transcription(
        &self,
        path: &Path,
        api_key: &str,
    ) -> Result<String, MediVoiceError> {
        let file_bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".into());

        let file_part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| MediVoiceError::RemoteService {
                service: "groq-whisper",
                detail: e.to_string(),
            })?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.model().to_string())
            .text("language", self.config.language().to_string())
            .text("response_format", "text");

        let resp = self
            .client
            .post(TRANSCRIPTION_URL)
            .header("Authorization", format!("Bearer {api_key}"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediVoiceError::RemoteService {
                service: "groq-whisper",
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(MediVoiceError::RemoteService {
                service: "groq-whisper",
                detail: format!("{status}: {body}"),
            });
        }

        let text = resp.text().await.map_err(|e| MediVoiceError::RemoteService {
            service: "groq-whisper",
            detail: e.to_string(),
        })?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn adapter_without_credentials() -> TranscriptionAdapter {
        TranscriptionAdapter::new(TranscriptionConfig {
            api_key: None,
            api_key_env: Some("TEST_MV_UNSET_STT_KEY".into()),
            model: None,
            language: None,
        })
    }

    #[tokio::test]
    async fn test_missing_clip_fallback() {
        let adapter = adapter_without_credentials();
        assert_eq!(adapter.transcribe(None).await, messages::MSG_NO_AUDIO);
    }

    #[tokio::test]
    async fn test_missing_file_fallback() {
        let adapter = adapter_without_credentials();
        let clip = AudioClip::new("/nonexistent/recording.wav");
        assert_eq!(
            adapter.transcribe(Some(&clip)).await,
            messages::MSG_AUDIO_NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_empty_file_fallback() {
        let adapter = adapter_without_credentials();
        let f = tempfile::NamedTempFile::new().unwrap();
        let clip = AudioClip::new(f.path());
        assert_eq!(
            adapter.transcribe(Some(&clip)).await,
            messages::MSG_EMPTY_AUDIO
        );
    }

    #[tokio::test]
    async fn test_missing_credential_fallback() {
        let adapter = adapter_without_credentials();
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"RIFF....WAVE").unwrap();
        let clip = AudioClip::new(f.path());
        assert_eq!(
            adapter.transcribe(Some(&clip)).await,
            messages::MSG_STT_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_check_order_empty_file_beats_credential() {
        // Empty-file check runs before the credential check even when both
        // preconditions fail.
        let adapter = adapter_without_credentials();
        let f = tempfile::NamedTempFile::new().unwrap();
        let clip = AudioClip::new(f.path());
        assert_eq!(
            adapter.transcribe(Some(&clip)).await,
            messages::MSG_EMPTY_AUDIO
        );
    }
}
