//! Speech synthesis adapter — ElevenLabs primary, Google Translate TTS
//! fallback.
//!
//! Output always goes to a per-request unique file; the fixed-filename
//! behavior of an earlier deployment allowed concurrent submissions to
//! clobber each other's audio. Double failure yields `None`, which the UI
//! renders as "no audio available".

use std::path::{Path, PathBuf};

use anyhow::Result;
use futures::StreamExt;
use tracing::{debug, info, warn};

use medivoice_core::config::{DeploymentMode, SpeechConfig};

use crate::playback;

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
const GTTS_URL: &str = "https://translate.google.com/translate_tts";

pub struct SpeechSynthesizer {
    config: SpeechConfig,
    api_key: Option<String>,
    mode: DeploymentMode,
    output_dir: PathBuf,
    client: reqwest::Client,
}

impl SpeechSynthesizer {
    /// The credential is resolved once here; requests never consult the
    /// environment.
    pub fn new(config: SpeechConfig, mode: DeploymentMode, output_dir: PathBuf) -> Self {
        let api_key = config.resolve_api_key();
        Self {
            config,
            api_key,
            mode,
            output_dir,
            client: reqwest::Client::new(),
        }
    }

    /// Synthesize speech for the advisory text, returning the audio file
    /// path or `None` when both the hosted voice and the fallback fail.
    pub async fn synthesize(&self, text: &str) -> Option<PathBuf> {
        if text.trim().is_empty() {
            return None;
        }

        let path = match self.api_key.as_deref() {
            Some(api_key) => match self.elevenlabs(text, api_key).await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(%e, "ElevenLabs synthesis failed, falling back");
                    self.fallback(text).await
                }
            },
            None => {
                warn!("ElevenLabs credential absent, using fallback synthesis");
                self.fallback(text).await
            }
        };

        if let Some(ref path) = path {
            if self.mode == DeploymentMode::Local {
                playback::play(path).await;
            }
        }

        path
    }

    async fn fallback(&self, text: &str) -> Option<PathBuf> {
        match self.gtts(text).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(%e, "Fallback synthesis failed, no audio available");
                None
            }
        }
    }

    /// Hosted neural voice: stream the returned byte chunks straight into
    /// a newly created unique file.
    async fn elevenlabs(&self, text: &str, api_key: &str) -> Result<PathBuf> {
        let url = format!(
            "{ELEVENLABS_BASE_URL}/v1/text-to-speech/{}/stream?output_format={}",
            self.config.voice_id(),
            self.config.output_format(),
        );

        debug!(voice = self.config.voice_id(), text_len = text.len(), "Starting TTS request");

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "text": text,
                "model_id": self.config.model_id(),
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("ElevenLabs API error {status}: {body}");
        }

        let file_path = self.output_path();
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(&file_path).await?;
        let mut stream = resp.bytes_stream();
        let mut total = 0usize;
        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            tokio::io::AsyncWriteExt::write_all(&mut file, &bytes).await?;
            total += bytes.len();
        }
        tokio::io::AsyncWriteExt::flush(&mut file).await?;

        info!(path = %file_path.display(), size_kb = total / 1024, "TTS audio generated");
        Ok(file_path)
    }

    /// Offline-capable phrase-to-speech fallback (the Google Translate TTS
    /// endpoint, same service the gTTS library wraps).
    async fn gtts(&self, text: &str) -> Result<PathBuf> {
        let resp = self
            .client
            .get(GTTS_URL)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.config.language()),
                ("q", text),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("gTTS endpoint error {}", resp.status());
        }

        let bytes = resp.bytes().await?;
        let file_path = self.output_path();
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file_path, &bytes).await?;

        info!(path = %file_path.display(), size_kb = bytes.len() / 1024, "Fallback TTS audio generated");
        Ok(file_path)
    }

    /// Per-request unique output filename under the audio directory.
    fn output_path(&self) -> PathBuf {
        unique_audio_path(&self.output_dir, self.config.output_format())
    }
}

/// Generate a unique audio filename for one synthesis request.
pub fn unique_audio_path(dir: &Path, format: &str) -> PathBuf {
    let ts = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let id = uuid::Uuid::new_v4().simple().to_string();
    let ext = match format {
        f if f.starts_with("mp3") => "mp3",
        f if f.starts_with("pcm") => "pcm",
        f if f.starts_with("ulaw") => "ulaw",
        _ => "mp3",
    };
    dir.join(format!("tts_{ts}_{}.{ext}", &id[..8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_generation_unique() {
        let dir = Path::new("/tmp/audio");
        let f1 = unique_audio_path(dir, "mp3_22050_32");
        let f2 = unique_audio_path(dir, "mp3_22050_32");
        assert_ne!(f1, f2);
        assert_eq!(f1.extension().unwrap(), "mp3");
    }

    #[test]
    fn test_filename_extension_from_format() {
        let dir = Path::new("/tmp/audio");
        assert_eq!(
            unique_audio_path(dir, "pcm_16000").extension().unwrap(),
            "pcm"
        );
        assert_eq!(
            unique_audio_path(dir, "something_else").extension().unwrap(),
            "mp3"
        );
    }

    #[tokio::test]
    async fn test_empty_text_skips_synthesis() {
        let synth = SpeechSynthesizer::new(
            SpeechConfig::default(),
            DeploymentMode::Hosted,
            std::env::temp_dir(),
        );
        assert_eq!(synth.synthesize("").await, None);
        assert_eq!(synth.synthesize("   ").await, None);
    }

    #[test]
    fn test_concurrent_requests_get_distinct_paths() {
        // Per-request unique naming is the concurrency guarantee: no two
        // submissions ever share an output file.
        let dir = Path::new("/tmp/audio");
        let paths: Vec<_> = (0..64)
            .map(|_| unique_audio_path(dir, "mp3_22050_32"))
            .collect();
        let mut deduped = paths.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), paths.len());
    }
}
