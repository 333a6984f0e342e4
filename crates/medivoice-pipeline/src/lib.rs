//! Request orchestration.
//!
//! One submission runs Transcribing → Analyzing → Done; speech synthesis is
//! a separate follow-up stage triggered once the caller has rendered the
//! advisory text. Nothing is retried, no failure crosses the orchestrator
//! boundary: every remote error is caught at its adapter and mapped to a
//! fixed user-safe string or an absent value.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use medivoice_core::config::Config;
use medivoice_core::messages;
use medivoice_core::prompt;
use medivoice_core::types::{AudioClip, Consultation, ImageAsset};
use medivoice_media::image as image_normalizer;
use medivoice_media::stt::TranscriptionAdapter;
use medivoice_media::tts::SpeechSynthesizer;
use medivoice_providers::{ChatProvider, GroqProvider};

pub struct Orchestrator {
    provider: Arc<dyn ChatProvider>,
    transcriber: TranscriptionAdapter,
    synthesizer: SpeechSynthesizer,
    jpeg_quality: u8,
    min_speech_length: usize,
}

impl Orchestrator {
    /// Wire the real adapters from config. Credentials are resolved here,
    /// once, and injected — the adapters never consult the environment on
    /// their own during a request.
    pub fn from_config(config: &Config, audio_dir: PathBuf) -> Self {
        let vision = config.vision();
        let speech = config.speech();
        Self {
            provider: Arc::new(GroqProvider::new(&vision)),
            transcriber: TranscriptionAdapter::new(config.transcription()),
            synthesizer: SpeechSynthesizer::new(speech.clone(), config.deployment, audio_dir),
            jpeg_quality: vision.jpeg_quality(),
            min_speech_length: speech.min_speech_length(),
        }
    }

    /// Test seam: substitute any provider implementation.
    pub fn with_provider(
        provider: Arc<dyn ChatProvider>,
        transcriber: TranscriptionAdapter,
        synthesizer: SpeechSynthesizer,
        jpeg_quality: u8,
        min_speech_length: usize,
    ) -> Self {
        Self {
            provider,
            transcriber,
            synthesizer,
            jpeg_quality,
            min_speech_length,
        }
    }

    /// First entry point: sequence transcription and analysis, returning
    /// the (transcript, advisory, image-to-display) triple.
    pub async fn process_inputs(
        &self,
        audio: Option<AudioClip>,
        image: Option<ImageAsset>,
    ) -> Consultation {
        // Transcribing: an absent clip degrades to image-only analysis.
        let transcript = match &audio {
            Some(clip) => self.transcriber.transcribe(Some(clip)).await,
            None => String::new(),
        };

        // Analyzing: branch on whether an image was supplied. Transcription
        // fallback strings are valid analysis input like any other text.
        let (advisory, image_display) = match image {
            Some(asset) => self.analyze_with_image(&transcript, asset).await,
            None => (self.analyze_text_only(&transcript).await, None),
        };

        info!(
            transcript_chars = transcript.len(),
            advisory_chars = advisory.len(),
            has_image = image_display.is_some(),
            "Consultation complete"
        );

        Consultation {
            transcript,
            advisory,
            image_display,
        }
    }

    /// Second entry point, triggered after the advisory text is rendered:
    /// synthesize speech, or return `None` for text too short to bother
    /// sending to the paid synthesis API.
    pub async fn generate_voice(&self, advisory: &str) -> Option<PathBuf> {
        if advisory.trim().len() <= self.min_speech_length {
            info!("Advisory below minimum speech length, skipping synthesis");
            return None;
        }
        self.synthesizer.synthesize(advisory).await
    }

    async fn analyze_with_image(
        &self,
        transcript: &str,
        asset: ImageAsset,
    ) -> (String, Option<ImageAsset>) {
        // Known-bad codec: short-circuit before normalization or any
        // network call.
        if image_normalizer::is_deny_listed(&asset.path) {
            warn!(path = %asset.path.display(), "Deny-listed image codec rejected");
            return (messages::MSG_AVIF_UNSUPPORTED.to_string(), None);
        }

        let query = prompt::build_query(transcript);

        let normalized = match image_normalizer::normalize(&asset, self.jpeg_quality).await {
            Ok(n) => n,
            Err(e) => {
                warn!(kind = ?e.kind(), %e, "Image normalization failed");
                return (messages::advisory_apology(e.kind()).to_string(), None);
            }
        };

        match self.provider.complete_with_image(&query, &normalized).await {
            Ok(text) if !text.trim().is_empty() => (text, Some(asset)),
            Ok(_) => {
                warn!("Vision completion was empty");
                (messages::MSG_TECHNICAL_DIFFICULTIES.to_string(), None)
            }
            Err(e) => {
                warn!(kind = ?e.kind(), %e, "Vision analysis failed, retrying text-only");
                // The text-only model may still produce advice from the
                // transcript alone. The upload itself was readable, so it
                // is still echoed back alongside that advice.
                match self.provider.complete_text(&query).await {
                    Ok(text) if !text.trim().is_empty() => (text, Some(asset)),
                    Ok(_) => (messages::MSG_TECHNICAL_DIFFICULTIES.to_string(), None),
                    Err(e2) => {
                        warn!(kind = ?e2.kind(), %e2, "Text-only fallback failed");
                        (messages::advisory_apology(e2.kind()).to_string(), None)
                    }
                }
            }
        }
    }

    async fn analyze_text_only(&self, transcript: &str) -> String {
        // No image and nothing transcribed: fixed prompt-for-input message,
        // no outbound call.
        if transcript.trim().is_empty() {
            return messages::MSG_NO_INPUT.to_string();
        }

        let query = prompt::build_query(transcript);
        match self.provider.complete_text(&query).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Text completion was empty");
                messages::MSG_TECHNICAL_DIFFICULTIES.to_string()
            }
            Err(e) => {
                warn!(kind = ?e.kind(), %e, "Text-only analysis failed");
                messages::advisory_apology(e.kind()).to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use medivoice_core::config::{DeploymentMode, SpeechConfig, TranscriptionConfig, VisionConfig};
    use medivoice_core::error::{MediVoiceError, Result};
    use medivoice_core::types::NormalizedImage;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Vision,
        Text,
    }

    /// Provider double: records which path was invoked, answers with a
    /// canned advisory or a typed error.
    struct FakeProvider {
        calls: Mutex<Vec<Call>>,
        vision_result: Option<&'static str>,
        text_result: Option<&'static str>,
        error: Option<fn() -> MediVoiceError>,
    }

    impl FakeProvider {
        fn answering(vision: &'static str, text: &'static str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                vision_result: Some(vision),
                text_result: Some(text),
                error: None,
            }
        }

        fn failing(error: fn() -> MediVoiceError) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                vision_result: None,
                text_result: None,
                error: Some(error),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatProvider for FakeProvider {
        fn id(&self) -> &str {
            "fake"
        }

        async fn complete_with_image(
            &self,
            _query: &str,
            _image: &NormalizedImage,
        ) -> Result<String> {
            self.calls.lock().unwrap().push(Call::Vision);
            match (self.vision_result, self.error) {
                (Some(text), _) => Ok(text.to_string()),
                (None, Some(make_err)) => Err(make_err()),
                _ => Ok(String::new()),
            }
        }

        async fn complete_text(&self, _query: &str) -> Result<String> {
            self.calls.lock().unwrap().push(Call::Text);
            match (self.text_result, self.error) {
                (Some(text), _) => Ok(text.to_string()),
                (None, Some(make_err)) => Err(make_err()),
                _ => Ok(String::new()),
            }
        }
    }

    fn orchestrator(provider: Arc<FakeProvider>) -> Orchestrator {
        let transcriber = TranscriptionAdapter::new(TranscriptionConfig {
            api_key: None,
            api_key_env: Some("TEST_MV_UNSET_STT_KEY".into()),
            model: None,
            language: None,
        });
        let synthesizer = SpeechSynthesizer::new(
            SpeechConfig {
                api_key: None,
                api_key_env: Some("TEST_MV_UNSET_TTS_KEY".into()),
                ..Default::default()
            },
            DeploymentMode::Hosted,
            std::env::temp_dir(),
        );
        Orchestrator::with_provider(
            provider,
            transcriber,
            synthesizer,
            VisionConfig::default().jpeg_quality(),
            SpeechConfig::default().min_speech_length(),
        )
    }

    fn jpeg_fixture(dir: &std::path::Path) -> ImageAsset {
        use image::{Rgb, RgbImage};
        let mut img = RgbImage::new(16, 16);
        for p in img.pixels_mut() {
            *p = Rgb([180, 90, 80]);
        }
        let path = dir.join("rash.jpg");
        img.save(&path).unwrap();
        ImageAsset::new(path)
    }

    #[tokio::test]
    async fn test_no_input_short_circuits_without_remote_call() {
        let provider = Arc::new(FakeProvider::answering("unused", "unused"));
        let orch = orchestrator(provider.clone());

        let result = orch.process_inputs(None, None).await;
        assert_eq!(result.transcript, "");
        assert_eq!(result.advisory, messages::MSG_NO_INPUT);
        assert!(result.image_display.is_none());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_avif_short_circuits_without_remote_call() {
        let provider = Arc::new(FakeProvider::answering("unused", "unused"));
        let orch = orchestrator(provider.clone());

        let dir = tempfile::tempdir().unwrap();
        let avif = dir.path().join("rash.avif");
        std::fs::write(&avif, b"not really avif").unwrap();

        let result = orch
            .process_inputs(None, Some(ImageAsset::new(&avif)))
            .await;
        assert_eq!(result.advisory, messages::MSG_AVIF_UNSUPPORTED);
        assert!(result.image_display.is_none());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_image_present_uses_vision_path() {
        let provider = Arc::new(FakeProvider::answering(
            "With what I see, I think you have mild dermatitis.",
            "unused",
        ));
        let orch = orchestrator(provider.clone());

        let dir = tempfile::tempdir().unwrap();
        let asset = jpeg_fixture(dir.path());

        let result = orch.process_inputs(None, Some(asset.clone())).await;
        assert_eq!(result.transcript, "");
        assert_eq!(
            result.advisory,
            "With what I see, I think you have mild dermatitis."
        );
        assert_eq!(result.image_path(), Some(asset.path.as_path()));
        assert_eq!(provider.calls(), vec![Call::Vision]);
    }

    #[tokio::test]
    async fn test_transcript_without_image_uses_text_only_path() {
        let provider = Arc::new(FakeProvider::answering("unused", "Sounds like a cold."));
        let orch = orchestrator(provider.clone());

        // A present-but-missing audio file yields the not-found fallback
        // string, which still counts as transcript text downstream.
        let clip = AudioClip::new("/nonexistent/recording.wav");
        let result = orch.process_inputs(Some(clip), None).await;

        assert_eq!(result.transcript, messages::MSG_AUDIO_NOT_FOUND);
        assert_eq!(result.advisory, "Sounds like a cold.");
        assert_eq!(provider.calls(), vec![Call::Text]);
    }

    #[tokio::test]
    async fn test_vision_failure_falls_back_to_text_only() {
        let provider = Arc::new(FakeProvider {
            calls: Mutex::new(Vec::new()),
            vision_result: None,
            text_result: Some("Advice from text model."),
            error: Some(|| MediVoiceError::RemoteService {
                service: "groq",
                detail: "503".into(),
            }),
        });
        let orch = orchestrator(provider.clone());

        let dir = tempfile::tempdir().unwrap();
        let asset = jpeg_fixture(dir.path());

        let result = orch.process_inputs(None, Some(asset.clone())).await;
        assert_eq!(result.advisory, "Advice from text model.");
        // The upload was readable, so it is echoed back with the fallback
        // advice.
        assert_eq!(result.image_path(), Some(asset.path.as_path()));
        assert_eq!(provider.calls(), vec![Call::Vision, Call::Text]);
    }

    #[tokio::test]
    async fn test_double_analysis_failure_drops_image_echo() {
        let provider = Arc::new(FakeProvider::failing(|| MediVoiceError::RemoteService {
            service: "groq",
            detail: "503".into(),
        }));
        let orch = orchestrator(provider.clone());

        let dir = tempfile::tempdir().unwrap();
        let asset = jpeg_fixture(dir.path());

        let result = orch.process_inputs(None, Some(asset)).await;
        assert_eq!(result.advisory, messages::MSG_API_UNAVAILABLE);
        assert!(result.image_display.is_none());
        assert_eq!(provider.calls(), vec![Call::Vision, Call::Text]);
    }

    #[tokio::test]
    async fn test_missing_credential_maps_to_config_apology() {
        let provider = Arc::new(FakeProvider::failing(|| {
            MediVoiceError::MissingCredential("GROQ_API_KEY")
        }));
        let orch = orchestrator(provider.clone());

        let clip = AudioClip::new("/nonexistent/recording.wav");
        let result = orch.process_inputs(Some(clip), None).await;
        assert_eq!(result.advisory, messages::MSG_API_NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn test_remote_failure_maps_to_availability_apology() {
        let provider = Arc::new(FakeProvider::failing(|| MediVoiceError::RemoteService {
            service: "groq",
            detail: "429 rate limited".into(),
        }));
        let orch = orchestrator(provider);

        let clip = AudioClip::new("/nonexistent/recording.wav");
        let result = orch.process_inputs(Some(clip), None).await;
        assert_eq!(result.advisory, messages::MSG_API_UNAVAILABLE);
        // Advisory is never empty, whatever failed.
        assert!(!result.advisory.is_empty());
    }

    #[tokio::test]
    async fn test_short_advisory_skips_synthesis() {
        let provider = Arc::new(FakeProvider::answering("unused", "unused"));
        let orch = orchestrator(provider);

        assert_eq!(orch.generate_voice("").await, None);
        assert_eq!(orch.generate_voice("Too short").await, None);
        assert_eq!(orch.generate_voice("          ").await, None);
    }
}
