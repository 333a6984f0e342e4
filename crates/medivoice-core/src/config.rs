//! Configuration loading and credential resolution.
//!
//! Config files are json5 with `${ENV_VAR}` substitution. Credentials are
//! resolved once at startup and injected into each adapter's constructor;
//! an absent key is a recoverable runtime condition handled by the
//! fallback paths, never a startup failure.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level MediVoice configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<TranscriptionConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision: Option<VisionConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<SpeechConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Hosted (default) or Local. Local additionally autoplays synthesized
    /// audio through the platform's player; Hosted relies on the UI's own
    /// audio widget.
    #[serde(default)]
    pub deployment: DeploymentMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    #[default]
    Hosted,
    Local,
}

/// Speech-to-text configuration (Groq Whisper).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Model name (default: "whisper-large-v3").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// ISO 639-1 target language (default: "en").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TranscriptionConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env, "GROQ_API_KEY")
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("whisper-large-v3")
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or("en")
    }
}

/// Vision-language and text-only completion configuration (Groq).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Vision-capable model used when an image is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision_model: Option<String>,

    /// Smaller text-only model used as the no-image cost-saving fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// JPEG re-encode quality for the image normalizer (default: 85).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<u8>,
}

impl VisionConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env, "GROQ_API_KEY")
    }

    pub fn vision_model(&self) -> &str {
        self.vision_model
            .as_deref()
            .unwrap_or("meta-llama/llama-4-scout-17b-16e-instruct")
    }

    pub fn text_model(&self) -> &str {
        self.text_model.as_deref().unwrap_or("llama3-8b-8192")
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality.unwrap_or(85)
    }
}

/// Speech synthesis configuration (ElevenLabs with gTTS-style fallback).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,

    /// ElevenLabs output format (default: "mp3_22050_32").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,

    /// Fallback synthesis language code (default: "en").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Advisory texts at or below this trimmed length are not synthesized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_speech_length: Option<usize>,
}

impl SpeechConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env, "ELEVENLABS_API_KEY")
    }

    pub fn voice_id(&self) -> &str {
        self.voice_id.as_deref().unwrap_or("O7p2vmz2iEYgMXxkbsif")
    }

    pub fn model_id(&self) -> &str {
        self.model_id.as_deref().unwrap_or("eleven_turbo_v2")
    }

    pub fn output_format(&self) -> &str {
        self.output_format.as_deref().unwrap_or("mp3_22050_32")
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or("en")
    }

    pub fn min_speech_length(&self) -> usize {
        self.min_speech_length.unwrap_or(10)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Override for the transient data directory (uploads and generated
    /// audio). Defaults to `~/.medivoice`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Resolve a secret from the direct field, then the named env var, then a
/// provider-default env var — but only when neither field names a source.
pub fn resolve_secret_field(
    direct: &Option<String>,
    env_var: &Option<String>,
    default_env: &str,
) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    if let Some(env) = env_var {
        return std::env::var(env).ok().filter(|v| !v.is_empty());
    }
    std::env::var(default_env).ok().filter(|v| !v.is_empty())
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment values.
fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .to_string()
}

impl Config {
    /// Load config from a json5 file. A missing file yields the defaults.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(crate::error::MediVoiceError::Io)?;
        let substituted = substitute_env_vars(&raw);

        let config: Config = json5::from_str(&substituted)
            .map_err(|e| crate::error::MediVoiceError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    pub fn server_port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(7860)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.server
            .as_ref()
            .and_then(|s| s.data_dir.clone())
            .unwrap_or_else(data_dir)
    }

    pub fn server_bind(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| "0.0.0.0".to_string())
    }

    pub fn transcription(&self) -> TranscriptionConfig {
        self.transcription.clone().unwrap_or_default()
    }

    pub fn vision(&self) -> VisionConfig {
        self.vision.clone().unwrap_or_default()
    }

    pub fn speech(&self) -> SpeechConfig {
        self.speech.clone().unwrap_or_default()
    }
}

/// Per-process data directory for transient audio/upload files.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".medivoice")
}
