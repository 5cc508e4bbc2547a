//! Configuration settings for Svar.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub captions: CaptionSettings,
    pub transcription: TranscriptionSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub answer: AnswerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for cached transcripts and the persisted index.
    pub cache_dir: String,
    /// Directory for temporary extracted audio.
    pub temp_audio_dir: String,
    /// Age after which the external sweep removes cache files.
    pub cache_expiry_seconds: u64,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            cache_dir: "~/.svar/cache".to_string(),
            temp_audio_dir: "/tmp/svar/audio".to_string(),
            cache_expiry_seconds: 24 * 3600,
            log_level: "info".to_string(),
        }
    }
}

/// Caption language preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    pub preferred_language: String,
    pub secondary_language: String,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            preferred_language: "en".to_string(),
            secondary_language: "hi".to_string(),
        }
    }
}

impl CaptionSettings {
    /// Languages to try, in order, without duplicates.
    pub fn languages(&self) -> Vec<String> {
        let mut langs = vec![self.preferred_language.clone()];
        if !self.secondary_language.is_empty() && self.secondary_language != self.preferred_language {
            langs.push(self.secondary_language.clone());
        }
        langs
    }
}

/// Whisper model sizes, smallest first.
pub const MODEL_SIZES: &[&str] = &["tiny", "base", "small", "medium", "large"];

/// Speech-to-text and audio extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Speech-to-text executable.
    pub command: String,
    /// Primary model size.
    pub model: String,
    /// Smaller model sizes tried after the primary one fails, largest first.
    pub fallback_models: Vec<String>,
    /// Audio extraction executable.
    pub extractor: String,
    /// Uploaded audio longer than this gets a "may take a while" warning.
    pub long_upload_warning_seconds: u32,
    /// Extracted video audio longer than this gets a "may take a while" warning.
    pub long_video_warning_seconds: u32,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            command: "whisper".to_string(),
            model: "small".to_string(),
            fallback_models: vec!["base".to_string(), "tiny".to_string()],
            extractor: "yt-dlp".to_string(),
            long_upload_warning_seconds: 600,
            long_video_warning_seconds: 900,
        }
    }
}

impl TranscriptionSettings {
    /// Model sizes for video audio: primary plus two smaller tiers.
    pub fn video_tiers(&self) -> Vec<String> {
        self.tiers(2)
    }

    /// Model sizes for uploaded audio: primary plus one smaller tier.
    pub fn upload_tiers(&self) -> Vec<String> {
        self.tiers(1)
    }

    /// Configured fallbacks first, then the nearest unused sizes from
    /// [`MODEL_SIZES`] (smaller before larger) until the count is reached.
    fn tiers(&self, fallbacks: usize) -> Vec<String> {
        let mut tiers = vec![self.model.clone()];
        let primary = MODEL_SIZES
            .iter()
            .position(|size| *size == self.model)
            .unwrap_or(MODEL_SIZES.len());
        let mut ladder: Vec<(usize, &str)> = MODEL_SIZES.iter().copied().enumerate().collect();
        ladder.sort_by_key(|(i, _)| (i.abs_diff(primary), *i > primary));

        let candidates = self
            .fallback_models
            .iter()
            .map(String::as_str)
            .chain(ladder.into_iter().map(|(_, size)| size))
            .filter(|m| !m.is_empty());
        for model in candidates {
            if tiers.len() > fallbacks {
                break;
            }
            if !tiers.iter().any(|t| t == model) {
                tiers.push(model.to_string());
            }
        }
        tiers
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hugging Face feature-extraction endpoint (sentence-transformers models).
    #[default]
    HuggingFace,
    /// OpenAI embeddings API.
    OpenAI,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(EmbeddingProvider::HuggingFace),
            "openai" => Ok(EmbeddingProvider::OpenAI),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::HuggingFace => write!(f, "huggingface"),
            EmbeddingProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    /// Embedding model to use.
    pub model: String,
    /// Base URL of the Hugging Face inference API.
    pub endpoint: String,
    /// Embedding dimensions (OpenAI only; Hugging Face models have a fixed size).
    pub dimensions: u32,
    /// Texts per request.
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::HuggingFace,
            model: "sentence-transformers/all-mpnet-base-v2".to_string(),
            endpoint: "https://api-inference.huggingface.co".to_string(),
            dimensions: 768,
            batch_size: 32,
        }
    }
}

/// Chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum words per chunk.
    pub max_words: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { max_words: 2000 }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    /// Generative model identifier.
    pub model: String,
    /// Base URL of the inference API.
    pub endpoint: String,
    /// Number of chunks retrieved as context.
    pub top_k: usize,
    pub max_new_tokens: u32,
    pub temperature: f32,
    /// Bounded wait for the service call.
    pub timeout_seconds: u64,
    /// Bearer token. Usually provided through `HF_TOKEN` instead.
    pub api_token: Option<String>,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            model: "HuggingFaceH4/zephyr-7b-beta".to_string(),
            endpoint: "https://api-inference.huggingface.co".to_string(),
            top_k: 5,
            max_new_tokens: 256,
            temperature: 0.2,
            timeout_seconds: 60,
            api_token: None,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied on top of the file contents.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply environment-style overrides from a lookup function.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("CACHE_DIR") {
            self.general.cache_dir = v;
        }
        if let Some(v) = get("TEMP_AUDIO_DIR") {
            self.general.temp_audio_dir = v;
        }
        if let Some(v) = get("CACHE_EXPIRY_SECONDS") {
            match v.trim().parse() {
                Ok(secs) => self.general.cache_expiry_seconds = secs,
                Err(_) => warn!("Ignoring non-numeric CACHE_EXPIRY_SECONDS={}", v),
            }
        }
        if let Some(v) = get("EMBEDDING_MODEL_NAME") {
            self.embedding.model = v;
        }
        if let Some(v) = get("WHISPER_MODEL_SIZE") {
            self.transcription.model = v;
        }
        if let Some(v) = get("QA_MODEL_NAME") {
            self.answer.model = v;
        }
        if let Some(v) = get("HF_TOKEN") {
            self.answer.api_token = Some(v);
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut copy = self.clone();
        // Never write the credential to disk.
        copy.answer.api_token = None;
        let content = toml::to_string_pretty(&copy)
            .map_err(|e| crate::error::SvarError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("svar")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded cache directory path.
    pub fn cache_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.cache_dir)
    }

    /// Get the expanded temp audio directory path.
    pub fn temp_audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_audio_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CACHE_DIR", "/data/cache"),
            ("WHISPER_MODEL_SIZE", "medium"),
            ("QA_MODEL_NAME", "mistralai/Mistral-7B-Instruct-v0.2"),
            ("CACHE_EXPIRY_SECONDS", "3600"),
            ("HF_TOKEN", "hf_secret"),
            ("EMBEDDING_MODEL_NAME", ""),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.cache_dir(), PathBuf::from("/data/cache"));
        assert_eq!(settings.transcription.model, "medium");
        assert_eq!(settings.answer.model, "mistralai/Mistral-7B-Instruct-v0.2");
        assert_eq!(settings.general.cache_expiry_seconds, 3600);
        assert_eq!(settings.answer.api_token.as_deref(), Some("hf_secret"));
        // Empty values leave the default alone.
        assert_eq!(settings.embedding.model, "sentence-transformers/all-mpnet-base-v2");
    }

    #[test]
    fn test_invalid_expiry_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_overrides(|k| (k == "CACHE_EXPIRY_SECONDS").then(|| "soon".to_string()));
        assert_eq!(settings.general.cache_expiry_seconds, 86400);
    }

    #[test]
    fn test_model_tiers() {
        let settings = TranscriptionSettings::default();
        assert_eq!(settings.video_tiers(), vec!["small", "base", "tiny"]);
        assert_eq!(settings.upload_tiers(), vec!["small", "base"]);

        let settings = TranscriptionSettings {
            model: "base".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.video_tiers(), vec!["base", "tiny", "small"]);
        assert_eq!(settings.upload_tiers(), vec!["base", "tiny"]);

        let settings = TranscriptionSettings {
            model: "tiny".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.video_tiers(), vec!["tiny", "base", "small"]);

        let settings = TranscriptionSettings {
            model: "large-v3".to_string(),
            fallback_models: Vec::new(),
            ..Default::default()
        };
        assert_eq!(settings.video_tiers(), vec!["large-v3", "large", "medium"]);
    }

    #[test]
    fn test_caption_languages_dedup() {
        let captions = CaptionSettings {
            preferred_language: "hi".to_string(),
            secondary_language: "hi".to_string(),
        };
        assert_eq!(captions.languages(), vec!["hi"]);
        assert_eq!(CaptionSettings::default().languages(), vec!["en", "hi"]);
    }

    #[test]
    fn test_parse_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [answer]
            top_k = 3

            [embedding]
            provider = "openai"
            model = "text-embedding-3-small"
            "#,
        )
        .unwrap();

        assert_eq!(settings.answer.top_k, 3);
        assert_eq!(settings.answer.timeout_seconds, 60);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::OpenAI);
        assert_eq!(settings.chunking.max_words, 2000);
    }
}
