//! TOML configuration file loading
//!
//! Supports `~/.config/nura/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NuraConfigFile {
    /// Directory holding the fact database
    pub data_dir: Option<String>,

    /// Database file name (relative to `data_dir`) or absolute path
    pub database: Option<String>,

    /// Activation configuration
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Canned answers
    #[serde(default)]
    pub knowledge: KnowledgeFileConfig,
}

/// Wake/exit phrases and pacing
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionFileConfig {
    /// Phrases that activate the assistant (e.g. "hey nura")
    pub wake_phrases: Option<Vec<String>>,

    /// Phrases that end a conversation (e.g. "goodbye")
    pub exit_phrases: Option<Vec<String>>,

    /// Pause after a missed wake phrase, in milliseconds
    pub retry_pause_ms: Option<u64>,

    /// Pause after an empty command, in milliseconds
    pub missed_pause_ms: Option<u64>,

    /// Pause after speaking a response, in milliseconds
    pub response_pause_ms: Option<u64>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceFileConfig {
    /// STT provider ("whisper" or "deepgram")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Spoken language (e.g. "en-US")
    pub language: Option<String>,

    /// TTS provider ("openai" or "elevenlabs")
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,

    /// Playback volume, 0.0 to 1.0
    pub volume: Option<f32>,

    /// Seconds to wait for speech to begin
    pub listen_timeout_secs: Option<f32>,

    /// Maximum seconds of speech captured per utterance
    pub phrase_time_limit_secs: Option<f32>,

    /// Milliseconds of ambient noise sampled before listening
    pub calibration_ms: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Canned knowledge overrides
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnowledgeFileConfig {
    /// Weather sentence spoken for weather queries
    pub weather: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `NuraConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> NuraConfigFile {
    config_file_path().map_or_else(NuraConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from `path`, falling back to defaults
pub fn load_from(path: &Path) -> NuraConfigFile {
    if !path.exists() {
        return NuraConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                NuraConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            NuraConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/nura/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("nura").join("config.toml"))
}
